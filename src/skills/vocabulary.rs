//! Skills vocabulary: taxonomy, alias table and pattern cues
//!
//! A `SkillVocabulary` is built once (either the built-in tables or a TOML
//! file) and then shared read-only by the normalizer, matcher and extractor.

use crate::error::{MatcherError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

/// Immutable skills dictionary.
///
/// Every entry is stored in canonical form (trimmed, lowercase) and alias
/// chains are collapsed at construction, so `resolve_alias` is a single lookup
/// and its result is never itself an alias.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillVocabulary {
    /// Category name -> skills in that category
    #[serde(default)]
    categories: BTreeMap<String, Vec<String>>,

    /// Alternate spelling -> canonical skill
    #[serde(default)]
    aliases: BTreeMap<String, String>,

    /// Acronyms only expanded during extraction ("ml" -> "machine learning")
    #[serde(default)]
    acronyms: BTreeMap<String, String>,

    /// File extension (without the dot) -> skill
    #[serde(default)]
    extensions: BTreeMap<String, String>,
}

impl SkillVocabulary {
    /// Build a vocabulary from raw tables, canonicalizing every entry.
    pub fn new(
        categories: BTreeMap<String, Vec<String>>,
        aliases: BTreeMap<String, String>,
        acronyms: BTreeMap<String, String>,
        extensions: BTreeMap<String, String>,
    ) -> Result<Self> {
        let categories = categories
            .into_iter()
            .map(|(name, skills)| {
                let mut skills: Vec<String> = skills
                    .iter()
                    .map(|s| canonical(s))
                    .filter(|s| !s.is_empty())
                    .collect();
                skills.sort();
                skills.dedup();
                (canonical(&name), skills)
            })
            .collect();

        let aliases = collapse_aliases(
            aliases
                .into_iter()
                .map(|(from, to)| (canonical(&from), canonical(&to)))
                .filter(|(from, to)| !from.is_empty() && !to.is_empty() && from != to)
                .collect(),
        )?;

        let acronyms = acronyms
            .into_iter()
            .map(|(from, to)| (canonical(&from), canonical(&to)))
            .filter(|(from, to)| !from.is_empty() && !to.is_empty())
            .collect();

        let extensions = extensions
            .into_iter()
            .map(|(ext, to)| (canonical(ext.trim_start_matches('.')), canonical(&to)))
            .filter(|(ext, to)| !ext.is_empty() && !to.is_empty())
            .collect();

        Ok(Self {
            categories,
            aliases,
            acronyms,
            extensions,
        })
    }

    /// Parse a vocabulary from TOML text.
    ///
    /// ```toml
    /// [categories]
    /// languages = ["rust", "python"]
    ///
    /// [aliases]
    /// py = "python"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: SkillVocabulary = toml::from_str(content)
            .map_err(|e| MatcherError::Configuration(format!("Failed to parse vocabulary: {}", e)))?;
        Self::new(raw.categories, raw.aliases, raw.acronyms, raw.extensions)
    }

    /// Load a vocabulary file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        log::info!("Loaded skills vocabulary from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Canonical skill an alias points at, if the token is a known alias.
    pub fn resolve_alias(&self, token: &str) -> Option<&str> {
        self.aliases.get(token).map(|s| s.as_str())
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn acronyms(&self) -> impl Iterator<Item = (&str, &str)> {
        self.acronyms.iter().map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn extension_skill(&self, extension: &str) -> Option<&str> {
        self.extensions
            .get(&extension.to_lowercase())
            .map(|s| s.as_str())
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.keys().map(|s| s.as_str())
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.keys().map(|s| s.as_str()).collect()
    }

    /// Sorted, de-duplicated skills of the selected categories (all when `None`).
    pub fn skills(&self, categories: Option<&[String]>) -> Vec<&str> {
        let wanted: Option<HashSet<String>> =
            categories.map(|c| c.iter().map(|name| canonical(name)).collect());

        let skills: BTreeSet<&str> = self
            .categories
            .iter()
            .filter(|(name, _)| wanted.as_ref().map_or(true, |w| w.contains(*name)))
            .flat_map(|(_, skills)| skills.iter().map(|s| s.as_str()))
            .collect();

        skills.into_iter().collect()
    }

    /// First category (alphabetically) listing the skill.
    pub fn category_of(&self, skill: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|(_, skills)| skills.iter().any(|s| s == skill))
            .map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.category_of(skill).is_some()
    }

    pub fn skill_count(&self) -> usize {
        self.skills(None).len()
    }

    /// Built-in technical and soft skill tables
    pub fn builtin() -> Self {
        let categories = table(&[
            (
                "languages",
                &[
                    "rust", "python", "javascript", "typescript", "java", "c++", "c#", "go",
                    "ruby", "php", "swift", "kotlin", "scala", "haskell", "clojure", "elixir",
                    "r", "matlab", "perl", "dart", "sql", "bash", "powershell",
                ],
            ),
            (
                "frontend",
                &[
                    "react", "react native", "vue", "angular", "svelte", "html", "css", "sass",
                    "tailwind", "bootstrap", "jquery", "webpack", "vite", "babel", "next.js",
                    "nuxt", "gatsby", "redux", "flutter",
                ],
            ),
            (
                "backend",
                &[
                    "node.js", "express", "django", "flask", "fastapi", "spring boot", "rails",
                    "laravel", ".net", "graphql", "rest", "grpc", "microservices", "kafka",
                    "rabbitmq", "websockets",
                ],
            ),
            (
                "databases",
                &[
                    "postgresql", "mysql", "mongodb", "redis", "elasticsearch", "cassandra",
                    "dynamodb", "sqlite", "oracle", "sql server", "neo4j",
                ],
            ),
            (
                "cloud_devops",
                &[
                    "docker", "kubernetes", "aws", "azure", "gcp", "terraform", "ansible",
                    "jenkins", "github actions", "gitlab ci", "ci/cd", "linux", "nginx",
                    "prometheus", "grafana", "git",
                ],
            ),
            (
                "data_ml",
                &[
                    "machine learning", "deep learning", "artificial intelligence",
                    "natural language processing", "large language models", "computer vision",
                    "tensorflow", "pytorch", "scikit-learn", "pandas", "numpy", "spark",
                    "hadoop", "airflow", "tableau", "power bi", "data analysis",
                ],
            ),
            (
                "testing",
                &[
                    "jest", "pytest", "junit", "selenium", "cypress", "playwright", "tdd",
                    "unit testing",
                ],
            ),
            (
                "practices",
                &["agile", "scrum", "kanban", "jira", "system design", "distributed systems"],
            ),
            (
                "soft_skills",
                &[
                    "leadership", "communication", "teamwork", "problem solving",
                    "critical thinking", "mentoring", "project management", "collaboration",
                    "time management",
                ],
            ),
        ]);

        let aliases = pairs(&[
            ("js", "javascript"),
            ("ecmascript", "javascript"),
            ("ts", "typescript"),
            ("reactjs", "react"),
            ("react.js", "react"),
            ("react-native", "react native"),
            ("vuejs", "vue"),
            ("vue.js", "vue"),
            ("angularjs", "angular"),
            ("nextjs", "next.js"),
            ("node", "node.js"),
            ("nodejs", "node.js"),
            ("expressjs", "express"),
            ("express.js", "express"),
            ("golang", "go"),
            ("k8s", "kubernetes"),
            ("postgres", "postgresql"),
            ("psql", "postgresql"),
            ("mongo", "mongodb"),
            ("amazon web services", "aws"),
            ("google cloud", "gcp"),
            ("google cloud platform", "gcp"),
            ("microsoft azure", "azure"),
            ("sklearn", "scikit-learn"),
            ("cicd", "ci/cd"),
            ("ci cd", "ci/cd"),
            ("dotnet", ".net"),
            ("springboot", "spring boot"),
            ("ruby on rails", "rails"),
            ("restful", "rest"),
            ("rest api", "rest"),
            ("html5", "html"),
            ("css3", "css"),
            ("py", "python"),
            ("mssql", "sql server"),
        ]);

        let acronyms = pairs(&[
            ("k8s", "kubernetes"),
            ("ml", "machine learning"),
            ("dl", "deep learning"),
            ("ai", "artificial intelligence"),
            ("nlp", "natural language processing"),
            ("llm", "large language models"),
            ("llms", "large language models"),
        ]);

        let extensions = pairs(&[
            ("py", "python"),
            ("js", "javascript"),
            ("jsx", "react"),
            ("ts", "typescript"),
            ("tsx", "react"),
            ("rs", "rust"),
            ("go", "go"),
            ("java", "java"),
            ("rb", "ruby"),
            ("php", "php"),
            ("cpp", "c++"),
            ("cs", "c#"),
            ("kt", "kotlin"),
            ("swift", "swift"),
            ("scala", "scala"),
            ("sql", "sql"),
        ]);

        Self::new(categories, aliases, acronyms, extensions)
            .expect("built-in vocabulary has no alias cycles")
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Trim + lowercase
fn canonical(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Follow alias chains to their end so lookups are single-step.
fn collapse_aliases(aliases: BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
    let mut collapsed = BTreeMap::new();

    for (from, to) in &aliases {
        let mut target = to;
        let mut seen = HashSet::from([from.as_str()]);

        while let Some(next) = aliases.get(target) {
            if !seen.insert(target.as_str()) {
                return Err(MatcherError::Configuration(format!(
                    "Alias cycle detected starting at '{}'",
                    from
                )));
            }
            target = next;
        }

        if target != from {
            collapsed.insert(from.clone(), target.clone());
        }
    }

    Ok(collapsed)
}

fn table(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
    entries
        .iter()
        .map(|(name, skills)| {
            (
                name.to_string(),
                skills.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

fn pairs(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_vocabulary() {
        let vocab = SkillVocabulary::builtin();
        assert!(vocab.skill_count() > 50);
        assert!(vocab.contains("kubernetes"));
        assert_eq!(vocab.resolve_alias("k8s"), Some("kubernetes"));
        assert_eq!(vocab.resolve_alias("reactjs"), Some("react"));
        assert_eq!(vocab.category_of("docker"), Some("cloud_devops"));
    }

    #[test]
    fn test_alias_targets_are_never_aliases() {
        let vocab = SkillVocabulary::builtin();
        for (_, target) in vocab.aliases() {
            assert!(vocab.resolve_alias(target).is_none(), "{} is an alias", target);
        }
    }

    #[test]
    fn test_alias_chains_collapse() {
        let aliases = pairs(&[("a", "b"), ("b", "c")]);
        let vocab = SkillVocabulary::new(BTreeMap::new(), aliases, BTreeMap::new(), BTreeMap::new())
            .unwrap();
        assert_eq!(vocab.resolve_alias("a"), Some("c"));
        assert_eq!(vocab.resolve_alias("b"), Some("c"));
    }

    #[test]
    fn test_alias_cycle_rejected() {
        let aliases = pairs(&[("a", "b"), ("b", "a")]);
        let result =
            SkillVocabulary::new(BTreeMap::new(), aliases, BTreeMap::new(), BTreeMap::new());
        assert!(matches!(result, Err(MatcherError::Configuration(_))));
    }

    #[test]
    fn test_category_filter() {
        let vocab = SkillVocabulary::builtin();
        let databases = vocab.skills(Some(&["Databases".to_string()]));
        assert!(databases.contains(&"postgresql"));
        assert!(!databases.contains(&"react"));
    }

    #[test]
    fn test_from_toml_fixture() {
        let vocab = SkillVocabulary::from_toml_str(
            r#"
            [categories]
            languages = ["Rust", " Python "]

            [aliases]
            py = "python"

            [extensions]
            ".rs" = "rust"
            "#,
        )
        .unwrap();

        assert_eq!(vocab.skills(None), vec!["python", "rust"]);
        assert_eq!(vocab.resolve_alias("py"), Some("python"));
        assert_eq!(vocab.extension_skill("rs"), Some("rust"));
        assert_eq!(vocab.acronyms().count(), 0);
    }
}
