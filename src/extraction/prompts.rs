//! Prompt templates for the AI skill extractor

/// System prompt that pins the reply to a single JSON object.
const JSON_ONLY_SYSTEM: &str = "You are a precise technical recruiter. \
    You MUST respond with one valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

const RESUME_TEMPLATE: &str = r#"TASK: List the technical and professional skills this candidate demonstrates.

<RESUME>
{resume}
</RESUME>

Group skills by proficiency and answer with this JSON shape:
{"expert": [], "proficient": [], "familiar": [], "experience_years": null, "seniority": null}

- Use short canonical skill names ("javascript", "kubernetes", "postgresql").
- "experience_years" is the total years of professional experience, or null.
- "seniority" is one of intern, junior, mid, senior, lead, staff, principal, or null.
- Only list skills the resume actually shows."#;

const JOB_TEMPLATE: &str = r#"TASK: List the skills this job posting asks for{title_clause}.

<JOB POSTING>
{job}
</JOB POSTING>

Split skills by priority and answer with this JSON shape:
{"must_have": [], "nice_to_have": [], "experience_years": null, "seniority": null}

- "must_have" holds skills stated as required, essential or mandatory.
- "nice_to_have" holds skills stated as preferred, a bonus or a plus.
- A skill appears in at most one list.
- Use short canonical skill names ("javascript", "kubernetes", "postgresql")."#;

/// Prompt templates with `{placeholder}` substitution.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub system: String,
    pub resume: String,
    pub job: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: JSON_ONLY_SYSTEM.to_string(),
            resume: RESUME_TEMPLATE.to_string(),
            job: JOB_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplates {
    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn render_resume(&self, resume_text: &str) -> String {
        self.resume.replace("{resume}", resume_text.trim())
    }

    pub fn render_job(&self, job_text: &str, job_title: Option<&str>) -> String {
        let title_clause = job_title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| format!(" (role: {})", t))
            .unwrap_or_default();

        self.job
            .replace("{title_clause}", &title_clause)
            .replace("{job}", job_text.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_resume() {
        let prompt = PromptTemplates::default().render_resume("  Rust developer  ");
        assert!(prompt.contains("<RESUME>\nRust developer\n</RESUME>"));
        assert!(!prompt.contains("{resume}"));
    }

    #[test]
    fn test_render_job_with_and_without_title() {
        let templates = PromptTemplates::default();
        let with_title = templates.render_job("We need Go", Some("Backend Engineer"));
        assert!(with_title.contains("(role: Backend Engineer)"));

        let without = templates.render_job("We need Go", None);
        assert!(without.contains("asks for."));
        assert!(!without.contains("{title_clause}"));
    }
}
