//! Heading and sentence detection used for skill categorization and ranking

use unicode_segmentation::UnicodeSegmentation;

/// Headings longer than this are treated as body text.
const MAX_HEADING_LEN: usize = 60;
const MAX_HEADING_WORDS: usize = 6;

/// A heading-like line and the byte range of the text it governs.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub title: String,
    pub start: usize,
    pub end: usize,
}

impl Section {
    pub fn contains(&self, position: usize) -> bool {
        position >= self.start && position < self.end
    }

    /// Lowercased heading mentions any of the given cues.
    pub fn title_has_any(&self, cues: &[&str]) -> bool {
        let title = self.title.to_lowercase();
        cues.iter().any(|cue| title.contains(cue))
    }
}

/// Split text into heading-delimited sections.
///
/// A line counts as a heading when it is short and either ends with a colon
/// or reads like a title (a few words, no sentence punctuation). Text before
/// the first heading belongs to no section.
pub fn detect_sections(text: &str) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if is_heading(trimmed) {
            if let Some(previous) = sections.last_mut() {
                previous.end = offset;
            }
            sections.push(Section {
                title: trimmed.trim_end_matches(':').trim().to_string(),
                start: offset,
                end: text.len(),
            });
        }
        offset += line.len();
    }

    sections
}

fn is_heading(line: &str) -> bool {
    if line.is_empty() || line.len() > MAX_HEADING_LEN {
        return false;
    }

    let line = line.trim_start_matches(|c: char| c == '#' || c.is_whitespace());
    if line.is_empty() || line.starts_with(['-', '*', '•']) {
        return false;
    }

    if line.ends_with(':') {
        return true;
    }

    line.split_whitespace().count() <= MAX_HEADING_WORDS
        && !line.contains(['.', ',', ';', '!', '?'])
        && line.chars().next().map_or(false, |c| c.is_uppercase())
}

/// Section governing a byte position, if any.
pub fn section_at(sections: &[Section], position: usize) -> Option<&Section> {
    sections.iter().find(|s| s.contains(position))
}

/// Byte range of the sentence containing `position`.
pub fn sentence_bounds(text: &str, position: usize) -> (usize, usize) {
    for (start, sentence) in text.split_sentence_bound_indices() {
        let end = start + sentence.len();
        if position >= start && position < end {
            return (start, end);
        }
    }
    (0, text.len())
}

/// Position of the last occurrence of any cue in `haystack` (already lowercased).
pub fn last_cue_position(haystack: &str, cues: &[&str]) -> Option<usize> {
    cues.iter().filter_map(|cue| haystack.rfind(cue)).max()
}

/// Position of the first occurrence of any cue in `haystack` (already lowercased).
pub fn first_cue_position(haystack: &str, cues: &[&str]) -> Option<usize> {
    cues.iter().filter_map(|cue| haystack.find(cue)).min()
}

#[cfg(test)]
mod tests {
    use super::*;

    const POSTING: &str = "Backend Engineer\nWe build payments.\n\nRequirements:\n- Rust\n- PostgreSQL\n\nNice to have:\n- Kafka\n";

    #[test]
    fn test_detect_sections() {
        let sections = detect_sections(POSTING);
        let titles: Vec<&str> = sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Backend Engineer", "Requirements", "Nice to have"]);
    }

    #[test]
    fn test_section_at_position() {
        let sections = detect_sections(POSTING);
        let rust = POSTING.find("Rust").unwrap();
        let kafka = POSTING.find("Kafka").unwrap();
        assert_eq!(section_at(&sections, rust).unwrap().title, "Requirements");
        assert_eq!(section_at(&sections, kafka).unwrap().title, "Nice to have");
    }

    #[test]
    fn test_bullets_are_not_headings() {
        assert!(!is_heading("- Rust"));
        assert!(!is_heading("We build payments."));
        assert!(is_heading("## Technical Skills"));
        assert!(is_heading("Skills:"));
    }

    #[test]
    fn test_sentence_bounds() {
        let text = "Required: Java, SQL. Preferred: Kubernetes.";
        let pos = text.find("Kubernetes").unwrap();
        let (start, end) = sentence_bounds(text, pos);
        assert!(text[start..end].starts_with("Preferred"));
    }

    #[test]
    fn test_cue_positions() {
        let text = "required: java. bonus: go";
        assert_eq!(first_cue_position(text, &["bonus", "required"]), Some(0));
        assert_eq!(last_cue_position(text, &["bonus", "required"]), Some(16));
        assert_eq!(last_cue_position(text, &["preferred"]), None);
    }
}
