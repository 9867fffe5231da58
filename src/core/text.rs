//! Text source seam — where titles, names and descriptions come from.
//!
//! The generators treat every string as opaque. A host can plug in any
//! producer (hand-written tables, an LLM client, a grammar engine) by
//! implementing [`TextSource`].

/// What a requested piece of text will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextPurpose {
    Title,
    Name,
    Description,
    Dialogue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRequest {
    pub purpose: TextPurpose,
    /// Short machine-readable hint, e.g. `"protagonist"` or `"main_quest"`.
    pub subject: String,
}

impl TextRequest {
    pub fn new(purpose: TextPurpose, subject: impl Into<String>) -> Self {
        Self {
            purpose,
            subject: subject.into(),
        }
    }
}

pub trait TextSource {
    fn text(&mut self, request: &TextRequest) -> String;
}

/// Deterministic fallback text for well-known subjects.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderText;

impl TextSource for PlaceholderText {
    fn text(&mut self, request: &TextRequest) -> String {
        use TextPurpose::*;
        let known = match (request.subject.as_str(), request.purpose) {
            ("protagonist", Name) => Some("Protagonist"),
            ("protagonist", Description) => Some("The main character"),
            ("antagonist", Name) => Some("Antagonist"),
            ("antagonist", Description) => Some("The main villain"),
            ("main_hub", Name) => Some("Main Hub"),
            ("main_hub", Description) => Some("Central area of the level"),
            ("main_quest", Title) => Some("Main Quest"),
            ("main_quest", Description) => Some("The primary objective"),
            ("find_antagonist", Description) => Some("Find the antagonist"),
            ("visit_shop", Description) => Some("Stock up at the trader"),
            ("lair", Name) => Some("Antagonist's Lair"),
            ("shop", Name) => Some("Trader"),
            _ => None,
        };
        match known {
            Some(text) => text.to_string(),
            None => {
                let mut chars = request.subject.replace('_', " ").chars().collect::<Vec<_>>();
                if let Some(first) = chars.first_mut() {
                    *first = first.to_ascii_uppercase();
                }
                chars.into_iter().collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_subjects_have_fixed_text() {
        let mut source = PlaceholderText;
        let name = source.text(&TextRequest::new(TextPurpose::Name, "antagonist"));
        assert_eq!(name, "Antagonist");
    }

    #[test]
    fn unknown_subjects_are_humanized() {
        let mut source = PlaceholderText;
        let text = source.text(&TextRequest::new(TextPurpose::Title, "rising_action"));
        assert_eq!(text, "Rising action");
        assert_eq!(source.text(&TextRequest::new(TextPurpose::Name, "")), "");
    }
}
