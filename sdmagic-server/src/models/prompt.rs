//! Prompt text validation

use super::ValidationError;

/// Validated prompt original text
///
/// No length cap: prompt bodies are free-form text. Uniqueness is a
/// store-level check, not a model rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptText(String);

impl PromptText {
    /// Create prompt text; must be non-empty after trimming.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "original text",
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Get the text as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for PromptText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_long_free_form_text() {
        let text = "masterpiece, best quality, ".repeat(40);
        assert!(PromptText::new(&text).is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert!(matches!(
            PromptText::new("").unwrap_err(),
            ValidationError::Empty { .. }
        ));
        assert!(matches!(
            PromptText::new(" \t ").unwrap_err(),
            ValidationError::Empty { .. }
        ));
    }

    #[test]
    fn trims_whitespace() {
        let text = PromptText::new("  starry night  ").unwrap();
        assert_eq!(text.as_str(), "starry night");
    }
}
