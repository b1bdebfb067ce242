//! Template name validation

use super::ValidationError;

/// Maximum length for template names
const MAX_TEMPLATE_NAME_LEN: usize = 100;

/// Validated template name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateName(String);

impl TemplateName {
    /// Create a new template name.
    ///
    /// # Rules
    /// - Non-empty (after trimming whitespace)
    /// - Max 100 characters
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::Empty {
                field: "template name",
            });
        }

        if trimmed.len() > MAX_TEMPLATE_NAME_LEN {
            return Err(ValidationError::TooLong {
                field: "template name",
                max: MAX_TEMPLATE_NAME_LEN,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for TemplateName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
