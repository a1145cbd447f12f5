/// Input sanitizer applied to free-text tool input before dispatch.
pub struct Sanitizer {
    max_input_length: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            max_input_length: 20_000,
        }
    }
}

impl Sanitizer {
    pub fn new(max_input_length: usize) -> Self {
        Self { max_input_length }
    }

    /// Strip control characters and enforce the length limit.
    pub fn sanitize(&self, input: &str) -> SanitizeResult {
        if input.chars().count() > self.max_input_length {
            return SanitizeResult::Rejected(format!(
                "Input exceeds maximum length of {} characters",
                self.max_input_length
            ));
        }

        let cleaned: String = input
            .chars()
            .filter(|c| !c.is_control() || *c == '\n' || *c == '\t' || *c == '\r')
            .collect();

        if cleaned.is_empty() && !input.is_empty() {
            return SanitizeResult::Rejected("Input contains only control characters".to_string());
        }

        if cleaned != input {
            SanitizeResult::Cleaned(cleaned)
        } else {
            SanitizeResult::Clean(cleaned)
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum SanitizeResult {
    /// Input was already clean.
    Clean(String),
    /// Control characters were removed.
    Cleaned(String),
    /// Input was rejected; carries the reason.
    Rejected(String),
}

impl SanitizeResult {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SanitizeResult::Rejected(_))
    }
}
