//! Input guard run on every review before it reaches the models.
//!
//! Linear models over bag-of-words and char n-gram features still return a
//! number for empty or unknown text, so such reviews are refused up front.

use crate::models::ModelBundle;
use crate::types::Rejection;

/// Result of validating a raw review
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Trimmed review text, safe to predict on
    Accepted(String),
    Rejected(Rejection),
}

/// Length and vocabulary checks for raw reviews
#[derive(Debug, Clone)]
pub struct InputGuard {
    min_tokens: usize,
}

impl InputGuard {
    /// Create a guard requiring at least `min_tokens` whitespace-delimited tokens
    pub fn new(min_tokens: usize) -> Self {
        Self { min_tokens }
    }

    /// Validate a raw review. The length check runs first.
    pub fn validate(&self, raw_text: &str, bundle: &ModelBundle) -> GuardOutcome {
        let cleaned = raw_text.trim_matches(is_separator);
        let tokens = cleaned.split(is_separator).filter(|t| !t.is_empty()).count();

        if tokens < self.min_tokens {
            return GuardOutcome::Rejected(Rejection::TooShort);
        }

        if bundle.vocabulary_coverage(cleaned) == 0 {
            return GuardOutcome::Rejected(Rejection::NoKnownVocabulary);
        }

        GuardOutcome::Accepted(cleaned.to_string())
    }
}

/// Unicode whitespace plus the ASCII information separators `\x1c`..=`\x1f`
fn is_separator(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

impl Default for InputGuard {
    fn default() -> Self {
        Self::new(3)
    }
}
