//! Review submissions, rejections and ratings

use serde::{Deserialize, Serialize};
use std::fmt;

/// A review submitted for one movie
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewInput {
    /// Catalog identifier of the reviewed movie
    pub movie: String,
    /// Raw review text as typed by the user
    pub review: String,
}

impl ReviewInput {
    pub fn new(movie: impl Into<String>, review: impl Into<String>) -> Self {
        Self {
            movie: movie.into(),
            review: review.into(),
        }
    }
}

/// Why the input guard refused a review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// Fewer whitespace-delimited tokens than the guard minimum
    TooShort,
    /// None of the review's terms are in the word model's vocabulary
    NoKnownVocabulary,
}

impl Rejection {
    /// Message shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::TooShort => "Please write a bit more text for an accurate prediction.",
            Rejection::NoKnownVocabulary => {
                "No known words found. Please try a longer or clearer review."
            }
        }
    }

    /// Short machine-readable code, used in logs and metrics
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::TooShort => "too_short",
            Rejection::NoKnownVocabulary => "no_known_vocabulary",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Predicted rating, always within `Rating::MIN..=Rating::MAX`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Convert an ensemble score into a rating, `None` for NaN or infinity.
    ///
    /// The score is clipped to the rating range, rounded half-to-even and
    /// clipped again so the rounding step can never leave the range.
    pub fn from_score(score: f64) -> Option<Self> {
        if !score.is_finite() {
            return None;
        }
        let (min, max) = (f64::from(Self::MIN), f64::from(Self::MAX));
        let rounded = score.clamp(min, max).round_ties_even();
        Some(Self(rounded.clamp(min, max) as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.0, Self::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(score: f64) -> u8 {
        Rating::from_score(score).unwrap().value()
    }

    #[test]
    fn test_from_score_clips_then_rounds() {
        assert_eq!(rate(8.6), 9);
        assert_eq!(rate(11.1), 10);
        assert_eq!(rate(0.6), 1);
        assert_eq!(rate(-40.0), 1);
        assert_eq!(rate(1e9), 10);
        assert_eq!(rate(f64::MAX), 10);
    }

    #[test]
    fn test_from_score_rounds_half_to_even() {
        assert_eq!(rate(8.5), 8);
        assert_eq!(rate(9.5), 10);
        assert_eq!(rate(1.5), 2);
        assert_eq!(rate(2.5), 2);
    }

    #[test]
    fn test_from_score_refuses_non_finite() {
        assert_eq!(Rating::from_score(f64::NAN), None);
        assert_eq!(Rating::from_score(f64::INFINITY), None);
        assert_eq!(Rating::from_score(f64::NEG_INFINITY), None);
    }

    #[test]
    fn test_rejection_messages_and_codes() {
        assert_eq!(Rejection::TooShort.code(), "too_short");
        assert_eq!(Rejection::NoKnownVocabulary.to_string(), "no_known_vocabulary");
        assert!(Rejection::TooShort.message().starts_with("Please write"));

        let json = serde_json::to_string(&Rejection::NoKnownVocabulary).unwrap();
        assert_eq!(json, "\"no_known_vocabulary\"");
    }

    #[test]
    fn test_rating_display_and_serialization() {
        let rating = Rating::from_score(7.2).unwrap();
        assert_eq!(rating.to_string(), "7/10");
        assert_eq!(serde_json::to_string(&rating).unwrap(), "7");
    }
}
