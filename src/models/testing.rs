//! In-memory stand-ins for fitted models

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::bundle::{ModelBundle, ModelError, TextRegressor, VocabularyCoverage};

/// Always predicts the same score
pub struct FixedRegressor {
    name: String,
    score: f64,
    pub calls: AtomicUsize,
}

impl FixedRegressor {
    pub fn new(name: &str, score: f64) -> Self {
        Self {
            name: name.to_string(),
            score,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TextRegressor for FixedRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, _text: &str) -> Result<f64, ModelError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(self.score)
    }
}

/// Always fails
pub struct FailingRegressor {
    name: String,
}

impl FailingRegressor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl TextRegressor for FailingRegressor {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, _text: &str) -> Result<f64, ModelError> {
        Err(ModelError::MissingOutput("variable".to_string()))
    }
}

/// Vocabulary made of whole lowercase words
pub struct KnownWords(HashSet<String>);

impl KnownWords {
    pub fn new(words: &[&str]) -> Self {
        Self(words.iter().map(|w| w.to_string()).collect())
    }
}

impl VocabularyCoverage for KnownWords {
    fn vocabulary_coverage(&self, text: &str) -> usize {
        let words: HashSet<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
            .collect();
        words.iter().filter(|w| self.0.contains(*w)).count()
    }
}

/// Common English review vocabulary
pub const REVIEW_WORDS: &[&str] = &[
    "this", "movie", "was", "absolutely", "amazing", "and", "thrilling", "good", "bad", "plot",
    "boring", "great",
];

/// Bundle with fixed sub-model scores and a small review vocabulary
pub fn stub_bundle(word_score: f64, char_score: f64) -> ModelBundle {
    ModelBundle::new(
        Arc::new(FixedRegressor::new("word", word_score)),
        Arc::new(FixedRegressor::new("char", char_score)),
        Arc::new(KnownWords::new(REVIEW_WORDS)),
    )
}
