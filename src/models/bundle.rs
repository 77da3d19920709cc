//! The loaded model bundle and the capabilities it exposes

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure inside a single sub-model call
#[derive(Debug, Error)]
pub enum ModelError {
    /// ONNX Runtime rejected the input or failed while running
    #[error("onnx runtime error: {0}")]
    Onnx(#[from] ort::Error),
    /// The session produced no usable output value
    #[error("model output {0:?} missing or empty")]
    MissingOutput(String),
    /// The session mutex was poisoned by a panic in another request
    #[error("model session lock poisoned")]
    Poisoned,
}

/// A fitted text regression pipeline
pub trait TextRegressor: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &str;

    /// Predict a real-valued score for one document
    fn predict(&self, text: &str) -> Result<f64, ModelError>;
}

/// Counts how many vocabulary entries a text activates
pub trait VocabularyCoverage: Send + Sync {
    fn vocabulary_coverage(&self, text: &str) -> usize;
}

/// The two fitted pipelines plus the word vocabulary check.
///
/// Built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct ModelBundle {
    word_model: Arc<dyn TextRegressor>,
    char_model: Arc<dyn TextRegressor>,
    coverage: Arc<dyn VocabularyCoverage>,
}

impl ModelBundle {
    pub fn new(
        word_model: Arc<dyn TextRegressor>,
        char_model: Arc<dyn TextRegressor>,
        coverage: Arc<dyn VocabularyCoverage>,
    ) -> Self {
        Self {
            word_model,
            char_model,
            coverage,
        }
    }

    /// Regression over word features
    pub fn word_model(&self) -> &dyn TextRegressor {
        self.word_model.as_ref()
    }

    /// Regression over character n-gram features
    pub fn char_model(&self) -> &dyn TextRegressor {
        self.char_model.as_ref()
    }

    /// Number of word-vocabulary features the text activates
    pub fn vocabulary_coverage(&self, text: &str) -> usize {
        self.coverage.vocabulary_coverage(text)
    }
}

impl fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBundle")
            .field("word_model", &self.word_model.name())
            .field("char_model", &self.char_model.name())
            .finish()
    }
}
