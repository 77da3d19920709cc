//! Word/char ensemble rating predictor

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::bundle::{ModelBundle, ModelError, TextRegressor};
use crate::types::Rating;

/// A sub-model call failed after the review passed the guard
#[derive(Debug, Error)]
pub enum PredictionFailure {
    #[error("{model} model failed: {source}")]
    Model {
        model: String,
        #[source]
        source: ModelError,
    },
    #[error("{model} model produced a non-finite score ({score})")]
    NonFinite { model: String, score: f64 },
}

/// Ensemble prediction with the raw sub-model scores kept for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub rating: Rating,
    pub word_score: f64,
    pub char_score: f64,
    /// Unweighted mean of the two raw scores, before clipping
    pub average: f64,
}

impl Prediction {
    /// Combine two raw sub-model scores into a rating, `None` unless both are finite
    pub fn from_scores(word_score: f64, char_score: f64) -> Option<Self> {
        let average = word_score / 2.0 + char_score / 2.0;
        Some(Self {
            rating: Rating::from_score(average)?,
            word_score,
            char_score,
            average,
        })
    }

    /// Absolute disagreement between the two sub-models
    pub fn divergence(&self) -> f64 {
        (self.word_score - self.char_score).abs()
    }
}

/// Averages the word and char models and maps the result to a rating
#[derive(Debug, Clone, Copy, Default)]
pub struct EnsemblePredictor;

impl EnsemblePredictor {
    pub fn new() -> Self {
        Self
    }

    /// Predict a rating for text that has already passed the input guard
    pub fn predict(&self, text: &str, bundle: &ModelBundle) -> Result<Prediction, PredictionFailure> {
        let word_score = score(bundle.word_model(), text)?;
        let char_score = score(bundle.char_model(), text)?;

        let prediction = Prediction::from_scores(word_score, char_score).ok_or_else(|| {
            PredictionFailure::NonFinite {
                model: "ensemble".to_string(),
                score: word_score / 2.0 + char_score / 2.0,
            }
        })?;
        debug!(
            word_score = word_score,
            char_score = char_score,
            average = prediction.average,
            rating = prediction.rating.value(),
            "Ensemble prediction"
        );

        Ok(prediction)
    }
}

fn score(model: &dyn TextRegressor, text: &str) -> Result<f64, PredictionFailure> {
    let score = model.predict(text).map_err(|source| PredictionFailure::Model {
        model: model.name().to_string(),
        source,
    })?;

    if !score.is_finite() {
        return Err(PredictionFailure::NonFinite {
            model: model.name().to_string(),
            score,
        });
    }
    Ok(score)
}
