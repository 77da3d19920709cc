//! Review handling shared by both presentation shells

use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::catalog;
use crate::guard::{GuardOutcome, InputGuard};
use crate::metrics::ServiceMetrics;
use crate::models::{EnsemblePredictor, ModelBundle, Prediction, PredictionFailure};
use crate::types::{Movie, Rejection, ReviewInput};

/// Message shown when a prediction fails; the cause only goes to the logs
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while predicting your rating. Please try again.";

/// Characters of review text included in debug logs
const LOG_SAMPLE_CHARS: usize = 120;

/// Outcome of a review for a known movie
#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    Rated {
        movie: &'static Movie,
        prediction: Prediction,
    },
    Rejected {
        movie: &'static Movie,
        rejection: Rejection,
    },
}

impl ReviewOutcome {
    pub fn movie(&self) -> &'static Movie {
        match self {
            ReviewOutcome::Rated { movie, .. } | ReviewOutcome::Rejected { movie, .. } => *movie,
        }
    }
}

/// Review could not be handled
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("unknown movie {0:?}")]
    UnknownMovie(String),
    #[error(transparent)]
    Prediction(#[from] PredictionFailure),
}

/// Guard + ensemble over the shared model bundle
pub struct RatingService {
    bundle: Arc<ModelBundle>,
    guard: InputGuard,
    predictor: EnsemblePredictor,
    metrics: Arc<ServiceMetrics>,
}

impl RatingService {
    pub fn new(bundle: Arc<ModelBundle>, guard: InputGuard, metrics: Arc<ServiceMetrics>) -> Self {
        Self {
            bundle,
            guard,
            predictor: EnsemblePredictor::new(),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<ServiceMetrics> {
        &self.metrics
    }

    /// Validate a review and, when accepted, predict its rating
    pub fn review(&self, input: &ReviewInput) -> Result<ReviewOutcome, ReviewError> {
        let movie = catalog::find(&input.movie)
            .ok_or_else(|| ReviewError::UnknownMovie(input.movie.clone()))?;
        let start_time = Instant::now();

        let text = match self.guard.validate(&input.review, &self.bundle) {
            GuardOutcome::Accepted(text) => text,
            GuardOutcome::Rejected(rejection) => {
                self.metrics.record_rejection(start_time.elapsed(), rejection);
                info!(movie = %movie.id, reason = %rejection, "Review rejected");
                return Ok(ReviewOutcome::Rejected { movie, rejection });
            }
        };

        debug!(
            movie = %movie.id,
            input_len = text.len(),
            sample = %text.chars().take(LOG_SAMPLE_CHARS).collect::<String>(),
            "Review accepted"
        );

        match self.predictor.predict(&text, &self.bundle) {
            Ok(prediction) => {
                let elapsed = start_time.elapsed();
                self.metrics.record_rating(elapsed, &prediction);
                info!(
                    movie = %movie.id,
                    rating = prediction.rating.value(),
                    word_score = prediction.word_score,
                    char_score = prediction.char_score,
                    average = prediction.average,
                    processing_time_us = elapsed.as_micros(),
                    "Rating predicted"
                );
                Ok(ReviewOutcome::Rated { movie, prediction })
            }
            Err(e) => {
                self.metrics.record_failure(start_time.elapsed());
                error!(movie = %movie.id, error = %e, "Prediction failed");
                Err(e.into())
            }
        }
    }
}
