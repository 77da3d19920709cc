//! Movie Rating Predictor Library
//!
//! Predicts a 1-10 rating from a free-text movie review by averaging a
//! word-feature and a char-n-gram regression model, and serves it through
//! a multi-page and a single-page web shell.

pub mod catalog;
pub mod config;
pub mod guard;
pub mod metrics;
pub mod models;
pub mod service;
pub mod shells;
pub mod types;

pub use config::AppConfig;
pub use guard::{GuardOutcome, InputGuard};
pub use metrics::ServiceMetrics;
pub use models::{BundleLoader, EnsemblePredictor, ModelBundle, Prediction};
pub use service::{RatingService, ReviewError, ReviewOutcome};
pub use shells::AppState;
pub use types::{Movie, Rating, Rejection, ReviewInput};
