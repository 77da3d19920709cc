//! Model bundle loading and ensemble inference

pub mod bundle;
pub mod ensemble;
pub mod loader;
pub mod pipeline;
pub mod vectorizer;

#[cfg(test)]
pub(crate) mod testing;

pub use bundle::{ModelBundle, ModelError, TextRegressor, VocabularyCoverage};
pub use ensemble::{EnsemblePredictor, Prediction, PredictionFailure};
pub use loader::BundleLoader;
pub use pipeline::TextPipeline;
pub use vectorizer::TfidfVectorizer;
