//! Vectorizer + regression head pipelines

use anyhow::{bail, Context, Result};
use ort::session::Session;
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::bundle::{ModelError, TextRegressor};
use super::vectorizer::{SparseVector, TfidfVectorizer};

/// Linear regression weights exported from the fitted estimator
#[derive(Debug, Clone, Deserialize)]
pub struct LinearHead {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl LinearHead {
    /// Load linear weights from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read linear head {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse linear head {}", path.display()))
    }

    fn predict(&self, features: &SparseVector) -> f64 {
        features.dot(&self.coef) + self.intercept
    }
}

/// ONNX regressor taking a dense `float32 [1, n_features]` row
#[derive(Debug)]
pub struct OnnxHead {
    /// ONNX Runtime session (run needs exclusive access)
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    /// Feature width declared by the model, `None` when dynamic
    input_width: Option<usize>,
}

impl OnnxHead {
    pub fn new(
        session: Session,
        input_name: String,
        output_name: String,
        input_width: Option<usize>,
    ) -> Self {
        Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_width,
        }
    }

    fn predict(&self, features: &SparseVector, width: usize) -> Result<f64, ModelError> {
        use ort::value::Tensor;

        let shape = vec![1_i64, width as i64];
        let input_tensor = Tensor::from_array((shape, features.to_dense(width)))?;

        let mut session = self.session.lock().map_err(|_| ModelError::Poisoned)?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| ModelError::MissingOutput(self.output_name.clone()))?;
        let (_, data) = output.try_extract_tensor::<f32>()?;

        let score = data
            .first()
            .map(|&score| f64::from(score))
            .ok_or_else(|| ModelError::MissingOutput(self.output_name.clone()));
        score
    }
}

/// Final estimator of a pipeline
#[derive(Debug)]
pub enum RegressionHead {
    Linear(LinearHead),
    Onnx(OnnxHead),
}

impl RegressionHead {
    /// Number of features the head expects, `None` when it accepts any width
    pub fn input_width(&self) -> Option<usize> {
        match self {
            RegressionHead::Linear(linear) => Some(linear.coef.len()),
            RegressionHead::Onnx(onnx) => onnx.input_width,
        }
    }
}

/// Fail when a head declares a width different from the vectorizer's
pub fn check_head_width(name: &str, head_width: Option<usize>, n_features: usize) -> Result<()> {
    match head_width {
        Some(width) if width != n_features => bail!(
            "{name} head expects {width} features but the vectorizer produces {n_features}"
        ),
        _ => Ok(()),
    }
}

/// A fitted pipeline: vectorize, then regress
#[derive(Debug)]
pub struct TextPipeline {
    name: String,
    vectorizer: Arc<TfidfVectorizer>,
    head: RegressionHead,
}

impl TextPipeline {
    /// Assemble a pipeline, checking the head matches the vectorizer width
    pub fn new(name: &str, vectorizer: Arc<TfidfVectorizer>, head: RegressionHead) -> Result<Self> {
        check_head_width(name, head.input_width(), vectorizer.n_features())?;

        Ok(Self {
            name: name.to_string(),
            vectorizer,
            head,
        })
    }

    pub fn vectorizer(&self) -> &Arc<TfidfVectorizer> {
        &self.vectorizer
    }
}

impl TextRegressor for TextPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, text: &str) -> Result<f64, ModelError> {
        let features = self.vectorizer.transform(text);

        let score = match &self.head {
            RegressionHead::Linear(linear) => linear.predict(&features),
            RegressionHead::Onnx(onnx) => onnx.predict(&features, self.vectorizer.n_features())?,
        };

        debug!(model = %self.name, nnz = features.nnz(), score = score, "Pipeline prediction");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer() -> Arc<TfidfVectorizer> {
        Arc::new(
            TfidfVectorizer::from_json_str(
                r#"{
                    "analyzer": "word",
                    "ngram_range": [1, 1],
                    "vocabulary": {"amazing": 0, "awful": 1},
                    "norm": "none"
                }"#,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_linear_pipeline_predicts() {
        let head = LinearHead {
            coef: vec![2.5, -3.0],
            intercept: 5.0,
        };
        let pipeline = TextPipeline::new("word", vectorizer(), RegressionHead::Linear(head)).unwrap();

        assert_eq!(pipeline.name(), "word");
        assert!((pipeline.predict("amazing amazing plot").unwrap() - 10.0).abs() < 1e-9);
        assert!((pipeline.predict("awful plot").unwrap() - 2.0).abs() < 1e-9);
        assert!((pipeline.predict("plot").unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_linear_head_width_mismatch() {
        let head = LinearHead {
            coef: vec![1.0],
            intercept: 0.0,
        };
        let err = TextPipeline::new("word", vectorizer(), RegressionHead::Linear(head)).unwrap_err();
        assert!(err.to_string().contains("expects 1 features"));
    }

    #[test]
    fn test_declared_width_must_match_vectorizer() {
        assert!(check_head_width("char", Some(400), 400).is_ok());
        assert!(check_head_width("char", None, 400).is_ok());

        let err = check_head_width("char", Some(500), 400).unwrap_err();
        assert_eq!(
            err.to_string(),
            "char head expects 500 features but the vectorizer produces 400"
        );
    }
}
