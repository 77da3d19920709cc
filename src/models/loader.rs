//! Model bundle loader

use anyhow::{bail, Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use ort::value::ValueType;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};
use tracing::info;

use super::bundle::ModelBundle;
use super::pipeline::{LinearHead, OnnxHead, RegressionHead, TextPipeline};
use super::vectorizer::{Analyzer, TfidfVectorizer};

static ORT_INIT: Once = Once::new();

/// Bundle manifest: one entry per pipeline, paths relative to the manifest
#[derive(Debug, Deserialize)]
pub struct BundleManifest {
    pub word_model: PipelineFiles,
    pub char_model: PipelineFiles,
}

/// Files making up one pipeline
#[derive(Debug, Deserialize)]
pub struct PipelineFiles {
    /// Fitted vectorizer (JSON)
    pub vectorizer: PathBuf,
    /// Regression head: `.json` linear weights or an `.onnx` regressor
    pub head: PathBuf,
}

/// Loader for the word/char model bundle
pub struct BundleLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl BundleLoader {
    /// Create a new loader with default settings (1 thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    /// Create a new loader with specified number of ONNX threads
    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Load the bundle described by a manifest file.
    ///
    /// Any missing, unparsable or inconsistent artifact is an error: the
    /// service cannot run with a partial bundle.
    pub fn load_bundle<P: AsRef<Path>>(&self, manifest_path: P) -> Result<ModelBundle> {
        let manifest_path = manifest_path.as_ref();
        info!(path = %manifest_path.display(), "Loading model bundle");

        let raw = std::fs::read_to_string(manifest_path)
            .with_context(|| format!("Failed to read bundle manifest {}", manifest_path.display()))?;
        let manifest: BundleManifest = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse bundle manifest {}", manifest_path.display()))?;
        let base_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));

        let word = self.load_pipeline(base_dir, &manifest.word_model, "word")?;
        let char = self.load_pipeline(base_dir, &manifest.char_model, "char")?;

        if word.vectorizer().analyzer() != Analyzer::Word {
            bail!(
                "word_model vectorizer uses the {:?} analyzer, expected word",
                word.vectorizer().analyzer()
            );
        }

        let coverage = word.vectorizer().clone();
        info!(
            word_features = word.vectorizer().n_features(),
            char_features = char.vectorizer().n_features(),
            "Model bundle loaded"
        );

        Ok(ModelBundle::new(Arc::new(word), Arc::new(char), coverage))
    }

    /// Load one vectorizer + head pipeline
    pub fn load_pipeline(&self, base_dir: &Path, files: &PipelineFiles, name: &str) -> Result<TextPipeline> {
        let vectorizer_path = base_dir.join(&files.vectorizer);
        let head_path = base_dir.join(&files.head);

        let vectorizer = Arc::new(TfidfVectorizer::load(&vectorizer_path)?);
        let head = self.load_head(&head_path, name)?;

        info!(
            model = %name,
            analyzer = ?vectorizer.analyzer(),
            features = vectorizer.n_features(),
            head = %head_path.display(),
            "Pipeline loaded"
        );

        TextPipeline::new(name, vectorizer, head)
            .with_context(|| format!("Inconsistent {name} pipeline"))
    }

    /// Load a regression head, choosing the format by file extension
    pub fn load_head(&self, path: &Path, name: &str) -> Result<RegressionHead> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(RegressionHead::Linear(LinearHead::load(path)?)),
            Some("onnx") => Ok(RegressionHead::Onnx(self.load_onnx_head(path, name)?)),
            _ => bail!(
                "Unsupported head format for {name}: {} (expected .json or .onnx)",
                path.display()
            ),
        }
    }

    /// Load a single ONNX regressor from file
    fn load_onnx_head(&self, path: &Path, name: &str) -> Result<OnnxHead> {
        ORT_INIT.call_once(|| {
            let _ = ort::init().with_name("movie-rating-predictor").commit();
            info!("ONNX Runtime initialized");
        });

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX head");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .with_context(|| format!("Failed to load ONNX head from {}", path.display()))?;

        let (input_name, input_width) = match session.inputs.first() {
            Some(input) => (
                input.name.clone(),
                onnx_input_width(&input.input_type)
                    .with_context(|| format!("Unusable input in ONNX head {}", path.display()))?,
            ),
            None => bail!("ONNX head {} declares no inputs", path.display()),
        };

        let output_name = match session.outputs.first() {
            Some(output) => {
                check_onnx_output(&output.output_type)
                    .with_context(|| format!("Unusable output in ONNX head {}", path.display()))?;
                output.name.clone()
            }
            None => bail!("ONNX head {} declares no outputs", path.display()),
        };

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            width = ?input_width,
            "ONNX head loaded"
        );

        Ok(OnnxHead::new(session, input_name, output_name, input_width))
    }
}

/// Feature width of a `float32 [batch, features]` input, `None` when dynamic
fn onnx_input_width(input_type: &ValueType) -> Result<Option<usize>> {
    match input_type {
        ValueType::Tensor {
            ty: TensorElementType::Float32,
            shape,
            ..
        } => {
            if shape.len() != 2 {
                bail!("expected a [batch, features] input, got {input_type}");
            }
            Ok(usize::try_from(shape[1]).ok().filter(|&width| width > 0))
        }
        other => bail!("expected a float32 tensor input, got {other}"),
    }
}

fn check_onnx_output(output_type: &ValueType) -> Result<()> {
    match output_type.tensor_type() {
        Some(TensorElementType::Float32) => Ok(()),
        _ => bail!("expected a float32 tensor output, got {output_type}"),
    }
}

impl Default for BundleLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextRegressor;
    use crate::models::pipeline::check_head_width;
    use ort::tensor::{Shape, SymbolicDimensions};
    use std::fs;

    fn tensor(ty: TensorElementType, dims: &[i64]) -> ValueType {
        ValueType::Tensor {
            ty,
            shape: Shape::new(dims.iter().copied()),
            dimension_symbols: SymbolicDimensions::empty(dims.len()),
        }
    }

    fn write_bundle(dir: &Path, char_head: &str) {
        fs::write(
            dir.join("word_vectorizer.json"),
            r#"{"analyzer": "word", "ngram_range": [1, 1], "vocabulary": {"great": 0, "dull": 1}, "norm": "none"}"#,
        )
        .unwrap();
        fs::write(
            dir.join("word_head.json"),
            r#"{"coef": [3.0, -3.0], "intercept": 5.0}"#,
        )
        .unwrap();
        fs::write(
            dir.join("char_vectorizer.json"),
            r#"{"analyzer": "char_wb", "ngram_range": [2, 2], "vocabulary": {"gr": 0, "du": 1}}"#,
        )
        .unwrap();
        fs::write(dir.join("char_head.json"), char_head).unwrap();
        fs::write(
            dir.join("bundle.json"),
            r#"{
                "word_model": {"vectorizer": "word_vectorizer.json", "head": "word_head.json"},
                "char_model": {"vectorizer": "char_vectorizer.json", "head": "char_head.json"}
            }"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_bundle_from_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), r#"{"coef": [0.0, 0.0], "intercept": 7.0}"#);

        let bundle = BundleLoader::new().load_bundle(dir.path().join("bundle.json")).unwrap();

        assert_eq!(bundle.word_model().name(), "word");
        assert_eq!(bundle.char_model().name(), "char");
        assert!((bundle.word_model().predict("great great film").unwrap() - 11.0).abs() < 1e-9);
        assert!((bundle.char_model().predict("great film").unwrap() - 7.0).abs() < 1e-9);
        assert_eq!(bundle.vocabulary_coverage("great and dull"), 2);
        assert_eq!(bundle.vocabulary_coverage("nothing known"), 0);
    }

    #[test]
    fn test_missing_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = BundleLoader::new()
            .load_bundle(dir.path().join("bundle.json"))
            .unwrap_err();
        assert!(err.to_string().contains("bundle manifest"));
    }

    #[test]
    fn test_inconsistent_head_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), r#"{"coef": [0.0], "intercept": 7.0}"#);

        assert!(BundleLoader::new().load_bundle(dir.path().join("bundle.json")).is_err());
    }

    #[test]
    fn test_missing_head_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "{}");
        fs::remove_file(dir.path().join("char_head.json")).unwrap();

        assert!(BundleLoader::new().load_bundle(dir.path().join("bundle.json")).is_err());
    }

    #[test]
    fn test_unknown_head_extension_fails() {
        let loader = BundleLoader::new();
        assert!(loader.load_head(Path::new("head.pkl"), "word").is_err());
    }

    #[test]
    fn test_manifest_without_char_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), r#"{"coef": [0.0, 0.0], "intercept": 7.0}"#);
        fs::write(
            dir.path().join("bundle.json"),
            r#"{"word_model": {"vectorizer": "word_vectorizer.json", "head": "word_head.json"}}"#,
        )
        .unwrap();

        let err = BundleLoader::new()
            .load_bundle(dir.path().join("bundle.json"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse bundle manifest"));
        assert!(format!("{err:#}").contains("char_model"));
    }

    #[test]
    fn test_corrupt_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), r#"{"coef": [0.0, 0.0], "intercept": 7.0}"#);
        fs::write(dir.path().join("bundle.json"), "{ not json").unwrap();

        let err = BundleLoader::new()
            .load_bundle(dir.path().join("bundle.json"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse bundle manifest"));
    }

    #[test]
    fn test_word_model_needs_word_analyzer() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), r#"{"coef": [0.0, 0.0], "intercept": 7.0}"#);
        fs::write(
            dir.path().join("word_vectorizer.json"),
            r#"{"analyzer": "char_wb", "ngram_range": [2, 2], "vocabulary": {"gr": 0, "du": 1}}"#,
        )
        .unwrap();

        let err = BundleLoader::new()
            .load_bundle(dir.path().join("bundle.json"))
            .unwrap_err();
        assert!(err.to_string().contains("expected word"));
    }

    #[test]
    fn test_onnx_input_width() {
        let fixed = tensor(TensorElementType::Float32, &[-1, 500]);
        assert_eq!(onnx_input_width(&fixed).unwrap(), Some(500));

        let dynamic = tensor(TensorElementType::Float32, &[-1, -1]);
        assert_eq!(onnx_input_width(&dynamic).unwrap(), None);

        assert!(onnx_input_width(&tensor(TensorElementType::Int64, &[-1, 500])).is_err());
        assert!(onnx_input_width(&tensor(TensorElementType::Float32, &[500])).is_err());
    }

    #[test]
    fn test_onnx_head_wider_than_vectorizer_fails() {
        let width = onnx_input_width(&tensor(TensorElementType::Float32, &[1, 500])).unwrap();
        assert!(check_head_width("char", width, 400).is_err());
        assert!(check_head_width("char", width, 500).is_ok());
    }

    #[test]
    fn test_onnx_output_must_be_float_tensor() {
        assert!(check_onnx_output(&tensor(TensorElementType::Float32, &[-1, 1])).is_ok());
        assert!(check_onnx_output(&tensor(TensorElementType::Int64, &[-1])).is_err());

        let sequence = ValueType::Sequence(Box::new(tensor(TensorElementType::Float32, &[-1])));
        assert!(check_onnx_output(&sequence).is_err());
    }
}
