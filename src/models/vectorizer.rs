//! Bag-of-n-grams text vectorizer.
//!
//! Reproduces the feature extraction of the fitted scikit-learn
//! `CountVectorizer`/`TfidfVectorizer` steps so that the exported
//! regression heads see the same columns they were trained on.
//! The fitted state (vocabulary, idf weights and analyzer settings)
//! is read from a JSON file written next to the heads at export time.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use super::bundle::VocabularyCoverage;

/// Default token pattern of the scikit-learn word analyzer
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

/// Runs of two or more whitespace characters, collapsed before char analysis
static WHITE_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\s+").expect("whitespace pattern is a valid regex"));

/// How text is split into terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Analyzer {
    /// Word n-grams over regex tokens
    Word,
    /// Character n-grams over the whole text
    Char,
    /// Character n-grams inside word boundaries, words padded with spaces
    CharWb,
}

/// Row normalization applied after weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    #[default]
    L2,
    L1,
    None,
}

#[derive(Debug, Deserialize)]
struct VectorizerFile {
    analyzer: Analyzer,
    ngram_range: (usize, usize),
    #[serde(default = "default_lowercase")]
    lowercase: bool,
    vocabulary: HashMap<String, usize>,
    #[serde(default)]
    idf: Option<Vec<f32>>,
    #[serde(default)]
    sublinear_tf: bool,
    #[serde(default)]
    norm: Norm,
}

fn default_lowercase() -> bool {
    true
}

/// Sparse feature row, indices ascending
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub indices: Vec<usize>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Number of stored entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Dot product with a dense weight vector
    pub fn dot(&self, weights: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .filter_map(|(&i, &v)| weights.get(i).map(|w| w * f64::from(v)))
            .sum()
    }

    /// Expand into a dense row of `width` columns
    pub fn to_dense(&self, width: usize) -> Vec<f32> {
        let mut dense = vec![0.0; width];
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            if i < width {
                dense[i] = v;
            }
        }
        dense
    }
}

/// Fitted text vectorizer
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    analyzer: Analyzer,
    min_n: usize,
    max_n: usize,
    lowercase: bool,
    vocabulary: HashMap<String, usize>,
    idf: Option<Vec<f32>>,
    sublinear_tf: bool,
    norm: Norm,
}

impl TfidfVectorizer {
    /// Load a fitted vectorizer from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read vectorizer {}", path.display()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("Invalid vectorizer {}", path.display()))
    }

    /// Parse and validate a fitted vectorizer
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let file: VectorizerFile =
            serde_json::from_str(raw).context("Failed to parse vectorizer JSON")?;

        let (min_n, max_n) = file.ngram_range;
        if min_n == 0 || min_n > max_n {
            bail!("invalid ngram_range ({min_n}, {max_n})");
        }
        if file.vocabulary.is_empty() {
            bail!("vocabulary is empty");
        }

        let width = file.vocabulary.len();
        if let Some((term, &index)) = file.vocabulary.iter().find(|(_, &i)| i >= width) {
            bail!("vocabulary term {term:?} has index {index} outside {width} columns");
        }
        if let Some(idf) = &file.idf {
            if idf.len() != width {
                bail!("idf has {} weights for {width} columns", idf.len());
            }
        }

        Ok(Self {
            analyzer: file.analyzer,
            min_n,
            max_n,
            lowercase: file.lowercase,
            vocabulary: file.vocabulary,
            idf: file.idf,
            sublinear_tf: file.sublinear_tf,
            norm: file.norm,
        })
    }

    /// Number of feature columns
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn analyzer(&self) -> Analyzer {
        self.analyzer
    }

    /// Split text into the terms the vocabulary is keyed by
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        match self.analyzer {
            Analyzer::Word => self.word_ngrams(&text),
            Analyzer::Char => self.char_ngrams(&WHITE_SPACES.replace_all(&text, " ")),
            Analyzer::CharWb => self.char_wb_ngrams(&WHITE_SPACES.replace_all(&text, " ")),
        }
    }

    fn word_ngrams(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = TOKEN_PATTERN.find_iter(text).map(|m| m.as_str()).collect();
        let mut grams = Vec::new();

        for n in self.min_n..=self.max_n.min(tokens.len()) {
            grams.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        grams
    }

    fn char_ngrams(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut grams = Vec::new();

        for n in self.min_n..=self.max_n.min(chars.len()) {
            grams.extend(chars.windows(n).map(|window| window.iter().collect::<String>()));
        }
        grams
    }

    fn char_wb_ngrams(&self, text: &str) -> Vec<String> {
        let mut grams = Vec::new();

        for word in text.split_whitespace() {
            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            let len = padded.len();

            for n in self.min_n..=self.max_n {
                let mut offset = 0;
                grams.push(padded[offset..(offset + n).min(len)].iter().collect());
                while offset + n < len {
                    offset += 1;
                    grams.push(padded[offset..offset + n].iter().collect());
                }
                // a word shorter than n is counted once
                if offset == 0 {
                    break;
                }
            }
        }
        grams
    }

    /// Raw counts of known terms, keyed by column
    fn term_counts(&self, text: &str) -> HashMap<usize, u32> {
        let mut counts = HashMap::new();
        for term in self.analyze(text) {
            if let Some(&column) = self.vocabulary.get(&term) {
                *counts.entry(column).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Vectorize one document
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut entries: Vec<(usize, f32)> = self
            .term_counts(text)
            .into_iter()
            .map(|(column, count)| {
                let mut tf = count as f32;
                if self.sublinear_tf {
                    tf = 1.0 + tf.ln();
                }
                if let Some(idf) = &self.idf {
                    tf *= idf[column];
                }
                (column, tf)
            })
            .collect();
        entries.sort_unstable_by_key(|&(column, _)| column);

        let scale = match self.norm {
            Norm::L2 => entries.iter().map(|(_, v)| v * v).sum::<f32>().sqrt(),
            Norm::L1 => entries.iter().map(|(_, v)| v.abs()).sum::<f32>(),
            Norm::None => 1.0,
        };
        let scale = if scale > 0.0 { scale } else { 1.0 };

        let (indices, values) = entries.into_iter().map(|(i, v)| (i, v / scale)).unzip();
        SparseVector { indices, values }
    }
}

impl VocabularyCoverage for TfidfVectorizer {
    fn vocabulary_coverage(&self, text: &str) -> usize {
        self.term_counts(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_vectorizer(extra: &str) -> TfidfVectorizer {
        TfidfVectorizer::from_json_str(&format!(
            r#"{{
                "analyzer": "word",
                "ngram_range": [1, 2],
                "vocabulary": {{"great": 0, "movie": 1, "great movie": 2, "boring": 3}}
                {extra}
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_word_analyzer_drops_single_char_tokens() {
        let vectorizer = word_vectorizer("");
        let terms = vectorizer.analyze("A Great movie!");
        assert_eq!(terms, vec!["great", "movie", "great movie"]);
    }

    #[test]
    fn test_transform_l2_normalizes() {
        let vectorizer = word_vectorizer("");
        let row = vectorizer.transform("great movie, great cast");

        assert_eq!(row.indices, vec![0, 1, 2]);
        let norm: f32 = row.values.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        // "great" appears twice
        assert!(row.values[0] > row.values[1]);
    }

    #[test]
    fn test_transform_applies_idf_and_sublinear_tf() {
        let vectorizer =
            word_vectorizer(r#", "idf": [1.0, 2.0, 3.0, 4.0], "sublinear_tf": true, "norm": "none""#);
        let row = vectorizer.transform("great great boring");

        assert_eq!(row.indices, vec![0, 3]);
        assert!((row.values[0] - (1.0 + 2f32.ln())).abs() < 1e-5);
        assert!((row.values[1] - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_vocabulary_coverage_counts_distinct_columns() {
        let vectorizer = word_vectorizer("");
        assert_eq!(vectorizer.vocabulary_coverage("xyzzy plugh wibble"), 0);
        assert_eq!(vectorizer.vocabulary_coverage("boring boring boring"), 1);
        assert_eq!(vectorizer.vocabulary_coverage("great movie"), 3);
    }

    #[test]
    fn test_char_wb_pads_words_and_counts_short_words_once() {
        let vectorizer = TfidfVectorizer::from_json_str(
            r#"{"analyzer": "char_wb", "ngram_range": [2, 3], "vocabulary": {" a": 0}}"#,
        )
        .unwrap();

        assert_eq!(vectorizer.analyze("ab"), vec![" a", "ab", "b ", " ab", "ab "]);
        assert_eq!(vectorizer.analyze("a"), vec![" a", "a ", " a "]);
    }

    #[test]
    fn test_char_wb_short_word_single_gram() {
        let vectorizer = TfidfVectorizer::from_json_str(
            r#"{"analyzer": "char_wb", "ngram_range": [4, 5], "vocabulary": {" a ": 0}}"#,
        )
        .unwrap();

        assert_eq!(vectorizer.analyze("a"), vec![" a "]);
    }

    #[test]
    fn test_char_analyzer_collapses_whitespace() {
        let vectorizer = TfidfVectorizer::from_json_str(
            r#"{"analyzer": "char", "ngram_range": [2, 2], "vocabulary": {"a ": 0}}"#,
        )
        .unwrap();

        assert_eq!(vectorizer.analyze("A   b"), vec!["a ", " b"]);
    }

    #[test]
    fn test_rejects_inconsistent_state() {
        let bad_index = r#"{"analyzer": "word", "ngram_range": [1, 1], "vocabulary": {"a": 5}}"#;
        assert!(TfidfVectorizer::from_json_str(bad_index).is_err());

        let bad_idf =
            r#"{"analyzer": "word", "ngram_range": [1, 1], "vocabulary": {"ab": 0}, "idf": [1.0, 2.0]}"#;
        assert!(TfidfVectorizer::from_json_str(bad_idf).is_err());

        let bad_range = r#"{"analyzer": "word", "ngram_range": [2, 1], "vocabulary": {"ab": 0}}"#;
        assert!(TfidfVectorizer::from_json_str(bad_range).is_err());
    }

    #[test]
    fn test_sparse_dot_and_dense() {
        let row = SparseVector {
            indices: vec![0, 2],
            values: vec![0.5, 2.0],
        };
        assert!((row.dot(&[2.0, 100.0, 1.5]) - 4.0).abs() < 1e-9);
        assert_eq!(row.to_dense(3), vec![0.5, 0.0, 2.0]);
    }
}
