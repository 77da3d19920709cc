//! Configuration management for the rating service

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Presentation shell mounted on the HTTP server
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// Server-rendered pages with a full reload per submission
    Pages,
    /// Single-page app backed by a JSON API
    Spa,
}

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub models: ModelsConfig,
    #[serde(default)]
    pub guard: GuardConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub bind: String,
    /// Shells to mount (default: both)
    #[serde(default = "default_shells")]
    pub shells: Vec<ShellKind>,
}

fn default_shells() -> Vec<ShellKind> {
    vec![ShellKind::Pages, ShellKind::Spa]
}

/// Model bundle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Path to the bundle manifest
    pub bundle_path: String,
    /// Number of threads for ONNX heads (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
}

fn default_onnx_threads() -> usize {
    1
}

/// Input guard configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GuardConfig {
    /// Minimum number of whitespace-delimited tokens in a review
    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,
}

fn default_min_tokens() -> usize {
    3
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            min_tokens: default_min_tokens(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between logged summaries, 0 disables the reporter
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    60
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default)]
    pub format: LogFormat,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:8080".to_string(),
                shells: default_shells(),
            },
            models: ModelsConfig {
                bundle_path: "models/bundle.json".to_string(),
                onnx_threads: 1,
            },
            guard: GuardConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}
