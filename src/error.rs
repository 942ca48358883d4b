//! Error taxonomy for the dashboard.
//!
//! Each layer owns one error enum. Load errors stop the pipeline before any
//! aggregation runs; render and report errors are caught by the caller of
//! the export action and surfaced to the user.

use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading the mission dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("dataset not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("dataset {} is unreadable: {cause}", path.display())]
    SourceUnreadable { path: PathBuf, cause: String },

    #[error("dataset {} is missing required column(s): {}", path.display(), columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
}

impl LoadError {
    pub(crate) fn unreadable(path: &std::path::Path, cause: impl std::fmt::Display) -> Self {
        LoadError::SourceUnreadable {
            path: path.to_path_buf(),
            cause: cause.to_string(),
        }
    }
}

/// Failures while drawing a figure.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("bundled chart font could not be registered")]
    Font,

    #[error("failed to draw chart '{chart}': {message}")]
    Draw { chart: String, message: String },
}

/// Failures while producing the PDF report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not create temporary image storage: {0}")]
    Scratch(#[source] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("could not read rendered chart image {}: {message}", path.display())]
    Image { path: PathBuf, message: String },

    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}

/// Failures while reading the TOML configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures while exporting aggregation tables to disk.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("write error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error for {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
