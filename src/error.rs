//! Crate-level error type for the configuration, loading and CLI surface.
//!
//! Token inconsistency is never an error; it is a negative validation result.

use thiserror::Error;

use crate::tolerance::ToleranceError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tolerance contract violation: {0}")]
    Tolerance(#[from] ToleranceError),
}
