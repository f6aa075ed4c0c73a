//! Error types for tracelight

use thiserror::Error;

use crate::rules::PatternError;

/// Result type alias for tracelight operations
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("theme parse error: {0}")]
    ThemeParse(#[from] toml::de::Error),

    #[error("unknown color name: {0}")]
    UnknownColor(String),

    #[error("{0}")]
    Message(String),
}
