// crates/xgeo-core/src/error.rs
use thiserror::Error;

/// Errors surfaced by the I/O-facing parts of the engine.
///
/// Extraction itself never fails: an unexpected payload shape degrades to
/// "no observation". Only parsing raw text, talking to a storage backend and
/// loading configuration can produce one of these.
#[derive(Debug, Error)]
pub enum XGeoError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid entry: {0}")]
    InvalidEntry(String),
}

pub type Result<T> = std::result::Result<T, XGeoError>;
