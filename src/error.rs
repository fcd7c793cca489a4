//! Error taxonomy for the geoatlas engine.
//!
//! Every failure is synchronous and surfaced to the caller of the same
//! operation; nothing is retried internally. Batch ingest is the only place
//! with partial-failure semantics: invalid features are skipped and counted,
//! the rest of the layer still loads.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtlasError>;

#[derive(Error, Debug)]
pub enum AtlasError {
    /// Malformed input geometry at load time. Fatal to that feature only.
    #[error("invalid feature geometry: {0}")]
    Ingest(String),

    /// An index was queried before `build`. Programming error, not
    /// user-facing.
    #[error("spatial index for layer '{0}' has not been built")]
    IndexNotBuilt(String),

    /// Lookup miss, surfaced as an empty result / 404.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or malformed client parameters; rejected before any index
    /// work happens.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Source store unreachable at startup. Fatal, the process aborts.
    #[error("upstream data store unavailable: {0}")]
    Upstream(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AtlasError {
    pub fn not_found(layer: &str, id: u64) -> Self {
        AtlasError::NotFound(format!("layer '{layer}' has no feature with id {id}"))
    }

    pub fn unknown_layer(layer: &str) -> Self {
        AtlasError::NotFound(format!("unknown layer '{layer}'"))
    }
}
