//! Research error types.
//!
//! Every failure mode of a lookup has a named variant. The HTTP layer maps
//! `Validation` to 400 and everything else to 500.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResearchError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Missing or unusable provider settings. Surfaced verbatim.
    #[error("{0}")]
    Configuration(String),

    /// The provider answered with a non-success status.
    #[error("Research provider returned {status}")]
    Upstream { status: u16, body: String },

    /// The provider answered, but not with a usable research record.
    #[error("Failed to parse research response: {reason}")]
    Parse { reason: String, raw: String },

    #[error("Research request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResearchError {
    /// The unparsed provider text attached to a parse failure.
    pub fn raw(&self) -> Option<&str> {
        match self {
            ResearchError::Parse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ResearchError::Validation(_))
    }
}

/// Result type alias for research operations.
pub type ResearchResult<T> = Result<T, ResearchError>;
