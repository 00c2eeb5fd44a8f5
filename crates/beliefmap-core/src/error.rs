//! Error types for the belief graph engine.

use std::path::PathBuf;

use crate::belief::BeliefId;

/// Convenience alias for results within the core crate.
pub type Result<T> = std::result::Result<T, BeliefError>;

/// Errors from the belief graph engine.
///
/// Every variant is a rejected operation: the store is left exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum BeliefError {
    #[error("belief map has no core belief; initialize it first")]
    NoCore,

    #[error("belief text must be at least {min} characters, got {actual}")]
    TextTooShort { min: usize, actual: usize },

    #[error("belief text must be at most {max} characters, got {actual}")]
    TextTooLong { max: usize, actual: usize },

    #[error("confidence {0} is outside the 0..=100 range")]
    ConfidenceOutOfRange(u8),

    #[error("parent belief {0} not found")]
    ParentNotFound(BeliefId),

    #[error("the core belief cannot be revised or reclassified")]
    CoreImmutable,

    #[error("unsupported schema version '{found}', expected '{expected}'")]
    SchemaMismatch { found: String, expected: String },

    #[error("imported state has no core belief")]
    MissingCore,

    #[error("invalid belief map state: {0}")]
    InvalidState(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid state file magic bytes")]
    InvalidMagic,

    #[error("unsupported state file version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityFailed { expected: String, actual: String },

    #[error("state file too short: need at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    #[error("persistence failed at {}: {detail}", path.display())]
    Persist { path: PathBuf, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn error_display() {
        let err = BeliefError::ParentNotFound(Uuid::nil());
        assert!(err.to_string().contains("not found"));

        let err = BeliefError::SchemaMismatch {
            found: "v0".into(),
            expected: "v1".into(),
        };
        assert_eq!(
            err.to_string(),
            "unsupported schema version 'v0', expected 'v1'"
        );
    }

    #[test]
    fn persist_error_shows_path() {
        let err = BeliefError::Persist {
            path: PathBuf::from("/tmp/state.bmap"),
            detail: "disk full".into(),
        };
        assert!(err.to_string().contains("/tmp/state.bmap"));
        assert!(err.to_string().contains("disk full"));
    }
}
