//! Errors from classification and the session driver.

use beliefmap_core::{BeliefError, BeliefId};
use thiserror::Error;

/// Failures at the classifier boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid classify request: {0}")]
    InvalidRequest(String),

    #[error("classifier transport failed: {0}")]
    Transport(String),

    #[error("no JSON object in classifier output")]
    NoJson,

    #[error("malformed classifier output: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid classifier output: {0}")]
    InvalidResponse(String),
}

/// Failures of a session step.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("growth is blocked by belief {0}; re-evaluate it first")]
    Blocked(BeliefId),

    #[error("nothing is blocking growth")]
    NotBlocked,

    #[error("unknown belief {0}")]
    UnknownBelief(BeliefId),

    #[error("the core belief is never classified")]
    CoreNotClassified,

    #[error("suggestions are only available in sandbox mode")]
    SandboxOnly,

    #[error(transparent)]
    Belief(#[from] BeliefError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
