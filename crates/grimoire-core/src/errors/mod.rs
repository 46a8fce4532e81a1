mod artifact_error;
mod cache_error;
mod config_error;
mod evaluation_error;
mod provenance_error;
mod rerank_error;
mod retrieval_error;

pub use artifact_error::ArtifactError;
pub use cache_error::CacheError;
pub use config_error::ConfigError;
pub use evaluation_error::EvaluationError;
pub use provenance_error::ProvenanceError;
pub use rerank_error::RerankError;
pub use retrieval_error::RetrievalError;

/// Top-level error for every grimoire subsystem.
#[derive(Debug, thiserror::Error)]
pub enum GrimoireError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Rerank(#[from] RerankError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Provenance(#[from] ProvenanceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for GrimoireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl GrimoireError {
    /// Shorthand for a request-level validation failure.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Whether the error is a caller mistake rather than an internal failure.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. } | Self::Evaluation(EvaluationError::Disabled)
        )
    }
}

/// Result alias used across the workspace.
pub type GrimoireResult<T> = Result<T, GrimoireError>;
