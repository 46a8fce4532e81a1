/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("vector store unavailable: {reason}")]
    VectorStoreUnavailable { reason: String },

    #[error("vector store query failed: {reason}")]
    VectorStoreFailed { reason: String },

    #[error("lexical scan failed: {reason}")]
    ScanFailed { reason: String },

    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded { stage: String },
}
