/// Hybrid reranker errors.
#[derive(Debug, thiserror::Error)]
pub enum RerankError {
    #[error("signal extractor unavailable: {extractor}")]
    ExtractorUnavailable { extractor: String },

    #[error("invalid signal weights: {reason}")]
    InvalidWeights { reason: String },

    #[error("reranking deadline exceeded after {completed} of {total} candidates")]
    DeadlineExceeded { completed: usize, total: usize },
}
