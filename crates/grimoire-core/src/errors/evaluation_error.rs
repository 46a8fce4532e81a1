/// Evaluation gate errors.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    #[error("evaluation is disabled")]
    Disabled,

    #[error("evaluation timed out after {elapsed_ms}ms (budget {budget_ms}ms)")]
    Timeout { elapsed_ms: u64, budget_ms: u64 },

    #[error("metric {metric} produced an invalid value")]
    InvalidMetric { metric: String },

    #[error("scoring failed: {reason}")]
    ScoringFailed { reason: String },
}
