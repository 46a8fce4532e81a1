/// Provenance tracking errors.
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("bundle {session_id} is already finalized")]
    AlreadyFinalized { session_id: String },

    #[error("tracking of stage {stage} failed: {reason}")]
    StageFailed { stage: String, reason: String },

    #[error("provenance export failed: {reason}")]
    ExportFailed { reason: String },
}
