/// Ingestion artifact errors (graph snapshots, alias maps, chunk files).
///
/// These never escape a public loader: they are logged and turned into an
/// absent result.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {path}")]
    NotFound { path: String },

    #[error("malformed artifact {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("no ingestion job found for environment {environment}")]
    NoJob { environment: String },

    #[error("io error reading {path}: {reason}")]
    Io { path: String, reason: String },
}
