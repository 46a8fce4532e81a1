/// Plan and evaluation cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache entry corrupt at {path}: {reason}")]
    CorruptEntry { path: String, reason: String },

    #[error("cache write failed for {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("cache read failed for {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("cache directory unavailable: {path}")]
    DirectoryUnavailable { path: String },
}
