use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Store failures are fatal for the event being processed; the reconciler
/// never retries them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open database `{path}`: {reason}")]
    Open { path: String, reason: String },
    #[error("{context} failed: {reason}")]
    Query {
        context: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed `{signature}` log: {reason}")]
    MalformedLog {
        signature: &'static str,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required configuration: {0}")]
    Missing(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
