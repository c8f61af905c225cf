use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobShardError {
    // IO
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Config
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration file not found at {0}, run `blobshard init` first")]
    ConfigNotFound(String),

    #[error("Invalid location mode: {0}")]
    InvalidLocationMode(String),

    #[error("Invalid routing hash: {0}")]
    InvalidRoutingHash(String),

    // Storage client
    #[error("Invalid blob address: {0}")]
    Address(String),

    #[error("Storage service error: {0}")]
    Service(String),

    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    // Serialization
    #[error("TOML deserialization error: {0}")]
    TomlDe(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),
}

pub type Result<T> = std::result::Result<T, BlobShardError>;
