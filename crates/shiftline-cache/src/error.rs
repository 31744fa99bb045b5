use thiserror::Error;

/// Errors that can occur within the time-window cache.
///
/// Unreadable payloads are not errors: they read back as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A payload could not be serialized for writing.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The cache directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CacheError>;
