use shiftline_cache::CacheError;
use shiftline_core::ShiftlineError;
use thiserror::Error;

/// Errors surfaced by the schedule service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No employee is signed in.
    #[error("not signed in")]
    NotSignedIn,

    /// A remote call failed (network, auth, bad response).
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Core(#[from] ShiftlineError),
}

impl ServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotSignedIn => "NOT_SIGNED_IN",
            ServiceError::Upstream(_) => "UPSTREAM_ERROR",
            ServiceError::Cache(_) => "CACHE_ERROR",
            ServiceError::Core(e) => e.code(),
        }
    }

    /// Whether the failure came from the remote side; the cached view is
    /// still usable in that case.
    pub fn is_upstream(&self) -> bool {
        matches!(self, ServiceError::Upstream(_))
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
