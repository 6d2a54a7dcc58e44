use gallery_types::AssetId;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Everything a store call can report to the gallery.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// Missing owner scope or container. Fatal to the session.
    #[error("no bucket/scope configured: {0}")]
    Configuration(String),

    /// Transport or backend failure. Not retried automatically.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] BoxError),

    /// The target is already gone. Callers reconcile this as success.
    #[error("asset {0} not found")]
    NotFound(AssetId),

    /// A backend was asked to create an id it already holds. `put` never
    /// surfaces this; it only reaches callers of the backend directly.
    #[error("asset {0} already exists")]
    Conflict(AssetId),
}

impl GalleryError {
    pub fn unavailable(cause: impl Into<BoxError>) -> Self {
        Self::StoreUnavailable(cause.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T, E = GalleryError> = std::result::Result<T, E>;
