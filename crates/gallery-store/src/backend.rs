use std::future::Future;

use bytes::Bytes;
use gallery_types::{Asset, AssetId, OwnerScope};

use crate::error::Result;

/// The remote blob service the gallery is stored in.
///
/// Implementations must make reader-tag assignment atomic with creation: an
/// object that fails to upload must never show up in `list_objects`.
/// Deleting a missing object reports [`GalleryError::NotFound`].
///
/// [`GalleryError::NotFound`]: crate::GalleryError::NotFound
pub trait ObjectBackend: Send + Sync {
    /// Every object in `container`, in creation order, reader tags included.
    fn list_objects(&self, container: &str) -> impl Future<Output = Result<Vec<Asset>>> + Send;

    fn create_object(
        &self,
        container: &str,
        id: &AssetId,
        name: &str,
        bytes: Bytes,
        readers: &[OwnerScope],
    ) -> impl Future<Output = Result<Asset>> + Send;

    fn delete_object(&self, container: &str, id: &AssetId) -> impl Future<Output = Result<()>> + Send;

    /// Locator a rendering surface can dereference. Performs no I/O and no
    /// access check.
    fn object_locator(&self, container: &str, id: &AssetId) -> String;
}
