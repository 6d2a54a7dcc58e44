use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use gallery_types::{Asset, AssetId, OwnerScope};
use tracing::{debug, warn};

use crate::backend::ObjectBackend;
use crate::error::{GalleryError, Result};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Upper bound on every backend call. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Owner-partitioned view of one container in the backing store.
///
/// Every write is tagged with exactly the caller's scope, and every listing is
/// filtered to that scope here even though the backend is expected to do the
/// same.
pub struct ScopedObjectStore<B> {
    backend: B,
    container: String,
    options: StoreOptions,
}

impl<B: ObjectBackend> ScopedObjectStore<B> {
    pub fn new(backend: B, container: impl Into<String>) -> Self {
        Self::with_options(backend, container, StoreOptions::default())
    }

    pub fn with_options(backend: B, container: impl Into<String>, options: StoreOptions) -> Self {
        Self {
            backend,
            container: container.into(),
            options,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Assets in the container readable by `scope`, in listing order.
    pub async fn list(&self, scope: &OwnerScope) -> Result<Vec<Asset>> {
        self.require_configured(scope)?;

        let all = self.call(self.backend.list_objects(&self.container)).await?;
        let total = all.len();
        let visible: Vec<Asset> = all.into_iter().filter(|a| a.is_visible_to(scope)).collect();
        if visible.len() < total {
            debug!(
                "Filtered {} of {} objects in {} not readable by {}",
                total - visible.len(),
                total,
                self.container,
                scope
            );
        }
        Ok(visible)
    }

    /// Store `bytes` as a new asset readable only by `scope`.
    pub async fn put(&self, scope: &OwnerScope, bytes: Bytes, name: &str) -> Result<Asset> {
        self.require_configured(scope)?;

        let id = AssetId::generate();
        let readers = std::slice::from_ref(scope);
        let asset = match self
            .call(self.backend.create_object(&self.container, &id, name, bytes, readers))
            .await
        {
            Ok(asset) => asset,
            Err(GalleryError::Conflict(id)) => {
                return Err(GalleryError::unavailable(format!("generated id {} already taken", id)));
            }
            Err(e) => return Err(e),
        };

        if !asset.is_visible_to(scope) {
            warn!("Backend returned {} without the owner tag for {}", asset.id, scope);
            return Err(GalleryError::unavailable(format!(
                "backend stored {} without the owner tag",
                asset.id
            )));
        }
        Ok(asset)
    }

    /// Delete an asset. Ownership is left to the backend's own access check.
    pub async fn remove(&self, scope: &OwnerScope, id: &AssetId) -> Result<()> {
        self.require_configured(scope)?;
        self.call(self.backend.delete_object(&self.container, id)).await
    }

    /// Locator for rendering. Only pass ids that came out of [`Self::list`]
    /// or [`Self::put`]; no scope check happens here.
    pub fn view_url(&self, scope: &OwnerScope, id: &AssetId) -> Result<String> {
        self.require_configured(scope)?;
        Ok(self.backend.object_locator(&self.container, id))
    }

    fn require_configured(&self, scope: &OwnerScope) -> Result<()> {
        if self.container.trim().is_empty() {
            return Err(GalleryError::Configuration("no container id".into()));
        }
        if scope.is_blank() {
            return Err(GalleryError::Configuration("no owner scope".into()));
        }
        Ok(())
    }

    async fn call<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.options.request_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(GalleryError::unavailable)?,
            None => fut.await,
        }
    }
}
