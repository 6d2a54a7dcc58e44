use gallery_types::{AssetId, OwnerScope};
use tracing::info;

use crate::backend::ObjectBackend;
use crate::state::GalleryState;
use crate::store::ScopedObjectStore;
use crate::upload::{PendingFile, UploadCoordinator, UploadReport};

/// One signed-in owner browsing their gallery.
///
/// Every mutating call takes `&mut self`, so state transitions are applied
/// one at a time after the store call they depend on has settled. Store
/// failures end up in [`GalleryState`], never in a returned error.
pub struct GallerySession<B> {
    store: ScopedObjectStore<B>,
    state: GalleryState,
}

impl<B: ObjectBackend> GallerySession<B> {
    pub fn new(store: ScopedObjectStore<B>, scope: OwnerScope) -> Self {
        Self {
            store,
            state: GalleryState::new(scope),
        }
    }

    pub fn state(&self) -> &GalleryState {
        &self.state
    }

    pub fn store(&self) -> &ScopedObjectStore<B> {
        &self.store
    }

    /// Initial listing. Same as [`Self::refresh`].
    pub async fn load(&mut self) {
        self.refresh().await;
    }

    /// Replace the collection with the store's authoritative listing.
    pub async fn refresh(&mut self) {
        self.state.begin_loading();
        let listing = self.store.list(self.state.scope()).await;
        self.state.apply_listing(listing);
    }

    /// Upload a batch and append whatever succeeded.
    pub async fn upload(&mut self, files: Vec<PendingFile>) -> UploadReport {
        if files.is_empty() {
            return UploadReport::default();
        }
        if !self.state.is_ready() {
            self.state.report("Images can only be uploaded once the gallery has loaded.");
            return UploadReport::default();
        }

        self.state.dismiss_notice();
        info!("Uploading {} files for {}", files.len(), self.state.scope());
        let report = UploadCoordinator::new(&self.store)
            .submit(self.state.scope(), files)
            .await;
        self.state.apply_upload(&report);
        report
    }

    pub async fn delete(&mut self, id: &AssetId) {
        if !self.state.is_ready() {
            self.state.report("Images can only be deleted once the gallery has loaded.");
            return;
        }

        self.state.dismiss_notice();
        let outcome = self.store.remove(self.state.scope(), id).await;
        self.state.apply_delete(id, outcome);
    }

    /// Locator for an asset currently in the collection.
    pub fn view_url(&self, id: &AssetId) -> Option<String> {
        if !self.state.assets().iter().any(|a| &a.id == id) {
            return None;
        }
        self.store.view_url(self.state.scope(), id).ok()
    }

    // -- Fullscreen navigation --

    pub fn open(&mut self, index: usize) -> bool {
        self.state.open(index)
    }

    pub fn next(&mut self) {
        self.state.next();
    }

    pub fn previous(&mut self) {
        self.state.previous();
    }

    pub fn close(&mut self) {
        self.state.close();
    }

    pub fn dismiss_notice(&mut self) {
        self.state.dismiss_notice();
    }
}
