#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use bytes::Bytes;
use chrono::Utc;
use gallery_store::{Asset, AssetId, GalleryError, ObjectBackend, OwnerScope};

/// In-memory backend with failure injection and call counting.
///
/// Lists every object in a container regardless of reader tags, like a
/// backend whose own access check has been misconfigured.
#[derive(Default)]
pub struct MemoryBackend {
    objects: Mutex<Vec<(String, Asset)>>,
    failing_names: Mutex<HashSet<String>>,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object directly, bypassing the store.
    pub fn seed(&self, container: &str, name: &str, owner: &str) -> AssetId {
        let id = AssetId::generate();
        let asset = Asset {
            id: id.clone(),
            name: name.to_string(),
            scope_tags: [OwnerScope::new(owner)].into_iter().collect(),
            size: 0,
            created_at: Utc::now(),
        };
        self.objects.lock().unwrap().push((container.to_string(), asset));
        id
    }

    /// Make every create of a file with this name fail.
    pub fn fail_uploads_named(&self, name: &str) {
        self.failing_names.lock().unwrap().insert(name.to_string());
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stored_ids(&self) -> Vec<AssetId> {
        self.objects.lock().unwrap().iter().map(|(_, a)| a.id.clone()).collect()
    }

    fn enter(&self) -> Result<(), GalleryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(GalleryError::unavailable("backend offline"));
        }
        Ok(())
    }
}

impl ObjectBackend for MemoryBackend {
    async fn list_objects(&self, container: &str) -> Result<Vec<Asset>, GalleryError> {
        self.enter()?;
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == container)
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn create_object(
        &self,
        container: &str,
        id: &AssetId,
        name: &str,
        bytes: Bytes,
        readers: &[OwnerScope],
    ) -> Result<Asset, GalleryError> {
        self.enter()?;
        tokio::task::yield_now().await;
        if self.failing_names.lock().unwrap().contains(name) {
            return Err(GalleryError::unavailable(format!("injected failure for {name}")));
        }

        let asset = Asset {
            id: id.clone(),
            name: name.to_string(),
            scope_tags: readers.iter().cloned().collect(),
            size: bytes.len() as u64,
            created_at: Utc::now(),
        };
        self.objects.lock().unwrap().push((container.to_string(), asset.clone()));
        Ok(asset)
    }

    async fn delete_object(&self, container: &str, id: &AssetId) -> Result<(), GalleryError> {
        self.enter()?;
        let mut objects = self.objects.lock().unwrap();
        let before = objects.len();
        objects.retain(|(c, a)| !(c == container && &a.id == id));
        if objects.len() == before {
            return Err(GalleryError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn object_locator(&self, container: &str, id: &AssetId) -> String {
        format!("memory://{container}/{id}")
    }
}

pub fn scope(raw: &str) -> OwnerScope {
    OwnerScope::new(raw)
}
