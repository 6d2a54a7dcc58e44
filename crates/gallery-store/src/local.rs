use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use gallery_db::Database;
use gallery_db::models::AssetRow;
use gallery_types::{Asset, AssetId, OwnerScope};
use tracing::{info, warn};

use crate::backend::ObjectBackend;
use crate::blob::{BlobEntry, BlobStorage};
use crate::error::{GalleryError, Result};

/// Backend over a SQLite catalog and a flat blob directory.
///
/// This is what the HTTP service serves from, and what an embedded
/// single-process gallery can use directly. It has no notion of the caller,
/// so it performs no ownership check on delete.
pub struct LocalBackend {
    db: Arc<Database>,
    blobs: BlobStorage,
}

impl LocalBackend {
    pub async fn open(db_path: &Path, storage_dir: PathBuf) -> anyhow::Result<Self> {
        let db = Database::open(db_path)?;
        Self::new(db, storage_dir).await
    }

    pub async fn new(db: Database, storage_dir: PathBuf) -> anyhow::Result<Self> {
        let blobs = BlobStorage::new(storage_dir).await?;
        Ok(Self {
            db: Arc::new(db),
            blobs,
        })
    }

    /// Catalog entry and blob path of one object, if it exists.
    pub async fn open_object(&self, container: &str, id: &AssetId) -> Result<Option<(Asset, PathBuf)>> {
        let (container, key) = (container.to_string(), id.to_string());
        let row = self.with_db(move |db| db.get_asset(&container, &key)).await?;
        match row {
            Some(row) => {
                let asset = row_to_asset(&row).map_err(GalleryError::unavailable)?;
                Ok(Some((asset, self.blobs.blob_path(id.as_str()))))
            }
            None => Ok(None),
        }
    }

    /// Remove blobs that have no catalog row, and staging files older than
    /// `staging_grace`. Returns how many files were removed.
    pub async fn prune_orphans(&self, staging_grace: Duration) -> anyhow::Result<usize> {
        // Scan before reading the catalog: a blob published after the scan is
        // not seen, and one published before it is already committed.
        let entries = self.blobs.entries().await?;
        let db = self.db.clone();
        let known = tokio::task::spawn_blocking(move || db.asset_ids()).await??;

        let mut removed = 0;
        for entry in entries {
            match entry {
                BlobEntry::Published(id) if !known.contains(&id) => {
                    if self.blobs.delete(&id).await? {
                        removed += 1;
                    }
                }
                BlobEntry::Staged { id, age } if age >= staging_grace => {
                    self.blobs.remove_staged(&id).await?;
                    removed += 1;
                }
                _ => {}
            }
        }
        Ok(removed)
    }

    async fn with_db<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(GalleryError::unavailable)?
            .map_err(GalleryError::unavailable)
    }
}

impl ObjectBackend for LocalBackend {
    async fn list_objects(&self, container: &str) -> Result<Vec<Asset>> {
        let container = container.to_string();
        let rows = self.with_db(move |db| db.list_assets(&container)).await?;
        rows.iter()
            .map(row_to_asset)
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(GalleryError::unavailable)
    }

    async fn create_object(
        &self,
        container: &str,
        id: &AssetId,
        name: &str,
        bytes: Bytes,
        readers: &[OwnerScope],
    ) -> Result<Asset> {
        if readers.is_empty() {
            return Err(GalleryError::unavailable("object must have at least one reader"));
        }

        let key = id.as_str();
        let sha256 = self.blobs.stage(key, &bytes).await.map_err(GalleryError::unavailable)?;

        let readers: BTreeSet<&str> = readers.iter().map(OwnerScope::as_str).collect();
        let row = AssetRow {
            id: key.to_string(),
            container: container.to_string(),
            name: name.to_string(),
            size: bytes.len() as i64,
            sha256,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            readers: readers.into_iter().map(str::to_string).collect(),
        };

        // The rename happens inside the catalog transaction, on the blocking
        // pool. Once started it runs to completion even if this future is
        // dropped, so the row and the published blob appear together or not
        // at all. An abandoned `.part` file is left for `prune_orphans`.
        let insert = row.clone();
        let blobs = self.blobs.clone();
        let inserted = self
            .with_db(move |db| db.insert_asset_with(&insert, || blobs.publish_blocking(&insert.id)))
            .await;
        match inserted {
            Ok(true) => {}
            Ok(false) => {
                self.blobs.discard_staged(key).await;
                return Err(GalleryError::Conflict(id.clone()));
            }
            Err(e) => {
                warn!("Storing {} failed, catalog rolled back: {}", id, e);
                self.blobs.discard_staged(key).await;
                return Err(e);
            }
        }

        info!("Stored {} ({} bytes) in {}", id, row.size, row.container);
        row_to_asset(&row).map_err(GalleryError::unavailable)
    }

    async fn delete_object(&self, container: &str, id: &AssetId) -> Result<()> {
        let (owned_container, key) = (container.to_string(), id.to_string());
        let deleted = self
            .with_db(move |db| db.delete_asset(&owned_container, &key))
            .await?;
        if !deleted {
            return Err(GalleryError::NotFound(id.clone()));
        }

        // The row is gone, so the object is already invisible. A blob left
        // behind here is collected by `prune_orphans`.
        if let Err(e) = self.blobs.delete(id.as_str()).await {
            warn!("Failed to delete blob {}: {}", id, e);
        }
        info!("Deleted {} from {}", id, container);
        Ok(())
    }

    fn object_locator(&self, _container: &str, id: &AssetId) -> String {
        format!("file://{}", self.blobs.blob_path(id.as_str()).display())
    }
}

fn row_to_asset(row: &AssetRow) -> anyhow::Result<Asset> {
    Ok(Asset {
        id: AssetId::new(row.id.clone()),
        name: row.name.clone(),
        scope_tags: row.readers.iter().map(|r| OwnerScope::new(r.clone())).collect(),
        size: u64::try_from(row.size)?,
        created_at: DateTime::parse_from_rfc3339(&row.created_at)?.with_timezone(&Utc),
    })
}
