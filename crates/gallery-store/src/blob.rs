use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const STAGING_SUFFIX: &str = ".part";

/// On-disk blob storage for the local backend.
///
/// Each object lives in one flat file at `{dir}/{id}`. Uploads are written to
/// `{dir}/{id}.part` first and renamed into place inside the catalog
/// transaction that records them, so a listed object always has its blob.
#[derive(Clone)]
pub struct BlobStorage {
    dir: PathBuf,
}

/// A file found in the storage directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobEntry {
    Published(String),
    Staged { id: String, age: Duration },
}

impl BlobStorage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Blob storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the published blob for an object.
    pub fn blob_path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    fn staging_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}{STAGING_SUFFIX}"))
    }

    /// Write bytes to the staging file. Returns the SHA-256 of the content.
    pub async fn stage(&self, id: &str, data: &[u8]) -> Result<String> {
        let path = self.staging_path(id);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        let digest = hex::encode(Sha256::digest(data));
        debug!("Staged {} bytes for {} (sha256 {})", data.len(), id, digest);
        Ok(digest)
    }

    /// Move a staged blob into place. Blocking; called from inside a catalog
    /// transaction on the blocking pool.
    pub fn publish_blocking(&self, id: &str) -> Result<()> {
        std::fs::rename(self.staging_path(id), self.blob_path(id))?;
        Ok(())
    }

    /// Drop a staged blob; missing is fine.
    pub async fn discard_staged(&self, id: &str) {
        if let Err(e) = fs::remove_file(self.staging_path(id)).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to discard staged blob {}: {}", id, e);
            }
        }
    }

    /// Delete a published blob. Returns `false` if it was already gone.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        match fs::remove_file(self.blob_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Blob {} already gone", id);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every published and staged blob in the directory.
    pub async fn entries(&self) -> Result<Vec<BlobEntry>> {
        let mut dir = fs::read_dir(&self.dir).await?;
        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            match name.strip_suffix(STAGING_SUFFIX) {
                Some(id) => {
                    let modified = entry.metadata().await?.modified()?;
                    let age = SystemTime::now()
                        .duration_since(modified)
                        .unwrap_or_default();
                    entries.push(BlobEntry::Staged { id: id.to_string(), age });
                }
                None => entries.push(BlobEntry::Published(name)),
            }
        }
        Ok(entries)
    }

    pub async fn remove_staged(&self, id: &str) -> Result<()> {
        fs::remove_file(self.staging_path(id)).await?;
        Ok(())
    }
}
