use std::path::Path;

use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::FuturesUnordered;
use gallery_types::{Asset, OwnerScope};
use tracing::{info, warn};

use crate::backend::ObjectBackend;
use crate::error::GalleryError;
use crate::store::ScopedObjectStore;

/// A local file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub bytes: Bytes,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, named after its final path component.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }
}

#[derive(Debug)]
pub struct FailedUpload {
    pub name: String,
    pub error: GalleryError,
}

/// Outcome of one batch. Every submitted file ends up in exactly one list.
#[derive(Debug, Default)]
pub struct UploadReport {
    /// In the order the store confirmed them.
    pub succeeded: Vec<Asset>,
    pub failed: Vec<FailedUpload>,
}

impl UploadReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// One line covering every failed file, or `None` if nothing failed.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .failed
            .iter()
            .map(|f| format!("{} ({})", f.name, f.error))
            .collect();
        Some(format!(
            "{} of {} files failed: {}",
            self.failed.len(),
            self.failed.len() + self.succeeded.len(),
            parts.join("; ")
        ))
    }
}

/// Fans a batch of files out into concurrent `put`s.
pub struct UploadCoordinator<'a, B> {
    store: &'a ScopedObjectStore<B>,
}

impl<'a, B: ObjectBackend> UploadCoordinator<'a, B> {
    pub fn new(store: &'a ScopedObjectStore<B>) -> Self {
        Self { store }
    }

    /// Upload every file at once and wait for all of them to settle. A failure
    /// never cancels or short-circuits its siblings.
    pub async fn submit(&self, scope: &OwnerScope, files: Vec<PendingFile>) -> UploadReport {
        let mut report = UploadReport::default();
        if files.is_empty() {
            return report;
        }

        let submitted = files.len();
        let mut in_flight: FuturesUnordered<_> = files
            .into_iter()
            .map(|file| async move {
                let PendingFile { name, bytes } = file;
                let result = self.store.put(scope, bytes, &name).await;
                (name, result)
            })
            .collect();

        while let Some((name, result)) = in_flight.next().await {
            match result {
                Ok(asset) => report.succeeded.push(asset),
                Err(error) => {
                    warn!("Upload of {} failed: {}", name, error);
                    report.failed.push(FailedUpload { name, error });
                }
            }
        }

        info!(
            "Upload batch of {} finished: {} stored, {} failed",
            submitted,
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }
}
