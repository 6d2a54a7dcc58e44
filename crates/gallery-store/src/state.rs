use std::collections::HashSet;

use gallery_types::{Asset, AssetId, OwnerScope};
use tracing::{debug, warn};

use crate::error::GalleryError;
use crate::upload::UploadReport;

pub const MISSING_CONFIGURATION: &str = "No bucket or scope found. Please log out and log in again.";

/// Load phase of a gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Ready,
    Error(String),
}

/// Message shown above the gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    /// Persistent notices (missing configuration) cannot be dismissed.
    pub dismissible: bool,
}

impl Notice {
    fn transient(message: String) -> Self {
        Self {
            message,
            dismissible: true,
        }
    }

    fn persistent(message: String) -> Self {
        Self {
            message,
            dismissible: false,
        }
    }
}

/// Client-side projection of one owner's gallery plus fullscreen selection.
///
/// Holds two invariants at all times: no duplicate ids, and every asset is
/// readable by `scope`. The cursor is either `None` or a valid index.
#[derive(Debug)]
pub struct GalleryState {
    scope: OwnerScope,
    phase: Phase,
    assets: Vec<Asset>,
    cursor: Option<usize>,
    notice: Option<Notice>,
}

impl GalleryState {
    pub fn new(scope: OwnerScope) -> Self {
        Self {
            scope,
            phase: Phase::Loading,
            assets: Vec::new(),
            cursor: None,
            notice: None,
        }
    }

    pub fn scope(&self) -> &OwnerScope {
        &self.scope
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Clears the notice unless it is persistent.
    pub fn dismiss_notice(&mut self) {
        if self.notice.as_ref().is_some_and(|n| n.dismissible) {
            self.notice = None;
        }
    }

    // -- Store outcomes --

    /// Re-enter `Loading` ahead of a fresh listing.
    pub fn begin_loading(&mut self) {
        self.phase = Phase::Loading;
        self.cursor = None;
        self.dismiss_notice();
    }

    pub fn apply_listing(&mut self, listing: Result<Vec<Asset>, GalleryError>) {
        match listing {
            Ok(assets) => {
                self.assets.clear();
                let admitted = self.admit(assets);
                debug!("Gallery for {} ready with {} assets", self.scope, admitted);
                self.phase = Phase::Ready;
                self.notice = None;
            }
            Err(GalleryError::Configuration(detail)) => {
                warn!("Gallery misconfigured: {}", detail);
                self.assets.clear();
                self.phase = Phase::Error(MISSING_CONFIGURATION.to_string());
                self.notice = Some(Notice::persistent(MISSING_CONFIGURATION.to_string()));
            }
            Err(e) => {
                warn!("Loading gallery failed: {}", e);
                let message = format!("Failed to load images: {}", e);
                self.assets.clear();
                self.phase = Phase::Error(message.clone());
                self.notice = Some(Notice::transient(message));
            }
        }
        self.cursor = None;
    }

    /// Append whatever part of a batch succeeded, and report what failed.
    pub fn apply_upload(&mut self, report: &UploadReport) {
        if !self.is_ready() {
            warn!(
                "Dropping upload result of {} assets: gallery is not ready",
                report.succeeded.len()
            );
            return;
        }

        self.admit(report.succeeded.iter().cloned());
        if let Some(summary) = report.failure_summary() {
            self.set_notice(Notice::transient(format!("Failed to upload images: {}", summary)));
        }
    }

    pub fn apply_delete(&mut self, id: &AssetId, outcome: Result<(), GalleryError>) {
        match outcome {
            Ok(()) => self.remove(id),
            Err(GalleryError::NotFound(_)) => {
                debug!("Asset {} was already gone", id);
                self.remove(id);
            }
            Err(e) => {
                warn!("Deleting {} failed: {}", id, e);
                self.set_notice(Notice::transient(format!("Failed to delete image: {}", e)));
            }
        }
    }

    /// Surface a message without changing the collection.
    pub fn report(&mut self, message: impl Into<String>) {
        self.set_notice(Notice::transient(message.into()));
    }

    /// A persistent notice is only ever replaced by a new listing.
    fn set_notice(&mut self, notice: Notice) {
        if self.notice.as_ref().is_some_and(|n| !n.dismissible) {
            debug!("Keeping persistent notice over: {}", notice.message);
            return;
        }
        self.notice = Some(notice);
    }

    /// Push assets that pass the scope and uniqueness checks; returns how many did.
    fn admit(&mut self, incoming: impl IntoIterator<Item = Asset>) -> usize {
        let mut seen: HashSet<AssetId> = self.assets.iter().map(|a| a.id.clone()).collect();
        let mut admitted = 0;
        for asset in incoming {
            if !asset.is_visible_to(&self.scope) {
                warn!("Rejecting {}: not tagged for {}", asset.id, self.scope);
                continue;
            }
            if !seen.insert(asset.id.clone()) {
                debug!("Skipping duplicate asset {}", asset.id);
                continue;
            }
            self.assets.push(asset);
            admitted += 1;
        }
        admitted
    }

    fn remove(&mut self, id: &AssetId) {
        let Some(pos) = self.assets.iter().position(|a| &a.id == id) else {
            return;
        };
        self.assets.remove(pos);

        // Deleting the asset in view closes fullscreen; deleting one before it
        // keeps the same asset in view.
        self.cursor = match self.cursor {
            Some(c) if c == pos => None,
            Some(c) if c > pos => Some(c - 1),
            other => other,
        };
        if self.cursor.is_some_and(|c| c >= self.assets.len()) {
            self.cursor = None;
        }
    }

    // -- Fullscreen cursor --

    /// Enter fullscreen on `index`. Out-of-range indexes are ignored.
    pub fn open(&mut self, index: usize) -> bool {
        if !self.is_ready() || index >= self.assets.len() {
            return false;
        }
        self.cursor = Some(index);
        true
    }

    pub fn close(&mut self) {
        self.cursor = None;
    }

    pub fn next(&mut self) {
        let len = self.assets.len();
        if let Some(c) = self.cursor.as_mut() {
            if len > 0 {
                *c = (*c + 1) % len;
            }
        }
    }

    pub fn previous(&mut self) {
        let len = self.assets.len();
        if let Some(c) = self.cursor.as_mut() {
            if len > 0 {
                *c = if *c == 0 { len - 1 } else { *c - 1 };
            }
        }
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_fullscreen(&self) -> bool {
        self.cursor.is_some()
    }

    /// Asset under the cursor.
    pub fn current(&self) -> Option<&Asset> {
        self.cursor.and_then(|c| self.assets.get(c))
    }

    /// One-based position and total, for "3 / 12" style counters.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.cursor.map(|c| (c + 1, self.assets.len()))
    }
}
