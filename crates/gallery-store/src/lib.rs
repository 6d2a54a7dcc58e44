//! Owner-scoped image storage and the client-side gallery session built on it.
//!
//! Leaf first: [`ObjectBackend`] is the remote blob service, [`ScopedObjectStore`]
//! tags every write and filters every read by [`OwnerScope`], [`UploadCoordinator`]
//! fans a batch out into concurrent puts, [`GalleryState`] is the reducer the
//! rendering surface reads, and [`GallerySession`] drives them together.

pub mod backend;
pub mod blob;
pub mod error;
pub mod local;
pub mod remote;
pub mod session;
pub mod state;
pub mod store;
pub mod upload;

pub use backend::ObjectBackend;
pub use error::GalleryError;
pub use local::LocalBackend;
pub use remote::RemoteBackend;
pub use session::GallerySession;
pub use state::{GalleryState, Notice, Phase};
pub use store::{ScopedObjectStore, StoreOptions};
pub use upload::{FailedUpload, PendingFile, UploadCoordinator, UploadReport};

pub use gallery_types::{Asset, AssetId, OwnerScope};
