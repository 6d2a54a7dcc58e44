mod common;

use std::collections::HashSet;

use bytes::Bytes;
use common::{MemoryBackend, scope};
use gallery_store::state::MISSING_CONFIGURATION;
use gallery_store::{
    AssetId, GalleryError, GallerySession, PendingFile, Phase, ScopedObjectStore,
    UploadCoordinator,
};

const BUCKET: &str = "couples";

fn session_for(owner: &str, backend: MemoryBackend) -> GallerySession<MemoryBackend> {
    GallerySession::new(ScopedObjectStore::new(backend, BUCKET), scope(owner))
}

fn files(names: &[&str]) -> Vec<PendingFile> {
    names
        .iter()
        .map(|n| PendingFile::new(*n, Bytes::from(n.as_bytes().to_vec())))
        .collect()
}

#[tokio::test]
async fn listing_never_leaks_other_scopes() {
    let backend = MemoryBackend::new();
    backend.seed(BUCKET, "ours-1.jpg", "alice-bob");
    backend.seed(BUCKET, "theirs.jpg", "carol-dan");
    backend.seed(BUCKET, "ours-2.jpg", "alice-bob");
    backend.seed("elsewhere", "ours-3.jpg", "alice-bob");

    let store = ScopedObjectStore::new(backend, BUCKET);
    let ours = store.list(&scope("alice-bob")).await.unwrap();
    let names: Vec<_> = ours.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["ours-1.jpg", "ours-2.jpg"]);
    assert!(ours.iter().all(|a| a.is_visible_to(&scope("alice-bob"))));

    let theirs = store.list(&scope("carol-dan")).await.unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].name, "theirs.jpg");
}

#[tokio::test]
async fn put_then_list_contains_asset_exactly_once() {
    let store = ScopedObjectStore::new(MemoryBackend::new(), BUCKET);
    let owner = scope("alice-bob");

    let asset = store.put(&owner, Bytes::from_static(b"img"), "beach.jpg").await.unwrap();
    assert_eq!(asset.scope_tags.len(), 1);
    assert!(asset.is_visible_to(&owner));

    let listed = store.list(&owner).await.unwrap();
    assert_eq!(listed.iter().filter(|a| a.id == asset.id).count(), 1);
    assert!(store.list(&scope("carol-dan")).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_twice_yields_not_found_without_mutation() {
    let backend = MemoryBackend::new();
    let keep = backend.seed(BUCKET, "keep.jpg", "alice-bob");
    let gone = backend.seed(BUCKET, "gone.jpg", "alice-bob");

    let mut session = session_for("alice-bob", backend);
    session.load().await;

    session.delete(&gone).await;
    let listed = session.store().list(&scope("alice-bob")).await.unwrap();
    assert!(listed.iter().all(|a| a.id != gone));

    let second = session.store().remove(&scope("alice-bob"), &gone).await;
    assert!(matches!(second, Err(GalleryError::NotFound(_))));

    session.delete(&gone).await;
    assert_eq!(session.state().assets().len(), 1);
    assert_eq!(session.state().assets()[0].id, keep);
    assert!(session.state().notice().is_none());
}

#[tokio::test]
async fn partial_batch_failure_keeps_successes() {
    let backend = MemoryBackend::new();
    backend.seed(BUCKET, "existing.jpg", "alice-bob");
    backend.fail_uploads_named("2.jpg");

    let mut session = session_for("alice-bob", backend);
    session.load().await;
    assert_eq!(session.state().assets().len(), 1);

    let report = session.upload(files(&["1.jpg", "2.jpg", "3.jpg"])).await;

    let succeeded: HashSet<_> = report.succeeded.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(succeeded, HashSet::from(["1.jpg", "3.jpg"]));
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "2.jpg");
    assert!(matches!(report.failed[0].error, GalleryError::StoreUnavailable(_)));

    let state = session.state();
    assert_eq!(state.assets().len(), 3);
    assert_eq!(state.assets()[0].name, "existing.jpg");
    let notice = state.notice().unwrap();
    assert!(notice.dismissible);
    assert!(notice.message.starts_with("Failed to upload images"));
    assert!(notice.message.contains("2.jpg"));
}

#[tokio::test]
async fn every_file_is_attempted_even_when_all_fail() {
    let backend = MemoryBackend::new();
    backend.set_offline(true);
    let store = ScopedObjectStore::new(backend, BUCKET);

    let report = UploadCoordinator::new(&store)
        .submit(&scope("alice-bob"), files(&["a.jpg", "b.jpg", "c.jpg"]))
        .await;

    assert!(report.succeeded.is_empty());
    assert_eq!(report.failed.len(), 3);
    assert_eq!(store.backend().calls(), 3);
}

#[tokio::test]
async fn cursor_wraps_around_the_collection() {
    let backend = MemoryBackend::new();
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        backend.seed(BUCKET, name, "alice-bob");
    }
    let mut session = session_for("alice-bob", backend);
    session.load().await;

    assert!(session.open(2));
    session.next();
    assert_eq!(session.state().cursor(), Some(0));

    session.previous();
    assert_eq!(session.state().cursor(), Some(2));
    assert_eq!(session.state().position(), Some((3, 3)));

    session.close();
    assert!(!session.state().is_fullscreen());
}

#[tokio::test]
async fn deleting_only_viewed_asset_closes_fullscreen() {
    let backend = MemoryBackend::new();
    let only = backend.seed(BUCKET, "only.jpg", "alice-bob");
    let mut session = session_for("alice-bob", backend);
    session.load().await;

    assert!(session.open(0));
    session.delete(&only).await;

    assert_eq!(session.state().cursor(), None);
    assert!(session.state().assets().is_empty());
    assert_eq!(session.state().current(), None);
}

#[tokio::test]
async fn empty_scope_fails_before_reaching_backend() {
    let mut session = session_for("", MemoryBackend::new());
    session.load().await;

    assert!(matches!(session.state().phase(), Phase::Error(_)));
    assert!(!session.state().notice().unwrap().dismissible);
    assert_eq!(session.store().backend().calls(), 0);

    let direct = session.store().list(&scope("  ")).await;
    assert!(matches!(direct, Err(GalleryError::Configuration(_))));
    assert_eq!(session.store().backend().calls(), 0);
}

#[tokio::test]
async fn missing_configuration_banner_survives_clicks() {
    let mut session = session_for("", MemoryBackend::new());
    session.load().await;

    session.delete(&AssetId::generate()).await;
    session.dismiss_notice();
    session.upload(files(&["a.jpg"])).await;
    session.dismiss_notice();

    let notice = session.state().notice().unwrap();
    assert_eq!(notice.message, MISSING_CONFIGURATION);
    assert!(!notice.dismissible);
    assert_eq!(session.store().backend().calls(), 0);
}

#[tokio::test]
async fn failed_delete_keeps_asset_and_surfaces_error() {
    let backend = MemoryBackend::new();
    let id = backend.seed(BUCKET, "a.jpg", "alice-bob");
    let mut session = session_for("alice-bob", backend);
    session.load().await;

    session.store().backend().set_offline(true);
    session.delete(&id).await;

    assert_eq!(session.state().assets().len(), 1);
    assert!(session.state().notice().unwrap().message.starts_with("Failed to delete image"));

    session.store().backend().set_offline(false);
    session.delete(&id).await;
    assert!(session.state().assets().is_empty());
    assert!(session.state().notice().is_none());
}

#[tokio::test]
async fn upload_before_load_never_calls_store() {
    let mut session = session_for("alice-bob", MemoryBackend::new());

    let report = session.upload(files(&["a.jpg"])).await;
    assert!(report.succeeded.is_empty() && report.failed.is_empty());
    assert_eq!(session.store().backend().calls(), 0);
    assert!(session.state().notice().is_some());
}

#[tokio::test]
async fn refresh_picks_up_store_side_changes() {
    let mut session = session_for("alice-bob", MemoryBackend::new());
    session.load().await;
    assert!(session.state().assets().is_empty());

    session.store().backend().seed(BUCKET, "from-elsewhere.jpg", "alice-bob");
    session.refresh().await;
    assert_eq!(session.state().assets().len(), 1);
}

#[tokio::test]
async fn view_url_only_for_collection_members() {
    let backend = MemoryBackend::new();
    let ours = backend.seed(BUCKET, "ours.jpg", "alice-bob");
    let theirs = backend.seed(BUCKET, "theirs.jpg", "carol-dan");
    let mut session = session_for("alice-bob", backend);
    session.load().await;

    assert_eq!(
        session.view_url(&ours),
        Some(format!("memory://{BUCKET}/{ours}"))
    );
    assert_eq!(session.view_url(&theirs), None);
}
