//! End to end: a gallery session using `RemoteBackend` against a live server.
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use uuid::Uuid;

use gallery_api::auth::issue_token;
use gallery_api::{AppState, router};
use gallery_store::{
    GalleryError, GallerySession, LocalBackend, OwnerScope, PendingFile, RemoteBackend,
    ScopedObjectStore,
};

const SECRET: &str = "e2e-secret";

async fn serve() -> SocketAddr {
    let dir = std::env::temp_dir().join(format!("gallery_e2e_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let backend = LocalBackend::open(&dir.join("gallery.db"), dir.join("blobs"))
        .await
        .unwrap();
    let app = router(AppState {
        backend: Arc::new(backend),
        jwt_secret: SECRET.into(),
        max_upload_bytes: 1024 * 1024,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn session(addr: SocketAddr, owner: &str) -> GallerySession<RemoteBackend> {
    let scope = OwnerScope::new(owner);
    let token = issue_token(SECRET, &scope, 300).unwrap();
    let backend = RemoteBackend::new(format!("http://{addr}"), token);
    GallerySession::new(ScopedObjectStore::new(backend, "couples"), scope)
}

#[tokio::test]
async fn upload_list_delete_over_http() {
    let addr = serve().await;
    let mut alice = session(addr, "alice-bob");
    alice.load().await;
    assert!(alice.state().is_ready());

    let report = alice
        .upload(vec![
            PendingFile::new("one.jpg", Bytes::from_static(b"1")),
            PendingFile::new("two.png", Bytes::from_static(b"2")),
        ])
        .await;
    assert!(report.is_clean());
    assert_eq!(alice.state().assets().len(), 2);

    let mut carol = session(addr, "carol-dan");
    carol.load().await;
    assert!(carol.state().assets().is_empty());

    let id = alice.state().assets()[0].id.clone();
    let url = alice.view_url(&id).unwrap();
    assert!(url.starts_with(&format!("http://{addr}/containers/couples/objects/{id}/view?token=")));

    // The locator works as a bare image source: no Authorization header.
    let resp = reqwest::get(&url).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let expected: &[u8] = if alice.state().assets()[0].name == "one.jpg" { b"1" } else { b"2" };
    assert_eq!(&resp.bytes().await.unwrap()[..], expected);

    // Another couple cannot delete it: the service hides it from them.
    let stolen = carol.store().remove(carol.state().scope(), &id).await;
    assert!(matches!(stolen, Err(GalleryError::NotFound(_))));

    alice.delete(&id).await;
    assert_eq!(alice.state().assets().len(), 1);

    let again = alice.store().remove(alice.state().scope(), &id).await;
    assert!(matches!(again, Err(GalleryError::NotFound(_))));

    alice.refresh().await;
    assert_eq!(alice.state().assets().len(), 1);
}

#[tokio::test]
async fn invalid_token_is_store_unavailable() {
    let addr = serve().await;
    let backend = RemoteBackend::new(format!("http://{addr}"), "not-a-jwt");
    let store = ScopedObjectStore::new(backend, "couples");

    let err = store.list(&OwnerScope::new("alice-bob")).await.unwrap_err();
    assert!(matches!(err, GalleryError::StoreUnavailable(_)));
}
