mod cleanup;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{Method, header::{AUTHORIZATION, CONTENT_TYPE}};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use gallery_api::AppState;
use gallery_store::LocalBackend;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "gallery_server=debug,gallery_api=debug,gallery_store=info,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let jwt_secret = std::env::var("GALLERY_JWT_SECRET").unwrap_or_default();
    if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
        eprintln!("FATAL: GALLERY_JWT_SECRET is unset or still a placeholder.");
        eprintln!("       Sessions are scoped by the `sub` claim of tokens signed with it.");
        eprintln!("       Set it in your .env file and restart.");
        std::process::exit(1);
    }

    let host = std::env::var("GALLERY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("GALLERY_PORT")
        .unwrap_or_else(|_| "3220".into())
        .parse()?;
    let storage_dir: PathBuf = std::env::var("GALLERY_STORAGE_DIR")
        .unwrap_or_else(|_| "./gallery-storage".into())
        .into();
    let db_path: PathBuf = std::env::var("GALLERY_DB_PATH")
        .unwrap_or_else(|_| "gallery.db".into())
        .into();
    let max_upload_mb: usize = std::env::var("GALLERY_MAX_UPLOAD_MB")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(50);
    let cleanup_interval_secs: u64 = std::env::var("GALLERY_CLEANUP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);

    // Init catalog and blob storage
    let backend = Arc::new(LocalBackend::open(&db_path, storage_dir).await?);

    tokio::spawn(cleanup::run_cleanup_loop(backend.clone(), cleanup_interval_secs));

    let state = AppState {
        backend,
        jwt_secret,
        max_upload_bytes: max_upload_mb * 1024 * 1024,
    };

    // CORS: browsers render view URLs and upload from the gallery page's origin
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(false);

    let app = gallery_api::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gallery server listening on {}", addr);
    info!("Upload limit: {} MB, orphan cleanup every {}s", max_upload_mb, cleanup_interval_secs);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!("SIGTERM handler unavailable: {}", e);
                    ctrl_c.await.ok();
                    info!("Received Ctrl+C, shutting down...");
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
