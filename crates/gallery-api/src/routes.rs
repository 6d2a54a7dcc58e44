use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use uuid::Uuid;

use gallery_store::{GalleryError, LocalBackend, ObjectBackend};
use gallery_types::api::{Claims, CreateObjectQuery, ListObjectsResponse, ViewQuery};
use gallery_types::{Asset, AssetId};

use crate::auth::{extract_claims, extract_view_claims};

/// Shared application state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<LocalBackend>,
    pub jwt_secret: String,
    pub max_upload_bytes: usize,
}

// ── Validation helpers ──────────────────────────────────────────────────

fn check_container(container: &str) -> Result<(), StatusCode> {
    let valid = !container.is_empty()
        && container.len() <= 64
        && container
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid { Ok(()) } else { Err(StatusCode::BAD_REQUEST) }
}

/// Object ids are UUIDs; this also keeps them safe as file names.
fn parse_object_id(raw: &str) -> Result<AssetId, StatusCode> {
    raw.parse::<Uuid>().map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok(AssetId::new(raw))
}

fn store_failure(action: &str, e: GalleryError) -> StatusCode {
    match e {
        GalleryError::NotFound(_) => StatusCode::NOT_FOUND,
        GalleryError::Conflict(_) => StatusCode::CONFLICT,
        GalleryError::Configuration(_) => StatusCode::BAD_REQUEST,
        GalleryError::StoreUnavailable(_) => {
            warn!("Failed to {}: {}", action, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// The object if it exists and the caller may read it. Invisible objects are
/// reported exactly like missing ones.
async fn visible_object(
    state: &AppState,
    claims: &Claims,
    container: &str,
    id: &AssetId,
) -> Result<(Asset, std::path::PathBuf), StatusCode> {
    let found = state
        .backend
        .open_object(container, id)
        .await
        .map_err(|e| store_failure("look up object", e))?;
    match found {
        Some((asset, path)) if asset.is_visible_to(&claims.scope()) => Ok((asset, path)),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

// ── Handlers ────────────────────────────────────────────────────────────

/// GET /containers/{container}/objects — objects readable by the caller.
pub async fn list_objects(
    State(state): State<AppState>,
    Path(container): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ListObjectsResponse>, StatusCode> {
    let claims = extract_claims(&headers, &state.jwt_secret)?;
    check_container(&container)?;

    let scope = claims.scope();
    let objects: Vec<Asset> = state
        .backend
        .list_objects(&container)
        .await
        .map_err(|e| store_failure("list objects", e))?
        .into_iter()
        .filter(|a| a.is_visible_to(&scope))
        .collect();

    Ok(Json(ListObjectsResponse {
        total: objects.len(),
        objects,
    }))
}

/// POST /containers/{container}/objects/{id}?name=..&readers=.. — raw bytes in,
/// created object out. Callers may only tag objects with their own scope.
pub async fn create_object(
    State(state): State<AppState>,
    Path((container, id)): Path<(String, String)>,
    Query(query): Query<CreateObjectQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, StatusCode> {
    let claims = extract_claims(&headers, &state.jwt_secret)?;
    check_container(&container)?;
    let id = parse_object_id(&id)?;

    if body.is_empty() || query.name.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    if body.len() > state.max_upload_bytes {
        return Err(StatusCode::PAYLOAD_TOO_LARGE);
    }

    let scope = claims.scope();
    let readers = query.reader_scopes();
    if readers.is_empty() || readers.iter().any(|r| r != &scope) {
        warn!("{} tried to tag {} with readers {:?}", scope, id, query.readers);
        return Err(StatusCode::FORBIDDEN);
    }

    let asset = state
        .backend
        .create_object(&container, &id, &query.name, body, &readers)
        .await
        .map_err(|e| store_failure("create object", e))?;

    info!("Object {} ({} bytes) created by {}", asset.id, asset.size, scope);
    Ok((StatusCode::CREATED, Json(asset)))
}

/// DELETE /containers/{container}/objects/{id} — readers of an object may delete it.
pub async fn delete_object(
    State(state): State<AppState>,
    Path((container, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    let claims = extract_claims(&headers, &state.jwt_secret)?;
    check_container(&container)?;
    let id = parse_object_id(&id)?;

    visible_object(&state, &claims, &container, &id).await?;
    state
        .backend
        .delete_object(&container, &id)
        .await
        .map_err(|e| store_failure("delete object", e))?;

    info!("Object {} deleted by {}", id, claims.sub);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /containers/{container}/objects/{id}/view — streams the object bytes.
/// Accepts `?token=` so the URL works as a plain image source.
pub async fn view_object(
    State(state): State<AppState>,
    Path((container, id)): Path<(String, String)>,
    Query(query): Query<ViewQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let claims = extract_view_claims(&headers, query.token.as_deref(), &state.jwt_secret)?;
    check_container(&container)?;
    let id = parse_object_id(&id)?;

    let (asset, path) = visible_object(&state, &claims, &container, &id).await?;
    let mut file = tokio::fs::File::open(&path).await.map_err(|e| {
        warn!("Blob for {} unreadable: {}", id, e);
        StatusCode::NOT_FOUND
    })?;

    let stream = async_stream::stream! {
        let mut buf = vec![0u8; 64 * 1024]; // 64 KB read buffer
        loop {
            match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    yield Ok::<_, std::io::Error>(Bytes::copy_from_slice(&buf[..n]));
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    };

    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&asset.name)),
    );
    response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(asset.size));

    Ok((response_headers, Body::from_stream(stream)))
}

/// GET /health — liveness check (no auth).
pub async fn health() -> &'static str {
    "ok"
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_ids_are_restricted() {
        assert!(check_container("couples_2024-a").is_ok());
        assert!(check_container("").is_err());
        assert!(check_container("../etc").is_err());
        assert!(check_container(&"x".repeat(65)).is_err());
    }

    #[test]
    fn object_ids_must_be_uuids() {
        assert!(parse_object_id(&Uuid::new_v4().to_string()).is_ok());
        assert_eq!(parse_object_id("../../db").unwrap_err(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("Beach.JPG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("notes"), "application/octet-stream");
    }
}
