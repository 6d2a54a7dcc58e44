pub mod auth;
pub mod routes;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

pub use routes::AppState;

/// The backing-store service: owner-tagged objects grouped in containers.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/containers/{container}/objects", get(routes::list_objects))
        .route(
            "/containers/{container}/objects/{id}",
            post(routes::create_object).delete(routes::delete_object),
        )
        .route("/containers/{container}/objects/{id}/view", get(routes::view_object))
        .route("/health", get(routes::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
