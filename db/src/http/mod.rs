mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::engine::VectorStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VectorStore>,
}

/// Builds the router described in the HTTP surface table: CRUD on
/// `/vector`, the three `/compare/*` kernels, `/nearest`, and an ambient
/// `/health` liveness probe.
pub fn router(store: Arc<VectorStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/vector",
            get(handlers::get_vector)
                .post(handlers::insert_vector)
                .put(handlers::update_vector)
                .delete(handlers::delete_vector),
        )
        .route(
            "/compare/cosine_similarity",
            get(handlers::compare_cosine_similarity),
        )
        .route(
            "/compare/euclidean_distance",
            get(handlers::compare_euclidean_distance),
        )
        .route("/compare/dot_product", get(handlers::compare_dot_product))
        .route("/nearest", post(handlers::nearest))
        .with_state(state)
}
