//! Versioned API endpoints

pub mod cache;
pub mod content;
pub mod translations;
pub mod webhooks;

use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

/// Create the /api/v1 router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/translations/stats", get(translations::stats))
        .route("/translations/validation", get(translations::validation))
        .route("/translations/{locale}", get(translations::get_static))
        .route("/translations/{locale}/dynamic", get(translations::get_dynamic))
        .route("/translations/{locale}/all", get(translations::get_combined))
        .route("/translations/{locale}/search", get(translations::search))
        .route("/translations/{locale}/keys", get(translations::keys))
        .route("/cache", get(cache::stats).delete(cache::clear))
        .route("/cache/sweep", post(cache::sweep))
        .route(
            "/webhooks/translations/update",
            post(webhooks::translations_update),
        )
        .route("/content/{entity_type}", get(content::list))
        .route(
            "/content/{entity_type}/{id}",
            get(content::get).put(content::upsert).delete(content::delete),
        )
}
