//! Translation endpoint handlers

use axum::extract::{Path, Query, State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CombinedTranslationsResponse, Json, KeysResponse, SearchQuery, SearchResponse,
    TranslationsResponse,
};
use crate::domain::translation::{CatalogSource, ValidationReport};
use crate::infrastructure::services::TranslationStats;

fn available_languages(state: &AppState) -> Vec<String> {
    state.translations.locales().to_vec()
}

/// GET /api/v1/translations/{locale}
pub async fn get_static(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Json<TranslationsResponse> {
    let locale = state.translations.resolve_locale(&locale);
    let catalog = state.translations.load_static(&locale).await;
    debug!(locale = %locale, count = catalog.len(), "Serving static translations");

    Json(TranslationsResponse::new(
        locale,
        catalog,
        CatalogSource::Static,
        available_languages(&state),
    ))
}

/// GET /api/v1/translations/{locale}/dynamic
pub async fn get_dynamic(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Json<TranslationsResponse> {
    let locale = state.translations.resolve_locale(&locale);
    let catalog = state.translations.load_dynamic(&locale).await;

    Json(TranslationsResponse::new(
        locale,
        catalog,
        CatalogSource::Dynamic,
        available_languages(&state),
    ))
}

/// GET /api/v1/translations/{locale}/all
pub async fn get_combined(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Json<CombinedTranslationsResponse> {
    let locale = state.translations.resolve_locale(&locale);
    let combined = state.translations.load_combined(&locale).await;

    Json(CombinedTranslationsResponse::new(
        locale,
        combined,
        available_languages(&state),
    ))
}

/// GET /api/v1/translations/{locale}/search?q=
pub async fn search(
    State(state): State<AppState>,
    Path(locale): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let q = query.q.unwrap_or_default();
    let q = q.trim();

    if q.is_empty() {
        return Err(ApiError::bad_request("Search query is required").with_param("q"));
    }

    let locale = state.translations.resolve_locale(&locale);
    let results = state.translations.search(q, &locale).await;

    Ok(Json(SearchResponse {
        language: locale,
        query: q.to_string(),
        count: results.len(),
        results,
    }))
}

/// GET /api/v1/translations/{locale}/keys
pub async fn keys(
    State(state): State<AppState>,
    Path(locale): Path<String>,
) -> Json<KeysResponse> {
    let locale = state.translations.resolve_locale(&locale);
    let groups = state.translations.grouped_keys(&locale).await;
    let total_keys = groups.values().map(Vec::len).sum();

    Json(KeysResponse {
        language: locale,
        groups,
        total_keys,
    })
}

/// GET /api/v1/translations/stats
pub async fn stats(State(state): State<AppState>) -> Json<TranslationStats> {
    Json(state.translations.stats().await)
}

/// GET /api/v1/translations/validation
pub async fn validation(
    State(state): State<AppState>,
) -> Result<Json<ValidationReport>, ApiError> {
    let report = state.translations.validate().await?;
    Ok(Json(report))
}
