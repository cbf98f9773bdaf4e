//! Cache administration handlers

use axum::extract::{Query, State};
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::infrastructure::cache::SweepReport;
use crate::infrastructure::services::{CacheStats, ClearOutcome};

#[derive(Debug, Default, Deserialize)]
pub struct ClearQuery {
    /// Comma separated tags
    pub tags: Option<String>,
    /// Glob over keys
    pub pattern: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SweepQuery {
    pub pattern: Option<String>,
}

/// Splits a comma separated list, dropping blanks
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// GET /api/v1/cache
pub async fn stats(State(state): State<AppState>) -> Result<Json<CacheStats>, ApiError> {
    Ok(Json(state.cache_admin.stats().await?))
}

/// DELETE /api/v1/cache
pub async fn clear(
    State(state): State<AppState>,
    Query(query): Query<ClearQuery>,
) -> Result<Json<ClearOutcome>, ApiError> {
    let outcome = if let Some(raw) = query.tags.as_deref() {
        let tags = parse_tags(raw);
        if tags.is_empty() {
            return Err(ApiError::bad_request("No tags given").with_param("tags"));
        }
        state.cache_admin.clear_tags(&tags).await
    } else if let Some(pattern) = query.pattern.as_deref().filter(|p| !p.trim().is_empty()) {
        state.cache_admin.clear_pattern(pattern.trim()).await?
    } else {
        state.cache_admin.clear_all().await?
    };

    info!(scope = outcome.scope, removed = outcome.removed, "Cache cleared through API");
    Ok(Json(outcome))
}

/// POST /api/v1/cache/sweep
pub async fn sweep(
    State(state): State<AppState>,
    Query(query): Query<SweepQuery>,
) -> Result<Json<SweepReport>, ApiError> {
    let report = state.cache_admin.sweep(query.pattern.as_deref()).await?;
    Ok(Json(report))
}
