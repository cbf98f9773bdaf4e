//! Content handlers

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::content::{ContentRecord, LocalizedText};

#[derive(Debug, Serialize)]
pub struct ContentListResponse {
    pub entity_type: String,
    pub items: Vec<ContentRecord>,
    pub count: usize,
}

/// Body of PUT /content/{entity_type}/{id}
#[derive(Debug, Deserialize)]
pub struct UpsertContentRequest {
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub fields: BTreeMap<String, LocalizedText>,
}

fn default_active() -> bool {
    true
}

/// GET /api/v1/content/{entity_type}
pub async fn list(
    State(state): State<AppState>,
    Path(entity_type): Path<String>,
) -> Result<Json<ContentListResponse>, ApiError> {
    let items = state.content.list(&entity_type).await?;
    debug!(entity_type = %entity_type, count = items.len(), "Listing content");

    Ok(Json(ContentListResponse {
        count: items.len(),
        entity_type,
        items,
    }))
}

/// GET /api/v1/content/{entity_type}/{id}
pub async fn get(
    State(state): State<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
) -> Result<Json<ContentRecord>, ApiError> {
    Ok(Json(state.content.get(&entity_type, &id).await?))
}

/// PUT /api/v1/content/{entity_type}/{id}
pub async fn upsert(
    State(state): State<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
    Json(request): Json<UpsertContentRequest>,
) -> Result<Json<ContentRecord>, ApiError> {
    let record = ContentRecord {
        entity_type,
        id,
        active: request.active,
        fields: request.fields,
    };

    Ok(Json(state.content.upsert(record).await?))
}

/// DELETE /api/v1/content/{entity_type}/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path((entity_type, id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.content.delete(&entity_type, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
