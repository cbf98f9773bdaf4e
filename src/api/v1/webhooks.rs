//! Translation update webhook

use axum::{body::Bytes, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{parse_optional_body, ApiError, Json};

/// Optional webhook body
#[derive(Debug, Default, Deserialize)]
pub struct TranslationUpdateRequest {
    /// Only this locale is invalidated when present
    #[serde(default)]
    pub locale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranslationUpdateResponse {
    pub status: &'static str,
    pub message: String,
    pub invalidated: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Locales reloaded right after invalidation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warmed: Option<usize>,
    pub timestamp: DateTime<Utc>,
}

/// POST /api/v1/webhooks/translations/update
///
/// Accepts an empty body or `{"locale": "uk"}`.
pub async fn translations_update(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TranslationUpdateResponse>, ApiError> {
    let request: TranslationUpdateRequest = parse_optional_body(&body)?;

    let translations = &state.translations;

    let (invalidated, locale) = match request.locale {
        Some(locale) => {
            if !translations.locales().contains(&locale) {
                return Err(
                    ApiError::bad_request(format!("Unsupported locale '{}'", locale))
                        .with_param("locale"),
                );
            }
            (translations.invalidate_locale(&locale).await, Some(locale))
        }
        None => (translations.invalidate_all().await, None),
    };

    let warmed = if state.config.translations.warmup_on_invalidate {
        Some(translations.warmup().await)
    } else {
        None
    };

    info!(invalidated = invalidated, locale = ?locale, warmed = ?warmed, "Translation cache cleared via webhook");

    Ok(Json(TranslationUpdateResponse {
        status: "success",
        message: "Translation cache cleared successfully".to_string(),
        invalidated,
        locale,
        warmed,
        timestamp: Utc::now(),
    }))
}
