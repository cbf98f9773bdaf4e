use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{
    cors_layer, logging_middleware, metrics_middleware, rate_limit_middleware,
    security_headers_middleware,
};
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state
///
/// The rate gate runs innermost so rejected requests are still logged,
/// measured and given security headers. CORS sits outside them so
/// preflight requests are answered before any of it runs.
pub fn create_router_with_state(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/api/v1", v1::create_v1_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if let Some(m) = metrics {
        router = router.merge(create_metrics_router(m));
    }

    router
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::api::state::AppStateParts;
    use crate::config::AppConfig;
    use crate::domain::content::ContentRecord;
    use crate::domain::translation::{LocalizedContentProvider, TranslationCatalog};
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::content::InMemoryContentRepository;
    use crate::infrastructure::translation::InMemoryCatalogStore;

    async fn create_test_router(config: AppConfig) -> Router {
        let store = InMemoryCatalogStore::new()
            .with_catalog(
                "uk",
                TranslationCatalog::from([("nav.home", "Головна"), ("nav.contact", "Контакти")]),
            )
            .with_catalog(
                "en",
                TranslationCatalog::from([("nav.home", "Home"), ("nav.contact", "Contact")]),
            );

        let content = Arc::new(InMemoryContentRepository::new().with_record(
            ContentRecord::new("Service", "1")
                .with_text("title", "uk", "Дизайн")
                .with_text("title", "en", "Design"),
        ));

        let parts = AppStateParts {
            cache: Arc::new(InMemoryCache::new()),
            catalog_store: Arc::new(store),
            content_repository: content.clone(),
            providers: vec![content as Arc<dyn LocalizedContentProvider>],
        };

        create_router_with_state(AppState::new(config, parts).await, None)
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&router, Method::GET, "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_static_translations() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, body) = send(&router, Method::GET, "/api/v1/translations/en", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "en");
        assert_eq!(body["source"], "static");
        assert_eq!(body["count"], 2);
        assert_eq!(body["translations"]["nav.home"], "Home");
        assert_eq!(body["available_languages"], json!(["uk", "en"]));
    }

    #[tokio::test]
    async fn test_unknown_locale_falls_back_to_default() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, body) = send(&router, Method::GET, "/api/v1/translations/fr", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["language"], "uk");
        assert_eq!(body["translations"]["nav.home"], "Головна");
    }

    #[tokio::test]
    async fn test_translations_response_is_publicly_cacheable() {
        let router = create_test_router(AppConfig::default()).await;

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/translations/en")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let cache_control = response.headers().get(header::CACHE_CONTROL).unwrap();
        assert!(cache_control.to_str().unwrap().starts_with("public"));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let router = create_test_router(AppConfig::default()).await;

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/translations/en")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_unknown_origin() {
        let router = create_test_router(AppConfig::default()).await;

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/translations/en")
                    .header(header::ORIGIN, "https://elsewhere.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let mut config = AppConfig::default();
        config.server.cors_origins = vec!["https://site.example".to_string()];
        let router = create_test_router(config).await;

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/content/Service/1")
                    .header(header::ORIGIN, "https://site.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://site.example"
        );
        assert_eq!(headers.get(header::ACCESS_CONTROL_MAX_AGE).unwrap(), "86400");
    }

    #[tokio::test]
    async fn test_combined_translations_include_content() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, body) = send(&router, Method::GET, "/api/v1/translations/en/all", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "combined");
        assert_eq!(body["static_count"], 2);
        assert_eq!(body["dynamic_count"], 1);
        assert_eq!(body["translations"]["service.1.title"], "Design");
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, body) =
            send(&router, Method::GET, "/api/v1/translations/en/search?q=", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "q");

        let (status, body) =
            send(&router, Method::GET, "/api/v1/translations/en/search?q=cont", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["count"], 1);
        assert_eq!(body["results"]["nav.contact"], "Contact");
    }

    #[tokio::test]
    async fn test_rate_limit_rejects_over_ceiling() {
        let mut config = AppConfig::default();
        config.rate_limit.max_requests = 2;
        let router = create_test_router(config).await;

        for _ in 0..2 {
            let (status, _) = send(&router, Method::GET, "/api/v1/translations/en", None).await;
            assert_eq!(status, StatusCode::OK);
        }

        let response = router
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/v1/translations/en")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));

        // unguarded paths are not counted
        let (status, _) = send(&router, Method::GET, "/api/v1/cache", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_webhook_clears_translation_cache() {
        let router = create_test_router(AppConfig::default()).await;
        send(&router, Method::GET, "/api/v1/translations/en", None).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/webhooks/translations/update",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body["invalidated"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_webhook_rejects_unknown_locale() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/webhooks/translations/update",
            Some(json!({"locale": "fr"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "locale");
    }

    #[tokio::test]
    async fn test_content_write_invalidates_cached_list() {
        let router = create_test_router(AppConfig::default()).await;

        let (_, body) = send(&router, Method::GET, "/api/v1/content/Service", None).await;
        assert_eq!(body["count"], 1);

        let (status, _) = send(
            &router,
            Method::PUT,
            "/api/v1/content/Service/2",
            Some(json!({"fields": {"title": {"en": "Development"}}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&router, Method::GET, "/api/v1/content/Service", None).await;
        assert_eq!(body["count"], 2);

        let (_, body) = send(&router, Method::GET, "/api/v1/translations/en/dynamic", None).await;
        assert_eq!(body["translations"]["service.2.title"], "Development");
    }

    #[tokio::test]
    async fn test_content_delete_and_missing() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, _) = send(&router, Method::DELETE, "/api/v1/content/Service/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&router, Method::GET, "/api/v1/content/Service/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cache_clear_by_tags() {
        let router = create_test_router(AppConfig::default()).await;
        send(&router, Method::GET, "/api/v1/translations/en", None).await;

        let (status, body) =
            send(&router, Method::DELETE, "/api/v1/cache?tags=translations", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["scope"], "tags");
        assert!(body["removed"].as_u64().unwrap() >= 1);
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let router = create_test_router(AppConfig::default()).await;

        let (status, _) =
            send(&router, Method::GET, "/api/v1/translations/..%2f..%2fetc", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
