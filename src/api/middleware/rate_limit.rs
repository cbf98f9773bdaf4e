//! Rate gate middleware for guarded path prefixes

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Applies the rate gate to requests whose path has a configured class
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.rate_gate.is_enabled() {
        return next.run(request).await;
    }

    let Some(class) = state
        .rate_gate
        .class_for_path(request.uri().path())
        .map(str::to_string)
    else {
        return next.run(request).await;
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_id = client_id(request.headers(), peer);

    let decision = state.rate_gate.allow(&client_id, &class).await;

    if !decision.allowed {
        warn!(client = %client_id, class = %class, count = decision.count, limit = decision.limit, "Rate limit exceeded");
        return ApiError::rate_limited(
            format!(
                "Too many requests. Limit is {} per {} seconds",
                decision.limit,
                state.config.rate_limit.window_secs
            ),
            decision.reset_in_seconds,
        )
        .into_response();
    }

    next.run(request).await
}

/// Client identity: first `X-Forwarded-For` entry, then the peer address
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}
