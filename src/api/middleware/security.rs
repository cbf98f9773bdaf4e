//! Security and caching headers, request path validation

use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::types::ApiError;

const TRANSLATIONS_PREFIX: &str = "/api/v1/translations";

/// Client-side cache lifetime of successful translation responses
const TRANSLATIONS_MAX_AGE: &str = "public, max-age=1800";

/// Rejects malformed paths and adds security headers to every response
///
/// Successful translation reads may be cached by clients; everything else
/// is marked uncacheable.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();

    if let Err(e) = validate_request_security(&path) {
        return e.into_response();
    }

    let mut response = next.run(request).await;
    let cacheable = path.starts_with(TRANSLATIONS_PREFIX) && response.status() == StatusCode::OK;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert("X-XSS-Protection", HeaderValue::from_static("1; mode=block"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );

    if cacheable {
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static(TRANSLATIONS_MAX_AGE));
        headers.insert(
            header::VARY,
            HeaderValue::from_static("Accept-Language, Accept-Encoding"),
        );
    } else if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
    }

    response
}

/// Validate request path for traversal and injection attempts
pub fn validate_request_security(path: &str) -> Result<(), SecurityValidationError> {
    if path.contains("..") || path.contains("//") {
        return Err(SecurityValidationError::PathTraversal);
    }

    if path.contains('\0') {
        return Err(SecurityValidationError::InvalidCharacters);
    }

    Ok(())
}

#[derive(Debug, PartialEq)]
pub enum SecurityValidationError {
    PathTraversal,
    InvalidCharacters,
}

impl IntoResponse for SecurityValidationError {
    fn into_response(self) -> Response {
        let message = match self {
            SecurityValidationError::PathTraversal => "Invalid path: path traversal detected",
            SecurityValidationError::InvalidCharacters => "Invalid request: prohibited characters",
        };

        ApiError::bad_request(message).into_response()
    }
}
