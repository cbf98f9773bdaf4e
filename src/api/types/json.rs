//! JSON bodies with failures reported in the API error format

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::{de::DeserializeOwned, Serialize};

use super::error::ApiError;

const INVALID_BODY: &str = "invalid_body";

/// `axum::Json` whose rejections become an [`ApiError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        AxumJson::<T>::from_request(req, state)
            .await
            .map(|AxumJson(value)| Json(value))
            .map_err(body_error)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

/// Parses a body that may be empty, falling back to `T::default()`
///
/// Used where the content type is not required, e.g. webhook calls
/// that often arrive with no body at all.
pub fn parse_optional_body<T>(body: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        let message = if e.is_data() {
            format!("Request body has an unexpected shape: {}", e)
        } else {
            format!("Request body is not valid JSON: {}", e)
        };
        ApiError::bad_request(message).with_code(INVALID_BODY)
    })
}

fn body_error(rejection: JsonRejection) -> ApiError {
    let message = match &rejection {
        JsonRejection::JsonDataError(err) => {
            format!("Request body has an unexpected shape: {}", err.body_text())
        }
        JsonRejection::JsonSyntaxError(err) => {
            format!("Request body is not valid JSON: {}", err.body_text())
        }
        JsonRejection::MissingJsonContentType(_) => {
            "Request body must be sent as application/json".to_string()
        }
        other => format!("Could not read request body: {}", other.body_text()),
    };

    ApiError::bad_request(message)
        .with_code(INVALID_BODY)
        .with_status(rejection.status())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct LocaleBody {
        #[serde(default)]
        locale: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct RecordBody {
        active: bool,
    }

    fn json_request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_extracts_json_body() {
        let Json(body) = Json::<RecordBody>::from_request(json_request(r#"{"active": true}"#), &())
            .await
            .unwrap();

        assert!(body.active);
    }

    #[tokio::test]
    async fn test_missing_content_type_is_unsupported_media_type() {
        let request = axum::http::Request::builder()
            .body(Body::from(r#"{"active": true}"#))
            .unwrap();

        let err = Json::<RecordBody>::from_request(request, &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.response.error.code.as_deref(), Some("invalid_body"));
        assert!(err.response.error.message.contains("application/json"));
    }

    #[tokio::test]
    async fn test_wrong_shape_names_the_problem() {
        let err = Json::<RecordBody>::from_request(json_request(r#"{"active": "yes"}"#), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.response.error.message.starts_with("Request body has an unexpected shape"));
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        let err = Json::<RecordBody>::from_request(json_request("{active"), &())
            .await
            .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.response.error.message.starts_with("Request body is not valid JSON"));
    }

    #[test]
    fn test_optional_body_empty_uses_default() {
        let body: LocaleBody = parse_optional_body(b"  \n").unwrap();
        assert!(body.locale.is_none());

        let body: LocaleBody = parse_optional_body(br#"{"locale": "uk"}"#).unwrap();
        assert_eq!(body.locale.as_deref(), Some("uk"));
    }

    #[test]
    fn test_optional_body_rejects_garbage() {
        let err = parse_optional_body::<LocaleBody>(b"locale=uk").unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.code.as_deref(), Some("invalid_body"));
    }
}
