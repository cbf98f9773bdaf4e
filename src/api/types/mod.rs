//! API request/response types

pub mod error;
pub mod json;
pub mod translations;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::{parse_optional_body, Json};
pub use translations::{
    CombinedTranslationsResponse, KeysResponse, SearchQuery, SearchResponse, TranslationsResponse,
};
