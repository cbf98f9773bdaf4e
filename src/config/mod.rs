//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, CacheSettings, InvalidationConfig, LogFormat, LoggingConfig, MetricsConfig,
    ObservabilityConfig, RateLimitClass, RateLimitSettings, ServerConfig, TranslationsConfig,
};
