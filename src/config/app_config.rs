use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Entity types whose mutations clear cached content by default
const DEFAULT_WATCHED_ENTITIES: &[&str] = &[
    "Service",
    "Project",
    "ProjectCategory",
    "JobPosition",
    "HomePage",
    "AboutPage",
    "TeamMember",
    "Contact",
    "ContactMessage",
    "Partner",
    "Office",
];

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub translations: TranslationsConfig,
    pub rate_limit: RateLimitSettings,
    pub invalidation: InvalidationConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed to call the API with credentials
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Cache backend and gateway settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// `memory` or `redis`
    pub backend: String,
    pub redis_url: Option<String>,
    /// Prefix applied to every Redis key; empty disables it
    pub key_prefix: String,
    pub default_ttl_secs: u64,
    pub max_capacity: u64,
    /// Upper bound for a single backend call
    pub operation_timeout_ms: u64,
    /// Minimum lifetime of tag key-set records
    pub tag_ttl_secs: u64,
    pub single_flight: bool,
    /// How long a concurrent miss waits for another caller's computation
    pub single_flight_wait_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TranslationsConfig {
    /// Directory holding one `<locale>.json` catalog per locale
    pub directory: PathBuf,
    pub default_locale: String,
    pub locales: Vec<String>,
    pub static_ttl_secs: u64,
    pub dynamic_ttl_secs: u64,
    pub combined_ttl_secs: u64,
    /// Reload catalogs right after a webhook invalidation
    pub warmup_on_invalidate: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub enabled: bool,
    pub window_secs: u64,
    pub max_requests: u64,
    /// Path prefixes guarded by the gate, first match wins
    pub classes: Vec<RateLimitClass>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RateLimitClass {
    pub path_prefix: String,
    pub class: String,
    /// Overrides the global ceiling for this class
    #[serde(default)]
    pub max_requests: Option<u64>,
}

/// Routing table from mutated entity type to the tags it clears
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InvalidationConfig {
    pub routes: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub endpoint: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            redis_url: None,
            key_prefix: String::new(),
            default_ttl_secs: 3600,
            max_capacity: 10_000,
            operation_timeout_ms: 500,
            tag_ttl_secs: 3600,
            single_flight: false,
            single_flight_wait_ms: 2000,
        }
    }
}

impl CacheSettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }

    pub fn tag_ttl(&self) -> Duration {
        Duration::from_secs(self.tag_ttl_secs)
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("translations"),
            default_locale: "uk".to_string(),
            locales: vec!["uk".to_string(), "en".to_string()],
            static_ttl_secs: 30 * 60,
            dynamic_ttl_secs: 15 * 60,
            combined_ttl_secs: 45 * 60,
            warmup_on_invalidate: false,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 60,
            max_requests: 100,
            classes: vec![RateLimitClass {
                path_prefix: "/api/v1/translations".to_string(),
                class: "translations".to_string(),
                max_requests: None,
            }],
        }
    }
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        let routes = DEFAULT_WATCHED_ENTITIES
            .iter()
            .map(|entity| {
                let tags = vec![
                    "api".to_string(),
                    format!("model:{}", entity),
                    "dynamic".to_string(),
                ];
                (entity.to_string(), tags)
            })
            .collect();

        Self { routes }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "/metrics".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `config/default`, `config/local`, then `APP__*` environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("translations.locales")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
