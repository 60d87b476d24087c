/// Configuration management for Civic Service
///
/// Backend project credentials and collection names are process-wide
/// configuration, loaded once at startup. No runtime reconfiguration is
/// supported.
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Hosted backend project credentials
    pub backend: BackendConfig,
    /// Document collection names
    pub collections: CollectionsConfig,
    /// Feed settings
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (dev, staging, prod)
    pub env: String,
}

/// Hosted backend project credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend API key
    pub api_key: String,
    /// Backend project id
    pub project_id: String,
    /// Blob storage bucket
    pub storage_bucket: String,
}

/// Document collection names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionsConfig {
    pub profiles: String,
    pub posts: String,
    pub comments: String,
    pub forum_messages: String,
}

/// Feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Posts delivered per feed snapshot
    pub page_size: usize,
}

const PLACEHOLDER_API_KEY: &str = "dev-api-key";

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let api_key =
            std::env::var("LINKGOV_API_KEY").unwrap_or_else(|_| PLACEHOLDER_API_KEY.to_string());
        if app_env.eq_ignore_ascii_case("production")
            && (api_key.trim().is_empty() || api_key == PLACEHOLDER_API_KEY)
        {
            return Err("LINKGOV_API_KEY must be set to a non-default value in production"
                .to_string());
        }

        Ok(Config {
            app: AppConfig { env: app_env },
            backend: BackendConfig {
                api_key,
                project_id: std::env::var("LINKGOV_PROJECT_ID")
                    .unwrap_or_else(|_| "linkgov-dev".to_string()),
                storage_bucket: std::env::var("LINKGOV_STORAGE_BUCKET")
                    .unwrap_or_else(|_| "linkgov-dev.appspot.com".to_string()),
            },
            collections: CollectionsConfig::default(),
            feed: FeedConfig {
                page_size: std::env::var("FEED_PAGE_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
        })
    }
}

impl Default for CollectionsConfig {
    fn default() -> Self {
        Self {
            profiles: "profiles".to_string(),
            posts: "posts".to_string(),
            comments: "comments".to_string(),
            forum_messages: "forum-messages".to_string(),
        }
    }
}
