use std::env;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub appointment_cache_ttl_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("MARKETPLACE_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("MARKETPLACE_API_URL not set, using default");
                    DEFAULT_API_URL.to_string()
                }),
            api_token: env::var("MARKETPLACE_API_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            appointment_cache_ttl_secs: match env::var("APPOINTMENT_CACHE_TTL_SECS") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("APPOINTMENT_CACHE_TTL_SECS is not a number ({}), using default", raw);
                    DEFAULT_CACHE_TTL_SECS
                }),
                Err(_) => DEFAULT_CACHE_TTL_SECS,
            },
        };

        if !config.is_configured() {
            warn!("MARKETPLACE_API_TOKEN not set - provider endpoints will reject requests");
        }

        config
    }

    /// Config pointing at an arbitrary base URL, mostly for tests and tools.
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            appointment_cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty() && self.api_token.is_some()
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.appointment_cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_base_url_strips_trailing_slash() {
        let config = AppConfig::for_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.cache_ttl(), Duration::from_secs(120));
        assert!(!config.is_configured());
    }

    #[test]
    fn test_configured_requires_token() {
        let mut config = AppConfig::for_base_url("http://127.0.0.1:9000");
        config.api_token = Some("token".to_string());
        assert!(config.is_configured());
    }
}
