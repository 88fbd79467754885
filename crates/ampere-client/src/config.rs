use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Url;

use crate::errors::ConfigurationError;

pub const DEFAULT_API_ORIGIN: &str = "http://localhost:8080";
pub const DEFAULT_API_BASE_PATH: &str = "/api";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Process-wide backend endpoint settings.
#[derive(Clone, Debug, PartialEq)]
pub struct ApiConfig {
    pub origin: Url,
    pub base_path: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse(DEFAULT_API_ORIGIN).expect("default origin is a valid url"),
            base_path: DEFAULT_API_BASE_PATH.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }
}

impl ApiConfig {
    pub fn new(origin: Url, base_path: impl Into<String>) -> Self {
        Self {
            origin,
            base_path: normalize_base_path(&base_path.into()),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Read `AMPERE_API_*` variables; blank or unparsable values keep defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(origin) = read("AMPERE_API_ORIGIN") {
            match Url::parse(&origin) {
                Ok(url) if !url.cannot_be_a_base() => config.origin = url,
                _ => tracing::warn!(%origin, "ignoring invalid AMPERE_API_ORIGIN"),
            }
        }
        if let Some(base_path) = read("AMPERE_API_BASE_PATH") {
            config.base_path = normalize_base_path(&base_path);
        }
        if let Some(ms) = read("AMPERE_API_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok()) {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = read("AMPERE_API_CONNECT_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok())
        {
            config.connect_timeout = Duration::from_millis(ms);
        }
        config
    }

    /// Origin joined with the base path, e.g. `http://localhost:8080/api`.
    pub fn base_url(&self) -> Result<Url, ConfigurationError> {
        if self.origin.cannot_be_a_base() {
            return Err(ConfigurationError::new(format!(
                "api origin '{}' cannot carry a path",
                self.origin
            )));
        }
        let mut url = self.origin.clone();
        url.set_path(&normalize_base_path(&self.base_path));
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// The process-wide configuration, resolved from the environment on first use.
    pub fn global() -> &'static ApiConfig {
        GLOBAL_CONFIG.get_or_init(ApiConfig::from_env)
    }
}

static GLOBAL_CONFIG: OnceLock<ApiConfig> = OnceLock::new();

/// Install the process-wide configuration. Fails once it has been resolved.
pub fn set_global_config(config: ApiConfig) -> Result<(), ConfigurationError> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| ConfigurationError::new("api config already resolved for this process"))
}

fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_target_local_api_prefix() {
        let config = ApiConfig::default();
        assert_eq!(config.origin.as_str(), "http://localhost:8080/");
        assert_eq!(config.base_path, "/api");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://localhost:8080/api"
        );
    }

    #[test]
    fn from_lookup_applies_overrides_and_ignores_blank_values() {
        let vars = HashMap::from([
            ("AMPERE_API_ORIGIN", "https://charge.example.com"),
            ("AMPERE_API_BASE_PATH", "backend/"),
            ("AMPERE_API_TIMEOUT_MS", "5000"),
            ("AMPERE_API_CONNECT_TIMEOUT_MS", "   "),
        ]);
        let config = ApiConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.origin.as_str(), "https://charge.example.com/");
        assert_eq!(config.base_path, "/backend");
        assert_eq!(config.request_timeout, Duration::from_millis(5_000));
        assert_eq!(
            config.connect_timeout,
            Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS)
        );
    }

    #[test]
    fn from_lookup_keeps_default_origin_when_invalid() {
        let config = ApiConfig::from_lookup(|key| {
            (key == "AMPERE_API_ORIGIN").then(|| "not a url".to_string())
        });
        assert_eq!(config.origin.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn empty_base_path_maps_to_origin_root() {
        let config = ApiConfig::new(Url::parse("http://api.local").unwrap(), "/");
        assert_eq!(config.base_url().unwrap().as_str(), "http://api.local/");
    }
}
