//! Environment-driven configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::types::DEFAULT_MIN_LIST_ITEMS;

/// Remote store connection settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base URL of the table API (None = in-memory store)
    pub url: Option<String>,
    /// Key sent as `apikey` and bearer token
    pub api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl StoreConfig {
    /// Load store settings from STORE_URL, STORE_API_KEY and STORE_TIMEOUT
    pub fn from_env() -> Self {
        let url = non_empty_var("STORE_URL");
        let api_key = non_empty_var("STORE_API_KEY");
        if url.is_some() && api_key.is_none() {
            tracing::warn!("STORE_URL is set but STORE_API_KEY is not, requests will be anonymous");
        }

        Self {
            url,
            api_key,
            timeout: Duration::from_secs(non_zero_var("STORE_TIMEOUT", 10)),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub store: StoreConfig,
    /// Minimum number of non-empty lines in a submitted list
    pub min_list_items: usize,
    /// Idle time after which a view session is dropped
    pub view_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 6574,
            store: StoreConfig::default(),
            min_list_items: DEFAULT_MIN_LIST_ITEMS,
            view_ttl: Duration::from_secs(3600),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr),
            port: parse_var("PORT", defaults.port),
            store: StoreConfig::from_env(),
            min_list_items: non_zero_var("MIN_LIST_ITEMS", defaults.min_list_items),
            view_ttl: Duration::from_secs(non_zero_var("VIEW_TTL", defaults.view_ttl.as_secs())),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match non_empty_var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {} value {:?}, using default: {}", key, raw, default);
            default
        }),
        None => default,
    }
}

/// Like `parse_var`, but a zero value also falls back to the default
fn non_zero_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Default + PartialEq + Copy,
{
    let value = parse_var(key, default);
    if value == T::default() {
        tracing::warn!("{} must be greater than zero, using default: {}", key, default);
        return default;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "BIND_ADDR",
        "PORT",
        "STORE_URL",
        "STORE_API_KEY",
        "STORE_TIMEOUT",
        "MIN_LIST_ITEMS",
        "VIEW_TTL",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = AppConfig::from_env();
        assert_eq!(config.port, 6574);
        assert_eq!(config.min_list_items, 10);
        assert!(config.store.url.is_none());
        assert_eq!(config.store.timeout, Duration::from_secs(10));
        assert_eq!(config.view_ttl, Duration::from_secs(3600));
    }

    #[test]
    #[serial]
    fn test_reads_env_values() {
        clear_env();
        std::env::set_var("PORT", "8080");
        std::env::set_var("STORE_URL", "  https://db.example.com/rest/v1  ");
        std::env::set_var("STORE_API_KEY", "secret");
        std::env::set_var("STORE_TIMEOUT", "3");
        std::env::set_var("MIN_LIST_ITEMS", "5");

        let config = AppConfig::from_env();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.store.url.as_deref(),
            Some("https://db.example.com/rest/v1")
        );
        assert_eq!(config.store.api_key.as_deref(), Some("secret"));
        assert_eq!(config.store.timeout, Duration::from_secs(3));
        assert_eq!(config.min_list_items, 5);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("MIN_LIST_ITEMS", "0");
        std::env::set_var("STORE_URL", "   ");

        let config = AppConfig::from_env();
        assert_eq!(config.port, 6574);
        assert_eq!(config.min_list_items, 10);
        assert!(config.store.url.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_zero_durations_fall_back() {
        clear_env();
        std::env::set_var("STORE_TIMEOUT", "0");
        std::env::set_var("VIEW_TTL", "0");

        let config = AppConfig::from_env();
        assert_eq!(config.store.timeout, Duration::from_secs(10));
        assert_eq!(config.view_ttl, Duration::from_secs(3600));
        clear_env();
    }
}
