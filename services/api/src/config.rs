//! Service configuration

use serde::Deserialize;

/// Settings for the marketplace API, read from `MARKET_*` environment
/// variables on top of built-in defaults
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Socket address to listen on
    pub bind_address: String,
    /// Email suffix required for new profiles
    pub email_domain: String,
    /// Lifetime of the cached active-listing snapshot
    pub listings_cache_ttl_seconds: u64,
}

impl ServiceConfig {
    /// Load the configuration
    ///
    /// # Environment Variables
    /// - `MARKET_BIND_ADDRESS` (default: "0.0.0.0:3001")
    /// - `MARKET_EMAIL_DOMAIN` (default: "@iiitrkvalley.ac.in")
    /// - `MARKET_LISTINGS_CACHE_TTL_SECONDS` (default: 30)
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("bind_address", "0.0.0.0:3001")?
            .set_default("email_domain", "@iiitrkvalley.ac.in")?
            .set_default("listings_cache_ttl_seconds", 30)?
            .add_source(config::Environment::with_prefix("MARKET"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_service_config_defaults() {
        let config = ServiceConfig::load().unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3001");
        assert_eq!(config.email_domain, "@iiitrkvalley.ac.in");
        assert_eq!(config.listings_cache_ttl_seconds, 30);
    }

    #[test]
    #[serial]
    fn test_service_config_from_env() {
        unsafe {
            std::env::set_var("MARKET_BIND_ADDRESS", "127.0.0.1:8080");
            std::env::set_var("MARKET_LISTINGS_CACHE_TTL_SECONDS", "5");
        }

        let config = ServiceConfig::load().unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.listings_cache_ttl_seconds, 5);

        unsafe {
            std::env::remove_var("MARKET_BIND_ADDRESS");
            std::env::remove_var("MARKET_LISTINGS_CACHE_TTL_SECONDS");
        }
    }
}
