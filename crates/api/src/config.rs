//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use gateway::GatewayConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `GATEWAY_MIN_DELAY_MS` / `GATEWAY_MAX_DELAY_MS`: charge resolution
///   window (default: 8000 / 15000)
/// - `GATEWAY_SUCCESS_RATE`: probability of a successful charge (default: `0.8`)
/// - `DATABASE_URL`: PostgreSQL connection string; in-memory stores when unset
/// - `SEED_DEMO_DATA`: populate a demo catalog and cart (default: `false`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub gateway_min_delay_ms: u64,
    pub gateway_max_delay_ms: u64,
    pub gateway_success_rate: f64,
    pub database_url: Option<String>,
    pub seed_demo_data: bool,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            gateway_min_delay_ms: parse_or(
                &lookup,
                "GATEWAY_MIN_DELAY_MS",
                defaults.gateway_min_delay_ms,
            ),
            gateway_max_delay_ms: parse_or(
                &lookup,
                "GATEWAY_MAX_DELAY_MS",
                defaults.gateway_max_delay_ms,
            ),
            gateway_success_rate: parse_or(
                &lookup,
                "GATEWAY_SUCCESS_RATE",
                defaults.gateway_success_rate,
            ),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            seed_demo_data: lookup("SEED_DEMO_DATA")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.seed_demo_data),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the simulator settings, normalized.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::new(
            Duration::from_millis(self.gateway_min_delay_ms),
            Duration::from_millis(self.gateway_max_delay_ms),
            self.gateway_success_rate,
        )
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            gateway_min_delay_ms: 8_000,
            gateway_max_delay_ms: 15_000,
            gateway_success_rate: 0.8,
            database_url: None,
            seed_demo_data: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert!(!config.seed_demo_data);
        assert_eq!(config.gateway_config(), GatewayConfig::default());
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_pairs(&[
            ("PORT", "8081"),
            ("GATEWAY_MIN_DELAY_MS", "100"),
            ("GATEWAY_MAX_DELAY_MS", "200"),
            ("GATEWAY_SUCCESS_RATE", "1.0"),
            ("DATABASE_URL", "postgres://localhost/orders"),
            ("SEED_DEMO_DATA", "true"),
        ]);
        assert_eq!(config.port, 8081);
        assert_eq!(config.gateway_config().min_delay, Duration::from_millis(100));
        assert_eq!(config.gateway_config().max_delay, Duration::from_millis(200));
        assert_eq!(config.gateway_config().success_rate, 1.0);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/orders")
        );
        assert!(config.seed_demo_data);
    }

    #[test]
    fn test_bad_values_fall_back_to_defaults() {
        let config = from_pairs(&[
            ("PORT", "not-a-port"),
            ("GATEWAY_SUCCESS_RATE", "often"),
            ("DATABASE_URL", "  "),
        ]);
        assert_eq!(config.port, 3000);
        assert_eq!(config.gateway_success_rate, 0.8);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_gateway_config_is_normalized() {
        let config = from_pairs(&[
            ("GATEWAY_MIN_DELAY_MS", "500"),
            ("GATEWAY_MAX_DELAY_MS", "100"),
            ("GATEWAY_SUCCESS_RATE", "3.5"),
        ]);
        let gateway = config.gateway_config();
        assert_eq!(gateway.min_delay, Duration::from_millis(100));
        assert_eq!(gateway.max_delay, Duration::from_millis(500));
        assert_eq!(gateway.success_rate, 1.0);
    }
}
