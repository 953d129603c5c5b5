//! Environment configuration

use thiserror::Error;

use crate::domain::services::SaleDefaults;

const DEFAULT_PORT: u16 = 8083;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub nats_url: Option<String>,
    pub db_max_connections: u32,
    pub sale_defaults: SaleDefaults,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse_or(get("PORT"), "PORT", DEFAULT_PORT)?;
        let db_max_connections = parse_or(get("DB_MAX_CONNECTIONS"), "DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        let mut sale_defaults = SaleDefaults::default();
        if let Some(address) = get("DEFAULT_SHIPPING_ADDRESS") { sale_defaults.shipping_address = address; }

        Ok(Self { database_url, port, nats_url: get("NATS_URL"), db_max_connections, sale_defaults })
    }

    pub fn listen_addr(&self) -> String { format!("0.0.0.0:{}", self.port) }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match value {
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { name, value: v }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/sales")])).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.db_max_connections, 10);
        assert!(config.nats_url.is_none());
        assert_eq!(config.sale_defaults, SaleDefaults::default());
        assert_eq!(config.listen_addr(), "0.0.0.0:8083");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/sales"),
            ("PORT", "9000"),
            ("NATS_URL", "nats://localhost:4222"),
            ("DEFAULT_SHIPPING_ADDRESS", "Calle Falsa 123"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.nats_url.as_deref(), Some("nats://localhost:4222"));
        assert_eq!(config.sale_defaults.shipping_address, "Calle Falsa 123");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(Config::from_lookup(lookup(&[])), Err(ConfigError::Missing("DATABASE_URL"))));
        assert!(matches!(
            Config::from_lookup(lookup(&[("DATABASE_URL", "x"), ("PORT", "eighty")])),
            Err(ConfigError::Invalid { name: "PORT", .. })
        ));
    }
}
