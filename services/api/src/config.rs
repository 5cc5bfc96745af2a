use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::db::DbConfig;
use crate::identity::DEFAULT_TOKEN_TTL_MINUTES;

/// Signing secret used when dev mode is on and none is configured.
const DEV_JWT_SECRET: &str = "pitchhub-dev-secret-do-not-use-in-production";

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Which entity store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("unknown store backend '{other}' (expected 'postgres' or 'memory')"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub log_level: String,
    pub dev_mode: bool,
    pub store: StoreBackend,
    pub database: DbConfig,
    pub run_migrations: bool,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub cors_origins: Vec<String>,
}

fn flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| v == "1" || v.to_lowercase() == "true")
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let listen_addr = var("PITCHHUB_LISTEN_ADDR")
            .unwrap_or_else(|| "127.0.0.1:8000".to_string())
            .parse()
            .context("invalid PITCHHUB_LISTEN_ADDR")?;

        let log_level = var("PITCHHUB_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let dev_mode = flag(var("PITCHHUB_DEV"), false);

        let store = var("PITCHHUB_STORE")
            .map(|s| s.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or(StoreBackend::Postgres);

        let mut database = DbConfig::default();
        if let Some(url) = var("DATABASE_URL") {
            database.database_url = url;
        }
        if let Some(max) = var("DB_MAX_CONNECTIONS") {
            database.max_connections = max.parse().context("invalid DB_MAX_CONNECTIONS")?;
        }
        if let Some(min) = var("DB_MIN_CONNECTIONS") {
            database.min_connections = min.parse().context("invalid DB_MIN_CONNECTIONS")?;
        }

        let run_migrations = flag(var("PITCHHUB_RUN_MIGRATIONS"), true);

        let jwt_secret = match var("PITCHHUB_JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if dev_mode => DEV_JWT_SECRET.to_string(),
            None => bail!("PITCHHUB_JWT_SECRET must be set unless PITCHHUB_DEV is enabled"),
        };

        let ttl_minutes = var("PITCHHUB_TOKEN_TTL_MINUTES")
            .map(|s| s.parse::<i64>())
            .transpose()
            .context("invalid PITCHHUB_TOKEN_TTL_MINUTES")?
            .unwrap_or(DEFAULT_TOKEN_TTL_MINUTES);
        if ttl_minutes <= 0 {
            bail!("PITCHHUB_TOKEN_TTL_MINUTES must be positive");
        }

        let cors_origins = var("PITCHHUB_CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            listen_addr,
            log_level,
            dev_mode,
            store,
            database,
            run_migrations,
            jwt_secret,
            token_ttl: chrono::Duration::minutes(ttl_minutes),
            cors_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_dev_defaults() {
        let config = config(&[("PITCHHUB_DEV", "1")]).unwrap();
        assert_eq!(config.listen_addr.to_string(), "127.0.0.1:8000");
        assert_eq!(config.store, StoreBackend::Postgres);
        assert!(config.run_migrations);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(config.token_ttl, chrono::Duration::minutes(30));
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn test_secret_required_outside_dev() {
        assert!(config(&[]).is_err());
        let config = config(&[("PITCHHUB_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(!config.dev_mode);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PITCHHUB_DEV", "true"),
            ("PITCHHUB_STORE", "memory"),
            ("PITCHHUB_RUN_MIGRATIONS", "false"),
            ("PITCHHUB_TOKEN_TTL_MINUTES", "5"),
            ("PITCHHUB_CORS_ORIGINS", "https://a.example, https://b.example"),
            ("DB_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert!(!config.run_migrations);
        assert_eq!(config.token_ttl, chrono::Duration::minutes(5));
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.database.max_connections, 4);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config(&[("PITCHHUB_DEV", "1"), ("PITCHHUB_STORE", "mongo")]).is_err());
        assert!(config(&[("PITCHHUB_DEV", "1"), ("PITCHHUB_TOKEN_TTL_MINUTES", "0")]).is_err());
        assert!(config(&[("PITCHHUB_DEV", "1"), ("PITCHHUB_LISTEN_ADDR", "nowhere")]).is_err());
    }
}
