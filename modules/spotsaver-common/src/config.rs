use std::str::FromStr;

use anyhow::{Context, Result};

use crate::error::SpotSaverError;

/// What happens to an optimistically added spot when its database insert fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertFailurePolicy {
    /// Keep the local entry, flagged as unsaved.
    #[default]
    Keep,
    /// Remove the local entry again.
    Rollback,
}

impl FromStr for InsertFailurePolicy {
    type Err = SpotSaverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(InsertFailurePolicy::Keep),
            "rollback" => Ok(InsertFailurePolicy::Rollback),
            other => Err(SpotSaverError::Config(format!(
                "INSERT_FAILURE_POLICY must be `keep` or `rollback`, got `{other}`"
            ))),
        }
    }
}

impl std::fmt::Display for InsertFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InsertFailurePolicy::Keep => write!(f, "keep"),
            InsertFailurePolicy::Rollback => write!(f, "rollback"),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // Geocoding
    pub geocode_url: String,

    // Web server
    pub api_host: String,
    pub api_port: u16,

    // Store
    pub insert_failure_policy: InsertFailurePolicy,
}

impl Config {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_vars(|key| std::env::var(key).ok())?;
        config.log_keys();
        Ok(config)
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            database_url: var("DATABASE_URL").context("DATABASE_URL environment variable is required")?,
            database_max_connections: var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a number")?,
            geocode_url: var("GEOCODE_URL").unwrap_or_else(|| "http://localhost:4000".to_string()),
            api_host: var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: var("API_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("API_PORT must be a number")?,
            insert_failure_policy: match var("INSERT_FAILURE_POLICY") {
                Some(value) => value.parse()?,
                None => InsertFailurePolicy::default(),
            },
        })
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!("  GEOCODE_URL: {}", self.geocode_url);
        tracing::info!("  API: {}:{}", self.api_host, self.api_port);
        tracing::info!("  INSERT_FAILURE_POLICY: {}", self.insert_failure_policy);
    }
}

/// First few characters of a secret, for logs.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(11).collect();
    format!("{}...({} chars)", head, val.chars().count())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/spots")])).unwrap();
        assert_eq!(config.geocode_url, "http://localhost:4000");
        assert_eq!(config.api_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.insert_failure_policy, InsertFailurePolicy::Keep);
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(Config::from_vars(vars(&[])).is_err());
    }

    #[test]
    fn policy_and_port_are_parsed() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/spots"),
            ("API_PORT", "8080"),
            ("INSERT_FAILURE_POLICY", "Rollback"),
        ]))
        .unwrap();
        assert_eq!(config.api_port, 8080);
        assert_eq!(config.insert_failure_policy, InsertFailurePolicy::Rollback);
    }

    #[test]
    fn bad_policy_is_rejected() {
        let result = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://localhost/spots"),
            ("INSERT_FAILURE_POLICY", "retry"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn preview_never_splits_a_character() {
        assert_eq!(preview("postgres://user:pw@db/spots"), "postgres://...(27 chars)");
        assert_eq!(preview("pöstgrés://ü"), "pöstgrés://...(12 chars)");
        assert_eq!(preview("ab"), "ab...(2 chars)");
    }
}
