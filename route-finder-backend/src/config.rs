//! Server configuration, read from `ROUTE_FINDER_*` environment variables.

use std::{path::PathBuf, sync::Arc};

use chrono::Duration;
use thiserror::Error;

use crate::route_store::{CachedRouteStore, CsvRouteStore, HttpRouteStore, RouteStore, StoreError};

pub const HOST_VAR: &str = "ROUTE_FINDER_HOST";
pub const PORT_VAR: &str = "ROUTE_FINDER_PORT";
pub const ROUTES_CSV_VAR: &str = "ROUTE_FINDER_ROUTES_CSV";
pub const ROUTES_URL_VAR: &str = "ROUTE_FINDER_ROUTES_URL";
pub const CACHE_TTL_VAR: &str = "ROUTE_FINDER_CACHE_TTL_SECS";
pub const STATIC_DIR_VAR: &str = "ROUTE_FINDER_STATIC_DIR";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CACHE_TTL_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("No route source configured, set ROUTE_FINDER_ROUTES_CSV or ROUTE_FINDER_ROUTES_URL.")]
    MissingRouteSource,
    #[error("Both ROUTE_FINDER_ROUTES_CSV and ROUTE_FINDER_ROUTES_URL are set, pick one.")]
    ConflictingRouteSource,
    #[error("Invalid value {value:?} for {key}.")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteSource {
    Csv(PathBuf),
    Http(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub route_source: RouteSource,
    /// `None` when caching is disabled
    pub cache_ttl: Option<Duration>,
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get(PORT_VAR) {
            Some(v) => v.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                key: PORT_VAR,
                value: v.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let route_source = match (get(ROUTES_CSV_VAR), get(ROUTES_URL_VAR)) {
            (Some(path), None) => RouteSource::Csv(PathBuf::from(path)),
            (None, Some(url)) => RouteSource::Http(url),
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingRouteSource),
            (None, None) => return Err(ConfigError::MissingRouteSource),
        };

        let ttl_secs = match get(CACHE_TTL_VAR) {
            Some(v) => v
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|secs| *secs >= 0)
                .ok_or(ConfigError::InvalidValue {
                    key: CACHE_TTL_VAR,
                    value: v.clone(),
                })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };

        Ok(ServerConfig {
            host: get(HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            route_source,
            cache_ttl: (ttl_secs > 0).then(|| Duration::seconds(ttl_secs)),
            static_dir: get(STATIC_DIR_VAR).map(PathBuf::from),
        })
    }

    pub fn build_store(&self) -> Result<Arc<dyn RouteStore>, StoreError> {
        let store: Arc<dyn RouteStore> = match (&self.route_source, self.cache_ttl) {
            (RouteSource::Csv(path), None) => Arc::new(CsvRouteStore::new(path.clone())),
            (RouteSource::Csv(path), Some(ttl)) => {
                Arc::new(CachedRouteStore::new(CsvRouteStore::new(path.clone()), ttl))
            }
            (RouteSource::Http(url), None) => Arc::new(HttpRouteStore::new(url.clone())?),
            (RouteSource::Http(url), Some(ttl)) => {
                Arc::new(CachedRouteStore::new(HttpRouteStore::new(url.clone())?, ttl))
            }
        };
        Ok(store)
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[(ROUTES_CSV_VAR, "routes.csv")]).unwrap();

        assert_eq!(
            config,
            ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                route_source: RouteSource::Csv(PathBuf::from("routes.csv")),
                cache_ttl: Some(Duration::seconds(300)),
                static_dir: None,
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (HOST_VAR, "0.0.0.0"),
            (PORT_VAR, "3000"),
            (ROUTES_URL_VAR, "http://mongo-gateway/directRoutes"),
            (CACHE_TTL_VAR, "0"),
            (STATIC_DIR_VAR, "www"),
        ])
        .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(
            config.route_source,
            RouteSource::Http("http://mongo-gateway/directRoutes".to_string())
        );
        assert_eq!(config.cache_ttl, None);
        assert_eq!(config.static_dir, Some(PathBuf::from("www")));
    }

    #[test]
    fn test_route_source_required() {
        assert_eq!(config_from(&[]), Err(ConfigError::MissingRouteSource));
        assert_eq!(
            config_from(&[(ROUTES_CSV_VAR, "  ")]),
            Err(ConfigError::MissingRouteSource)
        );
        assert_eq!(
            config_from(&[(ROUTES_CSV_VAR, "routes.csv"), (ROUTES_URL_VAR, "http://x")]),
            Err(ConfigError::ConflictingRouteSource)
        );
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            config_from(&[(ROUTES_CSV_VAR, "routes.csv"), (PORT_VAR, "eighty")]),
            Err(ConfigError::InvalidValue {
                key: PORT_VAR,
                value: "eighty".to_string()
            })
        );
        assert_eq!(
            config_from(&[(ROUTES_CSV_VAR, "routes.csv"), (CACHE_TTL_VAR, "-1")]),
            Err(ConfigError::InvalidValue {
                key: CACHE_TTL_VAR,
                value: "-1".to_string()
            })
        );
    }
}
