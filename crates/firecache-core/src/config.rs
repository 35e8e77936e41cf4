//! Configuration module
//!
//! Server settings are read from the environment (and `.env`) once at
//! startup. The cache pipeline itself only ever sees a [`CacheConfig`].

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_STORAGE_HOST;

const SERVER_PORT: u16 = 8000;
const CACHE_DIR: &str = "./cache";
const ORIGIN_TIMEOUT_SECS: u64 = 30;
const HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Settings handed to the asset cache at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Root directory mirroring the canonical path hierarchy
    pub cache_root: PathBuf,
    /// Authority (`host` or `host:port`) of the storage front end
    pub storage_host: String,
    /// Upper bound for a single origin request
    pub origin_timeout: Duration,
}

impl CacheConfig {
    pub fn new(cache_root: impl Into<PathBuf>, storage_host: impl Into<String>) -> Self {
        Self {
            cache_root: cache_root.into(),
            storage_host: storage_host.into(),
            origin_timeout: Duration::from_secs(ORIGIN_TIMEOUT_SECS),
        }
    }

    pub fn with_origin_timeout(mut self, timeout: Duration) -> Self {
        self.origin_timeout = timeout;
        self
    }
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ProxyConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub http_concurrency_limit: usize,
    pub environment: String,
    pub cache: CacheConfig,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ProxyConfig>);

impl Config {
    fn inner(&self) -> &ProxyConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.inner().environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ProxyConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().http_concurrency_limit
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn cache_config(&self) -> &CacheConfig {
        &self.inner().cache
    }
}

fn is_production_name(environment: &str) -> bool {
    let environment = environment.to_lowercase();
    environment == "production" || environment == "prod"
}

impl ProxyConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let origin_timeout_secs = env::var("ORIGIN_TIMEOUT_SECS")
            .unwrap_or_else(|_| ORIGIN_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("ORIGIN_TIMEOUT_SECS must be a valid number"))?;

        let cache = CacheConfig {
            cache_root: PathBuf::from(
                env::var("CACHE_DIR").unwrap_or_else(|_| CACHE_DIR.to_string()),
            ),
            storage_host: env::var("STORAGE_HOST")
                .unwrap_or_else(|_| DEFAULT_STORAGE_HOST.to_string())
                .trim()
                .to_string(),
            origin_timeout: Duration::from_secs(origin_timeout_secs),
        };

        let config = ProxyConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            http_concurrency_limit: env::var("HTTP_CONCURRENCY_LIMIT")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT)
                .max(1),
            environment,
            cache,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.cache.cache_root.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("CACHE_DIR must not be empty"));
        }

        if self.cache.storage_host.is_empty() || self.cache.storage_host.contains('/') {
            return Err(anyhow::anyhow!(
                "STORAGE_HOST must be a bare host or host:port"
            ));
        }

        if self.cache.origin_timeout.is_zero() {
            return Err(anyhow::anyhow!("ORIGIN_TIMEOUT_SECS must be greater than 0"));
        }

        if is_production_name(&self.environment) && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        Ok(())
    }
}
