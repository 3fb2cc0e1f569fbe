//! Server configuration loaded from the environment.
//!
//! # Environment Variables
//!
//! - `TODO_HOST`: listen address (default: `0.0.0.0`)
//! - `TODO_PORT`: listen port (default: `9000`)
//! - `TODO_STORE`: `mongo` (default) | `memory`
//! - `MONGODB_URI`: connection string (default: `mongodb://localhost:27017`)
//! - `TODO_DATABASE`: database name (default: `demo_todo`)
//! - `TODO_COLLECTION`: collection name (default: `todo`)
//! - `TODO_STORE_TIMEOUT_SECS`: deadline for each store call (default: `5`)
//! - `TODO_SHUTDOWN_GRACE_SECS`: drain window after an interrupt (default: `5`)
//! - `TODO_CONNECT_TIMEOUT_SECS`: startup connect/ping bound (default: `10`)
//! - `TODO_REQUEST_TIMEOUT_SECS`: whole-request timeout (default: `60`); must
//!   exceed the store timeout so a slow store is reported as a 504 envelope

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::gateway::DEFAULT_STORE_TIMEOUT;
use crate::lifecycle::DEFAULT_SHUTDOWN_GRACE;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name}={value:?} is not a valid {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("invalid listen address {0:?}")]
    Address(String),

    #[error(
        "TODO_REQUEST_TIMEOUT_SECS ({request:?}) must be longer than \
         TODO_STORE_TIMEOUT_SECS ({store:?})"
    )]
    RequestTimeoutTooShort { request: Duration, store: Duration },
}

/// Which `DocumentStore` implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "in_memory" => Ok(Self::Memory),
            _ => Err(ConfigError::Invalid {
                name: "TODO_STORE",
                value: s.to_string(),
                expected: "store backend (mongo, memory)",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub mongodb_uri: String,
    pub database: String,
    pub collection: String,
    pub store_timeout: Duration,
    pub shutdown_grace: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9000,
            backend: StoreBackend::default(),
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database: "demo_todo".to_string(),
            collection: "todo".to_string(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment, after loading a
    /// `.env` file if one is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that does not
    /// parse, a duration is zero, or the request timeout does not exceed the
    /// store timeout.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup. Unset and
    /// blank variables fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let port = match var("TODO_PORT") {
            Some(value) => parse(&value, "TODO_PORT", "port number")?,
            None => defaults.port,
        };
        let backend = match var("TODO_STORE") {
            Some(value) => value.parse()?,
            None => defaults.backend,
        };

        let store_timeout = seconds(&var, "TODO_STORE_TIMEOUT_SECS", defaults.store_timeout)?;
        let request_timeout =
            seconds(&var, "TODO_REQUEST_TIMEOUT_SECS", defaults.request_timeout)?;
        if request_timeout <= store_timeout {
            return Err(ConfigError::RequestTimeoutTooShort {
                request: request_timeout,
                store: store_timeout,
            });
        }

        Ok(Self {
            host: var("TODO_HOST").unwrap_or(defaults.host),
            port,
            backend,
            mongodb_uri: var("MONGODB_URI").unwrap_or(defaults.mongodb_uri),
            database: var("TODO_DATABASE").unwrap_or(defaults.database),
            collection: var("TODO_COLLECTION").unwrap_or(defaults.collection),
            store_timeout,
            shutdown_grace: seconds(&var, "TODO_SHUTDOWN_GRACE_SECS", defaults.shutdown_grace)?,
            connect_timeout: seconds(&var, "TODO_CONNECT_TIMEOUT_SECS", defaults.connect_timeout)?,
            request_timeout,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Address(raw))
    }
}

fn parse<T: FromStr>(value: &str, name: &'static str, expected: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
        expected,
    })
}

fn seconds<F>(var: &F, name: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = var(name) else {
        return Ok(default);
    };
    let secs: u64 = parse(&value, name, "number of seconds")?;
    if secs == 0 {
        return Err(ConfigError::ZeroDuration(name));
    }
    Ok(Duration::from_secs(secs))
}
