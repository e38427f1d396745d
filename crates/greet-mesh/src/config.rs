//! Service configuration from environment variables.
//!
//! Unset or empty variables fall back to their defaults, and every fallback
//! is logged. A variable that is set but does not parse is an error.

use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::info;

pub const HELLO_PORT: u16 = 3000;
pub const WORLD_PORT: u16 = 3001;
pub const GATEWAY_PORT: u16 = 3002;
pub const DEFAULT_GREETING: &str = "Hello";
pub const DEFAULT_NAME: &str = "World!";
pub const DEFAULT_HELLO_URL: &str = "http://localhost:3000/greet";
pub const DEFAULT_WORLD_URL: &str = "http://localhost:3001/name";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// `hello-service` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloConfig {
    pub port: u16,
    pub greeting: String,
}

impl HelloConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load(&lookup, "PORT", HELLO_PORT)?,
            greeting: text(&lookup, "GREETING", DEFAULT_GREETING),
        })
    }
}

/// `world-service` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldConfig {
    pub port: u16,
    pub name: String,
}

impl WorldConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load(&lookup, "PORT", WORLD_PORT)?,
            name: text(&lookup, "NAME", DEFAULT_NAME),
        })
    }
}

/// `gateway` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub port: u16,
    pub hello_url: String,
    pub world_url: String,
}

impl GatewayConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: try_load(&lookup, "PORT", GATEWAY_PORT)?,
            hello_url: text(&lookup, "HELLO_URL", DEFAULT_HELLO_URL),
            world_url: text(&lookup, "WORLD_URL", DEFAULT_WORLD_URL),
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|value| !value.is_empty())
}

fn text(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    var(lookup, key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}

fn try_load<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(value) = var(lookup, key) else {
        info!("{key} not set, using default: {default}");
        return Ok(default);
    };
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value,
        reason: e.to_string(),
    })
}
