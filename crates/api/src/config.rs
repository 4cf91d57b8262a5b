//! Process configuration from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 1024;
pub const DEFAULT_AUDIT_BODY_LIMIT: usize = 64 * 1024;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    /// In-memory stores are used when unset.
    pub database_url: Option<String>,
    pub audit_queue_capacity: usize,
    /// Request bodies larger than this are recorded as a size marker only.
    pub audit_body_limit: usize,
    /// Seed an active admin with this email at start-up if none exists.
    pub bootstrap_admin_email: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_JWT_SECRET.to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            audit_queue_capacity: DEFAULT_AUDIT_QUEUE_CAPACITY,
            audit_body_limit: DEFAULT_AUDIT_BODY_LIMIT,
            bootstrap_admin_email: None,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                message: e.to_string(),
            })?;

        Ok(Self {
            jwt_secret,
            bind_addr,
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            audit_queue_capacity: parse_usize(&lookup, "AUDIT_QUEUE_CAPACITY", DEFAULT_AUDIT_QUEUE_CAPACITY)?,
            audit_body_limit: parse_usize(&lookup, "AUDIT_BODY_LIMIT", DEFAULT_AUDIT_BODY_LIMIT)?,
            bootstrap_admin_email: lookup("BOOTSTRAP_ADMIN_EMAIL").filter(|s| !s.is_empty()),
        })
    }
}

fn parse_usize<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
    }
}
