//! Runtime configuration, read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `PORT` | `4000` |
//! | `BIND_ADDR` | `0.0.0.0` |
//! | `PUBLIC_URL` | `http://localhost:<PORT>` |
//! | `JWT` | required |
//! | `TOKEN_TTL_HOURS` | `24` |
//! | `UPLOADS_DIR` | `uploads` |
//! | `DATA_FILE` | unset (in-memory store) |
//! | `BCRYPT_COST` | `10` |
//! | `IMAGE_MAX_WIDTH` | `1200` |

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Base of the absolute image URLs returned to clients, no trailing slash.
    pub public_url: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub uploads_dir: PathBuf,
    pub data_file: Option<PathBuf>,
    pub bcrypt_cost: u32,
    pub image_max_width: u32,
}

impl Config {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = try_load(&lookup, "PORT", "4000")?;
        let bind_addr: String = try_load(&lookup, "BIND_ADDR", "0.0.0.0")?;
        let public_url = lookup("PUBLIC_URL")
            .unwrap_or_else(|| {
                let default = format!("http://localhost:{port}");
                info!("PUBLIC_URL not set, using default: {default}");
                default
            })
            .trim_end_matches('/')
            .to_string();

        let jwt_secret = lookup("JWT")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT"))?;

        let ttl_hours: u64 = try_load(&lookup, "TOKEN_TTL_HOURS", "24")?;
        let uploads_dir: PathBuf = try_load(&lookup, "UPLOADS_DIR", "uploads")?;
        let data_file = lookup("DATA_FILE")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);

        let bcrypt_cost: u32 = try_load(&lookup, "BCRYPT_COST", "10")?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".into(),
            });
        }

        let image_max_width: u32 = try_load(&lookup, "IMAGE_MAX_WIDTH", "1200")?;

        let token_ttl = ttl_hours
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                value: ttl_hours.to_string(),
                reason: "too large".into(),
            })?;

        Ok(Self {
            bind_addr,
            port,
            public_url,
            jwt_secret,
            token_ttl,
            uploads_dir,
            data_file,
            bcrypt_cost,
            image_max_width,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn try_load<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError::Invalid {
            key,
            value: value.clone(),
            reason: e.to_string(),
        }
    })
}
