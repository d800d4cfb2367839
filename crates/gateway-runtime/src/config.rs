//! # Configuration Loading
//!
//! `GatewayConfig` is read once at startup:
//!
//! 1. defaults
//! 2. TOML file named by `GW_CONFIG` (optional)
//! 3. environment overrides
//!
//! | Variable | Field |
//! |----------|-------|
//! | `GW_JWT_VALIDATION_ENABLED` | `auth.validation_enabled` |
//! | `GW_TRUSTED_REALMS` | `auth.trusted_realms` (comma separated) |
//! | `GW_TRUST_AUTHORITY_URL` | `auth.trust_authority_url` |
//! | `GW_MAX_INLINE_PAYLOAD_BYTES` | `response.max_inline_payload_bytes` |

use gateway_core::{ConfigError, GatewayConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_PATH_VAR: &str = "GW_CONFIG";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value {value:?} for {var}")]
    InvalidOverride { var: &'static str, value: String },

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Loads configuration from `GW_CONFIG` and the process environment.
pub fn load() -> Result<GatewayConfig, LoadError> {
    let path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
    load_from(path.as_deref(), |var| std::env::var(var).ok())
}

/// Loads configuration from an optional file and an environment lookup.
pub fn load_from<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, LoadError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            info!(path = %path.display(), "Loaded configuration file");
            toml::from_str(&text).map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => GatewayConfig::default(),
    };

    apply_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn apply_overrides<F>(config: &mut GatewayConfig, env: F) -> Result<(), LoadError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env("GW_JWT_VALIDATION_ENABLED") {
        config.auth.validation_enabled =
            parse_bool(&value).ok_or(LoadError::InvalidOverride {
                var: "GW_JWT_VALIDATION_ENABLED",
                value,
            })?;
    }

    if let Some(value) = env("GW_TRUSTED_REALMS") {
        config.auth.trusted_realms = value
            .split(',')
            .map(str::trim)
            .filter(|realm| !realm.is_empty())
            .map(str::to_owned)
            .collect();
    }

    if let Some(value) = env("GW_TRUST_AUTHORITY_URL") {
        config.auth.trust_authority_url = value;
    }

    if let Some(value) = env("GW_MAX_INLINE_PAYLOAD_BYTES") {
        config.response.max_inline_payload_bytes =
            value.trim().parse().map_err(|_| LoadError::InvalidOverride {
                var: "GW_MAX_INLINE_PAYLOAD_BYTES",
                value: value.clone(),
            })?;
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
