use salesdesk_shared::auth::Role;
use serde::Deserialize;
use std::{env, fs, path::Path};

/// Commission rate applied when a user entry does not set one.
pub const DEFAULT_COMMISSION_RATE_PERCENT: f64 = 10.0;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub jwt_secret: String,
    /// Shared secret the point-of-sale provider sends in
    /// `x-webhook-signature`. When unset, only header presence is checked.
    pub webhook_secret: Option<String>,
    pub users: Vec<UserConfig>,
    /// IANA timezone name for presence/day calculations.
    pub timezone: Option<String>,
    pub dev_cors_origin: Option<String>,
    pub listen_port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password_hash: String, // bcrypt hash
    pub role: Role,
    /// Name matching the seller name on purchase rows.
    pub display_name: String,
    pub commission_rate_percent: Option<f64>,
}

impl UserConfig {
    pub fn commission_rate(&self) -> f64 {
        self.commission_rate_percent
            .unwrap_or(DEFAULT_COMMISSION_RATE_PERCENT)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Yaml(e) => write!(f, "YAML error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        ConfigError::Yaml(value)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        Self::load_from_path(path)
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path)?;
        let cfg: AppConfig = serde_yaml::from_str(&text)?;
        Ok(cfg)
    }

    pub fn user(&self, username: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn reporting_tz(&self) -> chrono_tz::Tz {
        self.timezone
            .as_deref()
            .and_then(|name| name.parse().ok())
            .unwrap_or(chrono_tz::Europe::Stockholm)
    }
}
