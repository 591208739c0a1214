use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::import::ImportEncoding;
use crate::core::punch::DEFAULT_CANCEL_WINDOW_SECONDS;
use crate::errors::{AppError, AppResult};
use crate::utils::path::resolve_in;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_tenant")]
    pub tenant_id: i64,
    #[serde(default = "default_cancel_window")]
    pub cancel_window_seconds: i64,
    #[serde(default = "default_geocode_timeout")]
    pub geocode_timeout_ms: u64,
    #[serde(default)]
    pub import_encoding: ImportEncoding,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_database() -> String {
    Config::database_file().to_string_lossy().to_string()
}
fn default_tenant() -> i64 {
    1
}
fn default_cancel_window() -> i64 {
    DEFAULT_CANCEL_WINDOW_SECONDS
}
fn default_geocode_timeout() -> u64 {
    1500
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            tenant_id: default_tenant(),
            cancel_window_seconds: default_cancel_window(),
            geocode_timeout_ms: default_geocode_timeout(),
            import_encoding: ImportEncoding::default(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rkintai")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rkintai")
        }
    }

    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rkintai.conf")
    }

    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rkintai.sqlite")
    }

    /// Load the configuration file, or defaults when it does not exist.
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Create the config directory, write the file (unless `is_test`) and
    /// return the database path to initialise.
    pub fn init_all(custom_db: Option<&str>, is_test: bool) -> AppResult<Self> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;

        let db_path = match custom_db {
            Some(name) => resolve_in(&dir, name),
            None => Self::database_file(),
        };

        let config = Config {
            database: db_path.to_string_lossy().to_string(),
            ..Self::default()
        };

        if !is_test {
            fs::write(Self::config_file(), config.to_yaml()?)?;
        }

        Ok(config)
    }
}
