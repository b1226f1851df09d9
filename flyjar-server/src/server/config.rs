use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_CORS_ORIGIN: &str = "https://proyectozyxaval.vercel.app";
pub const DEFAULT_DB_PATH: &str = "database.sqlite";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
/// Bounds accepted by `bcrypt::hash`.
pub const MIN_BCRYPT_COST: u32 = 4;
pub const MAX_BCRYPT_COST: u32 = 31;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Single origin allowed for cross-origin requests. `None` disables CORS.
    pub cors_origin: Option<String>,
    pub listen_port: Option<u16>,
    pub db_path: Option<String>,
    pub bcrypt_cost: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cors_origin: Some(DEFAULT_CORS_ORIGIN.to_string()),
            listen_port: None,
            db_path: None,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid bcrypt_cost {0}: must be between 4 and 31")]
    BcryptCost(u32),
}

impl AppConfig {
    /// Loads `CONFIG_PATH` if set, else `./config.yaml` when it exists,
    /// else the built-in defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match env::var("CONFIG_PATH") {
            Ok(path) => Self::load_from_path(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::load_from_path(DEFAULT_CONFIG_PATH)
            }
            Err(_) => {
                tracing::info!("no config file found; using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        // An empty file parses as YAML null
        let cfg: Option<AppConfig> = serde_yaml::from_str(text)?;
        let cfg = cfg.unwrap_or_default();
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cfg.bcrypt_cost) {
            return Err(ConfigError::BcryptCost(cfg.bcrypt_cost));
        }
        Ok(cfg)
    }

    /// `DB_PATH` overrides `db_path`.
    pub fn resolved_db_path(&self) -> String {
        env::var("DB_PATH")
            .ok()
            .or_else(|| self.db_path.clone())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string())
    }

    /// `PORT` overrides `listen_port`.
    pub fn resolved_port(&self) -> u16 {
        env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .or(self.listen_port)
            .unwrap_or(DEFAULT_PORT)
    }
}
