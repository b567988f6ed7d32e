//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default front-end origins allowed by CORS when no config file overrides
/// them. The experiment runner is a browser app served separately.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:3000", "http://127.0.0.1:3000"];

/// Service settings read from the optional `[service]` table of config.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Port the HTTP API binds to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS origin allow-list. Open access otherwise: no authentication is
    /// enforced on any endpoint.
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}

fn default_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            allowed_origins: default_origins(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    root_folder: Option<PathBuf>,
    #[serde(default)]
    service: Option<ServiceConfig>,
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, env_var_name: &str) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    if let Ok(config) = load_config_file() {
        if let Some(root_folder) = config.root_folder {
            return root_folder;
        }
    }

    default_root_folder()
}

/// Load service settings from the config file, falling back to compiled
/// defaults when the file or the `[service]` table is absent.
pub fn load_service_config() -> ServiceConfig {
    match load_config_file() {
        Ok(config) => config.service.unwrap_or_default(),
        Err(_) => ServiceConfig::default(),
    }
}

/// Database file path under the resolved root folder.
pub fn database_path(root_folder: &Path) -> PathBuf {
    root_folder.join("symex.db")
}

/// Ensure the root folder exists before the database is opened inside it.
pub fn ensure_root_folder(root_folder: &Path) -> Result<()> {
    std::fs::create_dir_all(root_folder)?;
    Ok(())
}

fn load_config_file() -> Result<ConfigFile> {
    let path = config_file_path()?;
    let contents = std::fs::read_to_string(&path)?;
    toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Config file location: `~/.config/symex/config.toml` (or the platform
/// equivalent), then `/etc/symex/config.toml` on Linux.
fn config_file_path() -> Result<PathBuf> {
    if let Some(user_config) = dirs::config_dir().map(|d| d.join("symex").join("config.toml")) {
        if user_config.exists() {
            return Ok(user_config);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/symex/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("symex"))
        .unwrap_or_else(|| PathBuf::from("./symex_data"))
}
