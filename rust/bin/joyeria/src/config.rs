//! Client configuration.
//!
//! Reads/writes `~/.joyeria/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const DEFAULT_SERVER: &str = "http://localhost:4000/api";

/// Client configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL (e.g. "http://localhost:4000/api").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// Session file (default: ~/.joyeria/session.redb).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub session_path: String,
}

impl ClientConfig {
    /// Default config file path: ~/.joyeria/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Server URL, with `--server` taking precedence over the file.
    pub fn server_url(&self, flag: Option<&str>) -> String {
        let server = match flag {
            Some(s) if !s.is_empty() => s,
            _ if !self.server.is_empty() => self.server.as_str(),
            _ => DEFAULT_SERVER,
        };
        server.trim_end_matches('/').to_string()
    }

    pub fn session_file(&self) -> PathBuf {
        if self.session_path.is_empty() {
            dirs_path().join("session.redb")
        } else {
            PathBuf::from(&self.session_path)
        }
    }
}

/// Return the joyeria config directory (~/.joyeria).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".joyeria")
}
