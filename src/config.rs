//! Client configuration: where the service lives and who we are on it.
//!
//! Two JSON files live in the config directory (by default
//! `~/.config/fomolt/cli`): `config.json`, a flat map of settings, and
//! `credentials.json`, the operator agent's API key. Command-line flags and
//! environment variables take precedence over both.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, DEFAULT_API_URL};

const CONFIG_FILE: &str = "config.json";
const CREDENTIALS_FILE: &str = "credentials.json";

/// Settings key overriding the API base URL.
pub const API_URL_KEY: &str = "apiUrl";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Not authenticated. Run: fomolt auth register")]
    NoCredentials,

    #[error("Failed to read {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },

    #[error("HOME is not set; pass --config-dir")]
    NoHome,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::NoCredentials => "NO_CREDENTIALS",
            _ => "CONFIG_ERROR",
        }
    }
}

/// Stored identity of the operator's agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub api_key: String,
    pub name: String,
}

/// Older layout: `{ "<agent>": { apiKey, username, ... } }`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyCredentials {
    api_key: Option<String>,
    username: Option<String>,
}

/// Contents of `config.json`.
pub type Settings = BTreeMap<String, String>;

pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
    Ok(PathBuf::from(home).join(".config").join("fomolt").join("cli"))
}

fn read_json(path: &Path) -> Result<Option<Value>, ConfigError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ConfigError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| ConfigError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_json<T: Serialize>(dir: &Path, file: &str, value: &T) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(file);
    let mut body = serde_json::to_string_pretty(value)?;
    body.push('\n');
    fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict {}", path.display()))?;
    }

    Ok(())
}

/// Load stored credentials, accepting both the current and the legacy layout.
pub fn load_credentials(dir: &Path) -> Result<Option<Credentials>, ConfigError> {
    Ok(read_json(&dir.join(CREDENTIALS_FILE))?.and_then(parse_credentials))
}

fn parse_credentials(raw: Value) -> Option<Credentials> {
    if let Ok(creds) = serde_json::from_value::<Credentials>(raw.clone()) {
        if !creds.api_key.is_empty() && !creds.name.is_empty() {
            return Some(creds);
        }
    }

    let Value::Object(map) = raw else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }

    let (agent, entry) = map.into_iter().next()?;
    let legacy: LegacyCredentials = serde_json::from_value(entry).ok()?;
    let api_key = legacy.api_key.filter(|k| !k.is_empty())?;

    debug!(agent = %agent, "Loaded legacy credentials");
    Some(Credentials {
        api_key,
        name: legacy.username.unwrap_or(agent),
    })
}

pub fn load_settings(dir: &Path) -> Result<Settings, ConfigError> {
    let path = dir.join(CONFIG_FILE);
    match read_json(&path)? {
        None => Ok(Settings::new()),
        Some(raw) => serde_json::from_value(raw).map_err(|e| ConfigError::Unreadable {
            path,
            reason: e.to_string(),
        }),
    }
}

pub fn save_settings(dir: &Path, settings: &Settings) -> Result<()> {
    write_json(dir, CONFIG_FILE, settings)
}

/// Resolved connection details for one command.
#[derive(Debug, Clone)]
pub struct Context {
    pub api_url: String,
    pub config_dir: PathBuf,
    api_key: Option<String>,
}

impl Context {
    /// Merge flags with the config directory. Flags win; the API URL falls
    /// back to `config.json` and then to the public service.
    pub fn resolve(
        api_url: Option<String>,
        api_key: Option<String>,
        config_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => default_config_dir()?,
        };

        let api_url = match api_url {
            Some(url) => url,
            None => load_settings(&config_dir)?
                .remove(API_URL_KEY)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        };

        Ok(Self {
            api_url,
            config_dir,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Client for public endpoints. Never carries a credential.
    pub fn reader(&self) -> Result<ApiClient> {
        ApiClient::reader(&self.api_url)
    }

    /// Client acting as the operator's agent.
    pub fn trader(&self) -> Result<ApiClient> {
        let api_key = match &self.api_key {
            Some(key) => key.clone(),
            None => load_credentials(&self.config_dir)?
                .map(|c| c.api_key)
                .ok_or(ConfigError::NoCredentials)?,
        };
        ApiClient::trader(&self.api_url, api_key)
    }
}
