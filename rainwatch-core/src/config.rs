use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Environment variable checked before the secrets store.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// API keys section of the secrets store.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ApiKeys {
    pub openweather: Option<String>,
}

/// Secrets stored on disk.
///
/// Example TOML:
/// [api_keys]
/// openweather = "..."
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Secrets {
    #[serde(default)]
    pub api_keys: ApiKeys,
}

/// Where the active API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    SecretsStore,
}

impl std::fmt::Display for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySource::Environment => write!(f, "environment variable {API_KEY_ENV}"),
            KeySource::SecretsStore => f.write_str("secrets store"),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    value: String,
    source: KeySource,
}

impl ApiKey {
    pub fn new(value: impl Into<String>, source: KeySource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn source(&self) -> KeySource {
        self.source
    }
}

// Keep the key itself out of logs and debug output.
impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl Secrets {
    /// Load secrets from the default location, or an empty store if the file
    /// doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::secrets_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;

        let secrets: Secrets = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse secrets file: {}", path.display()))?;

        Ok(secrets)
    }

    /// Save secrets, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create secrets directory: {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("Failed to serialize secrets to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write secrets file: {}", path.display()))?;

        Ok(())
    }

    /// Default path of the secrets file.
    pub fn secrets_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "rainwatch", "rainwatch")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("secrets.toml"))
    }

    pub fn set_openweather_key(&mut self, api_key: String) {
        self.api_keys.openweather = Some(api_key);
    }

    pub fn openweather_key(&self) -> Option<&str> {
        self.api_keys.openweather.as_deref()
    }
}

/// Pick the API key: the environment value first, then the secrets file at
/// `secrets_path`. The file is only read when the environment has no key.
/// Blank values count as absent.
pub fn resolve_api_key(env_value: Option<String>, secrets_path: &Path) -> Result<Option<ApiKey>> {
    if let Some(value) = env_value.and_then(non_blank) {
        return Ok(Some(ApiKey::new(value, KeySource::Environment)));
    }

    let secrets = Secrets::load_from(secrets_path)?;

    Ok(secrets
        .openweather_key()
        .map(str::to_owned)
        .and_then(non_blank)
        .map(|value| ApiKey::new(value, KeySource::SecretsStore)))
}

/// Resolve the API key from the process environment, falling back to the
/// secrets file.
pub fn load_api_key(secrets_path: &Path) -> Result<Option<ApiKey>> {
    resolve_api_key(std::env::var(API_KEY_ENV).ok(), secrets_path)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
