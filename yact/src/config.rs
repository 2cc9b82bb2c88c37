//! yact configuration types and loading

use eyre::{Context, Result, bail, eyre};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::context::ContextStore;

/// Local config file name, looked up in the working directory
pub const LOCAL_CONFIG: &str = ".yact.yml";

/// Model provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Anthropic,
    Deepseek,
    Ollama,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Anthropic, Provider::Deepseek, Provider::Ollama];

    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Deepseek => "deepseek",
            Provider::Ollama => "ollama",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-sonnet-4-20250514",
            Provider::Deepseek => "deepseek-chat",
            Provider::Ollama => "deepseek-coder-v2:16b",
        }
    }

    fn default_base_url(self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::Deepseek => "https://api.deepseek.com",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    fn default_api_key_env(self) -> Option<&'static str> {
        match self {
            Provider::Anthropic => Some("ANTHROPIC_API_KEY"),
            Provider::Deepseek => Some("DEEPSEEK_API_KEY"),
            Provider::Ollama => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| eyre!("unknown provider '{}' (expected anthropic, deepseek or ollama)", s))
    }
}

/// Main yact configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level used when `--log-level` is not given
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,

    /// Provider used when `--provider` is not given
    #[serde(rename = "default-provider")]
    pub default_provider: Provider,

    /// Per-provider overrides
    pub providers: ProvidersConfig,

    /// Conversation log location
    pub context: ContextConfig,

    /// File materialization
    pub write: WriteConfig,

    /// Terminal output
    pub ui: UiConfig,
}

/// Overrides for every provider; unset fields fall back to provider defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub anthropic: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub ollama: ProviderConfig,
}

impl ProvidersConfig {
    pub fn get(&self, provider: Provider) -> &ProviderConfig {
        match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::Deepseek => &self.deepseek,
            Provider::Ollama => &self.ollama,
        }
    }

    fn get_mut(&mut self, provider: Provider) -> &mut ProviderConfig {
        match provider {
            Provider::Anthropic => &mut self.anthropic,
            Provider::Deepseek => &mut self.deepseek,
            Provider::Ollama => &mut self.ollama,
        }
    }
}

/// Settings for one provider as written in the config file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Inline API key, used when the environment variable is unset
    #[serde(rename = "api-key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(rename = "base-url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(rename = "max-tokens", skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(rename = "timeout-ms", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Fully resolved settings handed to a model client
#[derive(Clone, PartialEq)]
pub struct ResolvedProviderConfig {
    pub provider: Provider,
    pub model: String,
    pub api_key_env: Option<String>,
    pub api_key: Option<String>,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl fmt::Debug for ResolvedProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedProviderConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl ResolvedProviderConfig {
    /// API key from the configured environment variable, else the inline key
    pub fn get_api_key(&self) -> Result<String> {
        if let Some(var) = &self.api_key_env
            && let Ok(key) = std::env::var(var)
            && !key.is_empty()
        {
            return Ok(key);
        }

        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Ok(key.clone());
        }

        match &self.api_key_env {
            Some(var) => Err(eyre!(
                "{} API key not found. Set the {} environment variable or run: y config set providers.{}.api-key <key>",
                self.provider,
                var,
                self.provider
            )),
            None => Err(eyre!(
                "{} API key not configured. Run: y config set providers.{}.api-key <key>",
                self.provider,
                self.provider
            )),
        }
    }
}

/// Conversation log settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Log file; defaults to `<config_dir>/yact/context.json`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// File materialization settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Append a newline to written files that lack one
    #[serde(rename = "ensure-trailing-newline")]
    pub ensure_trailing_newline: bool,
}

/// Terminal output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show a spinner on stderr while waiting for the model
    pub spinner: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { spinner: true }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .yact.yml
        let local_config = PathBuf::from(LOCAL_CONFIG);
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/yact/yact.yml
        if let Some(user_config) = Self::user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// `<config_dir>/yact/yact.yml`
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("yact").join("yact.yml"))
    }

    /// File that `config set` edits
    ///
    /// Follows the lookup order of [`Config::load`]: the explicit path, else
    /// `.yact.yml` under `root` when it exists, else the user config.
    pub fn writable_path(config_path: Option<&PathBuf>, root: &Path) -> Result<PathBuf> {
        if let Some(path) = config_path {
            return Ok(path.clone());
        }

        let local_config = root.join(LOCAL_CONFIG);
        if local_config.exists() {
            tracing::debug!(?local_config, "writable_path: using project-local config");
            return Ok(local_config);
        }

        Self::user_config_path().ok_or_else(|| eyre!("could not determine the user config directory"))
    }

    /// Write this configuration as YAML, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir).context(format!("Failed to create config directory {}", dir.display()))?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content).context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Update one setting by its dotted key, e.g. `providers.ollama.model`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        tracing::debug!(%key, "set: called");
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["log-level"] => self.log_level = Some(value.to_string()),
            ["default-provider"] => self.default_provider = value.parse()?,
            ["ui", "spinner"] => self.ui.spinner = parse_bool(key, value)?,
            ["context", "path"] => self.context.path = Some(PathBuf::from(value)),
            ["write", "ensure-trailing-newline"] => self.write.ensure_trailing_newline = parse_bool(key, value)?,
            ["providers", provider, field] => {
                let provider: Provider = provider.parse()?;
                let settings = self.providers.get_mut(provider);
                match *field {
                    "model" => settings.model = Some(value.to_string()),
                    "api-key-env" => settings.api_key_env = Some(value.to_string()),
                    "api-key" => settings.api_key = Some(value.to_string()),
                    "base-url" => settings.base_url = Some(value.trim_end_matches('/').to_string()),
                    "max-tokens" => {
                        settings.max_tokens = Some(value.parse().context(format!("{} expects a number", key))?)
                    }
                    "timeout-ms" => {
                        settings.timeout_ms = Some(value.parse().context(format!("{} expects a number", key))?)
                    }
                    other => bail!("unknown provider setting '{}'", other),
                }
            }
            _ => bail!("unknown config key '{}'", key),
        }
        Ok(())
    }

    /// Merge provider defaults with the configured overrides
    pub fn resolve(&self, provider: Provider) -> ResolvedProviderConfig {
        let settings = self.providers.get(provider);
        ResolvedProviderConfig {
            provider,
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_string()),
            api_key_env: settings
                .api_key_env
                .clone()
                .or_else(|| provider.default_api_key_env().map(str::to_string)),
            api_key: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| provider.default_base_url().to_string()),
            max_tokens: settings.max_tokens.unwrap_or(8192),
            timeout_ms: settings.timeout_ms.unwrap_or(300_000),
        }
    }

    /// Copy with inline API keys replaced by asterisks
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        for provider in Provider::ALL {
            let settings = masked.providers.get_mut(provider);
            if let Some(key) = &settings.api_key {
                settings.api_key = Some("*".repeat(key.chars().count()));
            }
        }
        masked
    }

    /// Configured log path, else the default under the user config dir
    pub fn context_path(&self) -> Result<PathBuf> {
        match &self.context.path {
            Some(path) => Ok(path.clone()),
            None => Ok(ContextStore::default_path()?),
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => bail!("{} expects true or false, got '{}'", key, value),
    }
}

/// Read only the log level from config, before logging is set up
pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
    let candidates: Vec<PathBuf> = match config_path {
        Some(path) => vec![path.clone()],
        None => std::iter::once(PathBuf::from(LOCAL_CONFIG))
            .chain(Config::user_config_path())
            .collect(),
    };

    candidates
        .into_iter()
        .find(|path| path.exists())
        .and_then(|path| fs::read_to_string(path).ok())
        .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
        .and_then(|config| config.log_level)
}
