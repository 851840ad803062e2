//! Configuration loading, validation, and management for termpilot.
//!
//! Loads configuration from `~/.termpilot/config.toml`, then a `.env` file
//! found from the current directory upward, then environment variable
//! overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use termpilot_core::{AgentConfig, TrimPolicy};

/// Keys shipped in `.env.example` files; treated as unset.
const PLACEHOLDER_KEYS: &[&str] = &["sk-ant-xxxxx", "sk-xxxxx"];

/// The LLM backends termpilot can talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Claude,
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
    Demo,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [Self::Claude, Self::OpenAi, Self::Ollama, Self::Demo];

    /// The symbolic name used on the command line and in config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Claude => "claude",
            Self::OpenAi => "openai",
            Self::Ollama => "ollama",
            Self::Demo => "demo",
        }
    }

    /// Environment variable holding this backend's API key, if it needs one.
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Claude => Some("ANTHROPIC_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::Ollama | Self::Demo => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Claude => "Anthropic Messages API",
            Self::OpenAi => "OpenAI Chat Completions API",
            Self::Ollama => "Local Ollama server (OpenAI-compatible)",
            Self::Demo => "Offline scripted demo, no network",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "claude" | "anthropic" => Ok(Self::Claude),
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            "demo" => Ok(Self::Demo),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// The root configuration structure.
///
/// Maps directly to `~/.termpilot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Provider used when `--model` is not given
    #[serde(default = "default_provider")]
    pub default_provider: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anthropic_api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,

    /// Base URL of the Ollama OpenAI-compatible endpoint
    #[serde(default = "default_ollama_base_url")]
    pub ollama_base_url: String,

    /// Model per provider
    #[serde(default)]
    pub models: ModelsConfig,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

fn default_provider() -> String {
    "claude".into()
}
fn default_ollama_base_url() -> String {
    "http://localhost:11434/v1".into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("default_provider", &self.default_provider)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("ollama_base_url", &self.ollama_base_url)
            .field("models", &self.models)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_claude_model")]
    pub claude: String,

    #[serde(default = "default_openai_model")]
    pub openai: String,

    #[serde(default = "default_ollama_model")]
    pub ollama: String,
}

fn default_claude_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_openai_model() -> String {
    "gpt-4o".into()
}
fn default_ollama_model() -> String {
    "qwen2.5:0.5b".into()
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            claude: default_claude_model(),
            openai: default_openai_model(),
            ollama: default_ollama_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Default `terminal` timeout when the model does not pass one
    #[serde(default = "default_terminal_timeout")]
    pub terminal_timeout_secs: u64,

    /// Upper bound on any `terminal` timeout the model asks for
    #[serde(default = "default_terminal_max_timeout")]
    pub terminal_max_timeout_secs: u64,

    #[serde(default = "default_git_timeout")]
    pub git_timeout_secs: u64,
}

fn default_terminal_timeout() -> u64 {
    60
}
fn default_terminal_max_timeout() -> u64 {
    300
}
fn default_git_timeout() -> u64 {
    30
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            terminal_timeout_secs: default_terminal_timeout(),
            terminal_max_timeout_secs: default_terminal_max_timeout(),
            git_timeout_secs: default_git_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.termpilot/config.toml).
    ///
    /// Then loads `.env` (if any) and applies environment overrides:
    /// - `ANTHROPIC_API_KEY`
    /// - `OPENAI_API_KEY`
    /// - `TERMPILOT_DEFAULT_PROVIDER`
    /// - `OLLAMA_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!("Ignoring unreadable .env file: {e}"),
        }

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(provider) = get("TERMPILOT_DEFAULT_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(url) = get("OLLAMA_BASE_URL") {
            self.ollama_base_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".termpilot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }

        if self.agent.max_history_messages == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_history_messages must be at least 1".into(),
            ));
        }

        if self.tools.terminal_timeout_secs > self.tools.terminal_max_timeout_secs {
            return Err(ConfigError::ValidationError(
                "tools.terminal_timeout_secs must not exceed tools.terminal_max_timeout_secs".into(),
            ));
        }

        Ok(())
    }

    /// The usable API key for `kind`, if any. Placeholder keys count as unset.
    pub fn api_key(&self, kind: ProviderKind) -> Option<&str> {
        let key = match kind {
            ProviderKind::Claude => self.anthropic_api_key.as_deref(),
            ProviderKind::OpenAi => self.openai_api_key.as_deref(),
            ProviderKind::Ollama | ProviderKind::Demo => return None,
        };
        key.map(str::trim)
            .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(k))
    }

    /// The configured model for `kind`.
    pub fn model(&self, kind: ProviderKind) -> &str {
        match kind {
            ProviderKind::Claude => &self.models.claude,
            ProviderKind::OpenAi => &self.models.openai,
            ProviderKind::Ollama => &self.models.ollama,
            ProviderKind::Demo => "demo",
        }
    }

    /// Whether `kind` has everything it needs to be built.
    pub fn is_available(&self, kind: ProviderKind) -> bool {
        kind.api_key_env().is_none() || self.api_key(kind).is_some()
    }

    /// Resolve a symbolic provider name and check its credentials.
    pub fn validate_provider(&self, name: &str) -> Result<ProviderKind, ConfigError> {
        let kind: ProviderKind = name.parse()?;
        match kind.api_key_env() {
            Some(env_var) if self.api_key(kind).is_none() => Err(ConfigError::MissingApiKey {
                provider: kind.to_string(),
                env_var: env_var.to_string(),
            }),
            _ => Ok(kind),
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// The effective configuration as TOML with API keys redacted.
    pub fn redacted_toml(&self) -> String {
        let mut shown = self.clone();
        for key in [&mut shown.anthropic_api_key, &mut shown.openai_api_key] {
            if key.is_some() {
                *key = Some("[REDACTED]".into());
            }
        }
        toml::to_string_pretty(&shown).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            anthropic_api_key: None,
            openai_api_key: None,
            ollama_base_url: default_ollama_base_url(),
            models: ModelsConfig::default(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Unknown provider '{0}' (expected one of: claude, openai, ollama, demo)")]
    UnknownProvider(String),

    #[error("No API key for {provider}: set {env_var} in the environment or a .env file")]
    MissingApiKey { provider: String, env_var: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "claude");
        assert_eq!(config.agent.max_tool_rounds, 25);
        assert_eq!(config.agent.max_history_messages, 100);
        assert_eq!(config.tools.terminal_timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.models.claude, config.models.claude);
        assert_eq!(parsed.agent, config.agent);
    }

    #[test]
    fn zero_rounds_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_tool_rounds = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn zero_history_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_history_messages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "claude");
    }

    #[test]
    fn load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_provider = "ollama"

[models]
ollama = "llama3.2"

[agent]
max_tool_rounds = 10
trim_policy = "messages"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_provider, "ollama");
        assert_eq!(config.models.ollama, "llama3.2");
        assert_eq!(config.models.openai, "gpt-4o");
        assert_eq!(config.agent.max_tool_rounds, 10);
        assert_eq!(config.agent.max_history_messages, 100);
        assert_eq!(config.agent.trim_policy, TrimPolicy::Messages);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_provider = [").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("ANTHROPIC_API_KEY", "sk-ant-real"),
            ("TERMPILOT_DEFAULT_PROVIDER", "openai"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434/v1"),
            ("OPENAI_API_KEY", ""),
        ]));
        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-ant-real"));
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.ollama_base_url, "http://gpu-box:11434/v1");
        assert!(config.openai_api_key.is_none());
    }

    #[test]
    fn provider_kind_parsing() {
        assert_eq!("claude".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("Anthropic".parse::<ProviderKind>().unwrap(), ProviderKind::Claude);
        assert_eq!("OPENAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("demo".parse::<ProviderKind>().unwrap(), ProviderKind::Demo);
        assert!(matches!(
            "gemini".parse::<ProviderKind>(),
            Err(ConfigError::UnknownProvider(name)) if name == "gemini"
        ));
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn placeholder_keys_count_as_unset() {
        let config = AppConfig {
            anthropic_api_key: Some("sk-ant-xxxxx".into()),
            openai_api_key: Some("sk-xxxxx".into()),
            ..AppConfig::default()
        };
        assert!(config.api_key(ProviderKind::Claude).is_none());
        assert!(config.api_key(ProviderKind::OpenAi).is_none());
        assert!(!config.is_available(ProviderKind::Claude));
        assert!(config.is_available(ProviderKind::Ollama));
    }

    #[test]
    fn validate_provider_checks_credentials() {
        let config = AppConfig {
            openai_api_key: Some("sk-live".into()),
            ..AppConfig::default()
        };
        assert_eq!(config.validate_provider("openai").unwrap(), ProviderKind::OpenAi);
        assert_eq!(config.validate_provider("demo").unwrap(), ProviderKind::Demo);
        assert_eq!(config.validate_provider("ollama").unwrap(), ProviderKind::Ollama);
        match config.validate_provider("claude") {
            Err(ConfigError::MissingApiKey { env_var, .. }) => {
                assert_eq!(env_var, "ANTHROPIC_API_KEY")
            }
            other => panic!("expected MissingApiKey, got {other:?}"),
        }
        assert!(matches!(
            config.validate_provider("nope"),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            anthropic_api_key: Some("sk-ant-secret-value".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-value"));
        assert!(debug.contains("[REDACTED]"));

        let shown = config.redacted_toml();
        assert!(!shown.contains("secret-value"));
        assert!(shown.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("claude-sonnet-4-20250514"));
        assert!(toml_str.contains("max_tool_rounds = 25"));
        assert!(toml_str.contains(r#"trim_policy = "turns""#));
    }
}
