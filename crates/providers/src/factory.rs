//! Provider factory: symbolic name → ready-to-use `Provider`.

use std::sync::Arc;

use termpilot_config::{AppConfig, ConfigError, ProviderKind};
use termpilot_core::Provider;

use crate::{AnthropicProvider, DemoProvider, OpenAiCompatProvider};

/// Build the provider for `kind` from configuration.
///
/// Fails with a configuration error when the backend needs an API key and
/// none is set. Never performs network I/O.
pub fn build_provider(
    kind: ProviderKind,
    config: &AppConfig,
) -> std::result::Result<Arc<dyn Provider>, ConfigError> {
    let provider: Arc<dyn Provider> = match kind {
        ProviderKind::Claude => {
            let api_key = require_key(kind, config)?;
            Arc::new(AnthropicProvider::new(api_key).with_model(config.model(kind)))
        }
        ProviderKind::OpenAi => {
            let api_key = require_key(kind, config)?;
            Arc::new(OpenAiCompatProvider::openai(api_key).with_model(config.model(kind)))
        }
        ProviderKind::Ollama => Arc::new(
            OpenAiCompatProvider::ollama(Some(&config.ollama_base_url)).with_model(config.model(kind)),
        ),
        ProviderKind::Demo => Arc::new(DemoProvider::new()),
    };

    tracing::debug!(provider = %kind, model = provider.model_name(), "Built provider");
    Ok(provider)
}

/// Resolve a symbolic name, check credentials, and build the provider.
pub fn build_named(
    name: &str,
    config: &AppConfig,
) -> std::result::Result<Arc<dyn Provider>, ConfigError> {
    let kind = config.validate_provider(name)?;
    build_provider(kind, config)
}

fn require_key(kind: ProviderKind, config: &AppConfig) -> std::result::Result<&str, ConfigError> {
    config.api_key(kind).ok_or_else(|| ConfigError::MissingApiKey {
        provider: kind.to_string(),
        env_var: kind.api_key_env().unwrap_or_default().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_needs_no_credentials() {
        let provider = build_provider(ProviderKind::Demo, &AppConfig::default()).unwrap();
        assert_eq!(provider.name(), "demo");
    }

    #[test]
    fn ollama_uses_configured_model_and_url() {
        let mut config = AppConfig::default();
        config.models.ollama = "llama3.2".into();
        let provider = build_provider(ProviderKind::Ollama, &config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model_name(), "llama3.2");
    }

    #[test]
    fn claude_without_key_is_config_error() {
        let result = build_provider(ProviderKind::Claude, &AppConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingApiKey { .. })));
    }

    #[test]
    fn placeholder_key_is_rejected() {
        let config = AppConfig {
            openai_api_key: Some("sk-xxxxx".into()),
            ..AppConfig::default()
        };
        assert!(build_provider(ProviderKind::OpenAi, &config).is_err());
    }

    #[test]
    fn claude_with_key_builds() {
        let config = AppConfig {
            anthropic_api_key: Some("sk-ant-live".into()),
            ..AppConfig::default()
        };
        let provider = build_named("Anthropic", &config).unwrap();
        assert_eq!(provider.name(), "claude");
        assert_eq!(provider.model_name(), "claude-sonnet-4-20250514");
    }

    #[test]
    fn unknown_name_is_config_error() {
        let result = build_named("gemini", &AppConfig::default());
        assert!(matches!(result, Err(ConfigError::UnknownProvider(_))));
    }
}
