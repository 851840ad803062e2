//! Interactive session and one-shot mode.

use std::sync::Arc;

use anyhow::Context;
use termpilot_agent::{AgentLoop, TurnOutcome};
use termpilot_config::AppConfig;
use termpilot_core::error::ProviderError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::render::TerminalRenderer;

/// A slash command typed at the prompt. Never reaches the agent or history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Quit,
    Help,
    Model(Option<String>),
    Clear,
    Tools,
    Unknown(String),
}

impl MetaCommand {
    /// Parse `input` as a meta-command; `None` for ordinary messages.
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if !input.starts_with('/') {
            return None;
        }

        let mut parts = input.splitn(2, char::is_whitespace);
        let command = parts.next().unwrap_or_default().to_lowercase();
        let arg = parts
            .next()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);

        Some(match command.as_str() {
            "/quit" | "/exit" | "/q" => Self::Quit,
            "/help" => Self::Help,
            "/model" => Self::Model(arg),
            "/clear" => Self::Clear,
            "/tools" => Self::Tools,
            _ => Self::Unknown(command),
        })
    }
}

const HELP: &str = "\
Commands:
  /model <provider>  Switch provider (claude, openai, ollama, demo)
  /clear             Clear conversation history
  /tools             List available tools
  /help              Show this help
  /quit              Exit termpilot";

struct Session {
    agent: AgentLoop,
    config: AppConfig,
    renderer: TerminalRenderer,
}

impl Session {
    /// Run one user turn. Provider errors are rendered, then returned.
    async fn turn(&mut self, input: &str) -> Result<TurnOutcome, ProviderError> {
        let result = self.agent.process_message(input, &self.renderer).await;
        match &result {
            Ok(TurnOutcome::Completed { rounds, .. }) => debug!(rounds, "Turn finished"),
            // The renderer has already reported the round limit.
            Ok(TurnOutcome::RoundLimitReached { .. }) => {}
            Err(e) => self.renderer.provider_error(e),
        }
        result
    }

    /// Handle a meta-command. Returns `false` when the session should end.
    fn handle(&mut self, command: MetaCommand) -> bool {
        match command {
            MetaCommand::Quit => return false,
            MetaCommand::Help => self.renderer.info(HELP),
            MetaCommand::Model(None) => {
                self.renderer.info(&format!(
                    "Current model: {} ({})",
                    self.agent.provider().model_name(),
                    self.agent.provider().name()
                ));
                self.renderer.info("Usage: /model claude  or  /model openai");
            }
            MetaCommand::Model(Some(name)) => {
                match termpilot_providers::build_named(&name, &self.config) {
                    Ok(provider) => {
                        self.agent.switch_provider(provider);
                        self.renderer.info(&format!(
                            "Switched to {}",
                            self.agent.provider().model_name()
                        ));
                    }
                    Err(e) => self.renderer.error(&e.to_string()),
                }
            }
            MetaCommand::Clear => {
                self.agent.clear_history();
                self.renderer.info("Conversation history cleared.");
            }
            MetaCommand::Tools => {
                let names = self.agent.tools().names();
                self.renderer
                    .info(&format!("Available tools ({}):", names.len()));
                for name in names {
                    self.renderer.info(&format!("  {name}"));
                }
            }
            MetaCommand::Unknown(command) => {
                self.renderer
                    .warning(&format!("Unknown command: {command}"));
            }
        }
        true
    }

    async fn interactive(&mut self) -> anyhow::Result<()> {
        self.renderer.info(&format!(
            "termpilot: AI coding assistant\nModel: {}\nType /help for commands, /quit to exit",
            self.agent.provider().model_name()
        ));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            self.renderer.prompt();

            let line = tokio::select! {
                line = lines.next_line() => line.context("Failed to read input")?,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(line) = line else {
                break;
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            match MetaCommand::parse(input) {
                Some(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                None => {
                    // Already rendered; the session goes on.
                    let _ = self.turn(input).await;
                }
            }
        }

        self.renderer.info("\nGoodbye!");
        Ok(())
    }
}

pub async fn run(model: Option<String>, message: Vec<String>) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;

    let provider_name = model.unwrap_or_else(|| config.default_provider.clone());
    let provider = termpilot_providers::build_named(&provider_name, &config)
        .with_context(|| format!("Cannot start provider '{provider_name}'"))?;

    let tools = Arc::new(termpilot_tools::registry_with(&config.tools));
    let agent = AgentLoop::from_config(provider, tools, &config.agent);

    let mut session = Session {
        agent,
        config,
        renderer: TerminalRenderer::new(),
    };

    if message.is_empty() {
        session.interactive().await
    } else {
        session
            .turn(&message.join(" "))
            .await
            .context("Provider request failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_input_is_not_a_command() {
        assert_eq!(MetaCommand::parse("list files"), None);
        assert_eq!(MetaCommand::parse("path/to/file"), None);
    }

    #[test]
    fn quit_aliases() {
        for input in ["/quit", "/exit", "/q", "  /QUIT  "] {
            assert_eq!(MetaCommand::parse(input), Some(MetaCommand::Quit), "{input}");
        }
    }

    #[test]
    fn model_with_and_without_argument() {
        assert_eq!(MetaCommand::parse("/model"), Some(MetaCommand::Model(None)));
        assert_eq!(
            MetaCommand::parse("/model   openai "),
            Some(MetaCommand::Model(Some("openai".into())))
        );
    }

    #[test]
    fn other_commands() {
        assert_eq!(MetaCommand::parse("/clear"), Some(MetaCommand::Clear));
        assert_eq!(MetaCommand::parse("/tools"), Some(MetaCommand::Tools));
        assert_eq!(MetaCommand::parse("/help"), Some(MetaCommand::Help));
        assert_eq!(
            MetaCommand::parse("/frobnicate now"),
            Some(MetaCommand::Unknown("/frobnicate".into()))
        );
    }

    fn demo_session() -> Session {
        let config = AppConfig::default();
        let provider = termpilot_providers::build_named("demo", &config).unwrap();
        let tools = Arc::new(termpilot_tools::default_registry());
        Session {
            agent: AgentLoop::from_config(provider, tools, &config.agent),
            config,
            renderer: TerminalRenderer::new(),
        }
    }

    #[tokio::test]
    async fn meta_commands_bypass_history() {
        let mut session = demo_session();
        session.turn("hello").await.unwrap();
        assert_eq!(session.agent.history().len(), 2);

        assert!(session.handle(MetaCommand::Tools));
        assert!(session.handle(MetaCommand::Help));
        assert_eq!(session.agent.history().len(), 2);

        assert!(session.handle(MetaCommand::Clear));
        assert!(session.agent.history().is_empty());
        assert!(!session.handle(MetaCommand::Quit));
    }

    #[tokio::test]
    async fn provider_failure_is_returned_from_turn() {
        let mut session = demo_session();
        session.config.ollama_base_url = "http://127.0.0.1:9/v1".into();
        assert!(session.handle(MetaCommand::Model(Some("ollama".into()))));

        let result = session.turn("hello").await;
        assert!(result.is_err());
        assert_eq!(session.agent.history().len(), 1);
    }

    #[test]
    fn switching_to_unconfigured_provider_keeps_current() {
        let mut session = demo_session();
        session.config.anthropic_api_key = None;
        assert!(session.handle(MetaCommand::Model(Some("claude".into()))));
        assert_eq!(session.agent.provider().name(), "demo");

        assert!(session.handle(MetaCommand::Model(Some("nonsense".into()))));
        assert_eq!(session.agent.provider().name(), "demo");

        assert!(session.handle(MetaCommand::Model(Some("ollama".into()))));
        assert_eq!(session.agent.provider().name(), "ollama");
    }
}
