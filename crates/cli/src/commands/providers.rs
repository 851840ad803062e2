//! `termpilot providers`: list supported LLM providers.

use termpilot_config::{AppConfig, ProviderKind};

/// One table row per backend: name, model, status, description.
fn rows(config: &AppConfig) -> Vec<String> {
    ProviderKind::ALL
        .iter()
        .map(|&kind| {
            let status = match (config.is_available(kind), kind.api_key_env()) {
                (true, _) => "ready".to_string(),
                (false, Some(env_var)) => format!("set {env_var}"),
                (false, None) => "unavailable".to_string(),
            };
            let default = if config.default_provider.eq_ignore_ascii_case(kind.as_str()) {
                " *"
            } else {
                ""
            };
            format!(
                "  {:<10} {:<28} {:<22} {}",
                format!("{kind}{default}"),
                config.model(kind),
                status,
                kind.description()
            )
        })
        .collect()
}

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    println!("Supported LLM providers (* = default)");
    println!();
    println!("  {:<10} {:<28} {:<22} {}", "PROVIDER", "MODEL", "STATUS", "BACKEND");
    for row in rows(&config) {
        println!("{row}");
    }
    println!();
    println!("  Select one with --model <provider> or /model <provider>.");

    Ok(())
}
