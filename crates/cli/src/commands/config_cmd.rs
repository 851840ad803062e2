//! `termpilot config`: show the effective configuration.

use termpilot_config::AppConfig;

pub fn run(default: bool) -> anyhow::Result<()> {
    if default {
        println!("# {}", AppConfig::config_dir().join("config.toml").display());
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let config = AppConfig::load()?;
    print!("{}", config.redacted_toml());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_is_valid() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.to_str().unwrap().contains(".termpilot"));
    }

    #[test]
    fn default_toml_parses_back() {
        let parsed: AppConfig = toml::from_str(&AppConfig::default_toml()).unwrap();
        assert_eq!(parsed.default_provider, "claude");
    }
}
