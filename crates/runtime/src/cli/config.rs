use pl_domain::config::Config;

/// Validate the config, printing the outcome.  Returns `false` on error.
pub fn validate(config: &Config, config_path: &str) -> bool {
    match config.validate() {
        Ok(()) => {
            println!("Config OK ({config_path})");
            true
        }
        Err(e) => {
            println!("{e}");
            println!("\n1 error in {config_path}");
            false
        }
    }
}

/// Dump the resolved config (with all defaults filled in) as TOML.
pub fn show(config: &Config) {
    match toml::to_string_pretty(config) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(validate(&Config::default(), "parley.toml"));
    }

    #[test]
    fn zero_min_messages_is_rejected() {
        let mut config = Config::default();
        config.title.min_messages = 0;
        assert!(!validate(&config, "parley.toml"));
    }

    #[test]
    fn shown_config_parses_back() {
        let raw = toml::to_string_pretty(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.title.default_titles, vec!["New Chat", "新對話"]);
    }
}
