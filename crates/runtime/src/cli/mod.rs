pub mod config;
pub mod demo;
pub mod title;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use pl_domain::config::Config;

/// parley: tool-call confirmation and conversation titling.
#[derive(Debug, Parser)]
#[command(name = "parley", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Play a scripted conversation with tool calls and automatic titling.
    Demo {
        /// Approve every tool call without prompting.
        #[arg(long, conflicts_with = "reject_all")]
        approve_all: bool,
        /// Reject every tool call without prompting.
        #[arg(long)]
        reject_all: bool,
    },
    /// Generate a title for a JSON transcript (an array of messages).
    Title {
        /// Path to the transcript file.
        file: PathBuf,
    },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

pub const CONFIG_ENV: &str = "PARLEY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "parley.toml";

/// Load the configuration from the path in `PARLEY_CONFIG` (or
/// `parley.toml`).  Returns the parsed [`Config`] and the path used.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = load_config_from(Path::new(&config_path))?;
    Ok((config, config_path))
}

/// Parse `path`, or fall back to defaults when it does not exist.
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl_domain::config::LogFormat;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.title.debounce_ms, 2000);
        assert_eq!(config.confirmation.executor_timeout_secs, None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[title]\ndebounce_ms = 500\n\n[confirmation]\nexecutor_timeout_secs = 30\n\n[observability]\nlog_format = \"json\""
        )
        .unwrap();

        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.title.debounce_ms, 500);
        assert_eq!(config.title.min_messages, 2);
        assert_eq!(config.confirmation.executor_timeout_secs, Some(30));
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn malformed_file_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[title\ndebounce_ms = ").unwrap();
        let err = load_config_from(file.path()).unwrap_err().to_string();
        assert!(err.starts_with("parsing "), "{err}");
    }

    #[test]
    fn cli_parses_demo_flags() {
        let cli = Cli::parse_from(["parley", "demo", "--approve-all"]);
        assert!(matches!(cli.command, Command::Demo { approve_all: true, reject_all: false }));
        assert!(Cli::try_parse_from(["parley", "demo", "--approve-all", "--reject-all"]).is_err());
    }
}
