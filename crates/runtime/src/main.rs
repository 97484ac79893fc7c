use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pl_domain::config::{LogFormat, ObservabilityConfig};
use pl_runtime::cli::demo::DecisionMode;
use pl_runtime::cli::{Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Demo { approve_all, reject_all } => {
            let (config, _) = pl_runtime::cli::load_config()?;
            config.validate()?;
            init_tracing(&config.observability);
            pl_runtime::cli::demo::run(config, DecisionMode::from_flags(approve_all, reject_all)).await
        }
        Command::Title { file } => {
            let (config, _) = pl_runtime::cli::load_config()?;
            config.validate()?;
            init_tracing(&config.observability);
            if !pl_runtime::cli::title::run(&config, &file).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Validate) => {
            let (config, config_path) = pl_runtime::cli::load_config()?;
            if !pl_runtime::cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config(ConfigCommand::Show) => {
            let (config, _) = pl_runtime::cli::load_config()?;
            pl_runtime::cli::config::show(&config);
            Ok(())
        }
        Command::Version => {
            println!("parley {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Install the `tracing` subscriber.  Logs go to stderr so stdout stays
/// clean for command output; `RUST_LOG` overrides the configured filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.log_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    match obs.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}
