use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use vl_agent::cli::{self, Cli, Command, ConfigCommand};
use vl_agent::bootstrap;
use vl_domain::config::{Config, ConfigSeverity};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            init_tracing();
            let config = cli::load_config(&config_path)?;
            run_worker(Arc::new(config)).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let config = cli::load_config(&config_path)?;
            let issues = config.validate();
            for issue in &issues {
                println!("{issue}");
            }
            if issues
                .iter()
                .any(|i| i.severity == ConfigSeverity::Error)
            {
                std::process::exit(1);
            }
            println!("config ok: {}", config_path.display());
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let config = cli::load_config(&config_path)?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Some(Command::Version) => {
            println!("voiceloop {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Structured JSON tracing for the serve command.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,vl_session=debug")),
        )
        .json()
        .init();
}

/// Boot the worker and hold it open for dispatch jobs.
///
/// The room transport is a collaborator: an embedding integration feeds
/// jobs into [`bootstrap::ProcessState::dispatch`] together with a
/// transport handle and a room event stream. The process itself only owns
/// the binding, the registry and the clients, and tears down on ctrl-c.
async fn run_worker(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "VoiceLoop starting");

    let state = bootstrap::build_process_state(config)?;
    tracing::info!(
        agent_name = %state.config.binding.agent_name,
        mode = ?state.config.session.mode,
        "worker ready; waiting for dispatch jobs"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!(
        live_sessions = state.registry.assignment_count(),
        "shutdown requested"
    );
    Ok(())
}
