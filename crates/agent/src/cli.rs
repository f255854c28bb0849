use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use vl_domain::config::Config;

#[derive(Parser)]
#[command(name = "voiceloop", version, about = "Per-room voice agent orchestration worker")]
pub struct Cli {
    /// Path to the TOML config file. Falls back to $VOICELOOP_CONFIG,
    /// then ./voiceloop.toml.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve dispatch jobs (default when no subcommand is given).
    Serve,
    /// Configuration helpers.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print the version.
    Version,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Validate the config file and report every issue.
    Validate,
    /// Print the resolved configuration.
    Show,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.config {
            return path.clone();
        }
        if let Ok(path) = std::env::var("VOICELOOP_CONFIG") {
            return PathBuf::from(path);
        }
        PathBuf::from("voiceloop.toml")
    }
}

pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config =
        toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}
