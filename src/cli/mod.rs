//! Command-line interface for shelf
//!
//! Drives the library view against a host data directory.

mod commands;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use shelf::config::Config;
use shelf::{JsonDirBridge, LibraryView, ViewOptions};

pub use output::OutputFormat;

/// Shelf - game library view
#[derive(Parser, Debug)]
#[command(name = "shelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[command(flatten)]
    pub output: OutputOptions,

    /// Host data directory (overrides the configured one)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output formatting options
#[derive(Parser, Debug, Clone)]
pub struct OutputOptions {
    /// Output in JSON format (for machine parsing)
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl OutputOptions {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Library listing
    Library {
        #[command(subcommand)]
        command: commands::library::LibraryCommands,
    },

    /// Walk through the first-run onboarding dialogs
    Onboard,

    /// Request the add-game dialog
    AddGame,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

/// Shared state for commands that talk to the host
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub quiet: bool,
    data_dir: Option<PathBuf>,
}

impl Context {
    /// Bridge over the host data directory
    pub fn bridge(&self) -> Result<JsonDirBridge> {
        let root = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => self.config.data_dir()?,
        };
        let bridge =
            JsonDirBridge::new(root).with_installer(self.config.bridge.installer_command.clone());
        tracing::debug!("Using host data directory {}", bridge.root().display());
        Ok(bridge)
    }

    /// Inactive library view over the host data directory
    pub fn view(&self) -> Result<LibraryView<JsonDirBridge>> {
        let bridge = Arc::new(self.bridge()?);
        Ok(LibraryView::new(bridge, ViewOptions::from(&self.config)))
    }
}

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> Result<()> {
    let format = cli.output.format();
    let quiet = cli.output.quiet;

    if let Commands::Config { command } = cli.command {
        return commands::config::run(command, format, quiet).await;
    }

    let ctx = Context {
        config: Config::load()?,
        format,
        quiet,
        data_dir: cli.data_dir,
    };

    match cli.command {
        Commands::Library { command } => commands::library::run(command, &ctx).await,
        Commands::Onboard => commands::onboard::run(&ctx).await,
        Commands::AddGame => commands::gate::run(&ctx).await,
        Commands::Config { .. } => Ok(()),
    }
}
