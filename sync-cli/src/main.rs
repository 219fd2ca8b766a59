//! # monto-cli
//!
//! CLI tool for inspecting Monto products and replaying selection sync.
//!
//! ## Commands
//!
//! - `map`: Map one offset through a product's range map
//! - `replay`: Drive a headless session from a script and print what happens
//!
//! ## Example
//!
//! ```bash
//! # Which product span does source offset 1 select?
//! monto-cli map product.json --offset 1 --direction forward
//!
//! # Replay publishes and selections against a mock editor
//! monto-cli replay session.jsonl
//!
//! # Same, with notifications captured from an analysis process
//! monto-cli replay session.jsonl --frames captured.bin
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monto_sync_client::SessionConfig;
use monto_sync_core::Direction;

mod commands;

use commands::{map, replay};

const DEFAULT_CONFIG: &str = "monto.toml";

/// CLI tool for inspecting Monto products and replaying selection sync.
#[derive(Parser, Debug)]
#[command(name = "monto-cli")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ./monto.toml if present)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map one offset through a product's range map
    Map {
        /// Product file (`monto/publishProduct` params as JSON)
        product: PathBuf,

        /// Offset to map
        #[arg(long, short)]
        offset: usize,

        /// Which way to map
        #[arg(long, short, value_enum, default_value = "forward")]
        direction: DirectionArg,
    },

    /// Replay a session script against a mock editor
    Replay {
        /// Script file, one JSON step per line
        script: PathBuf,

        /// Framed notification stream delivered before the script runs
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Whether published products are opened automatically
        #[arg(long, value_enum, default_value = "all")]
        show: ShowArg,
    },
}

/// Mapping direction.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum DirectionArg {
    /// Source offset to product span
    Forward,
    /// Product offset to source span
    Backward,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => Direction::Forward,
            DirectionArg::Backward => Direction::Backward,
        }
    }
}

/// Display policy for published products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ShowArg {
    /// Open every published product
    All,
    /// Never open products automatically
    None,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    init_logging(&config.session.log_filter);

    match cli.command {
        Commands::Map {
            product,
            offset,
            direction,
        } => {
            let line = map::run(&config, &product, offset, direction.into()).await?;
            println!("{line}");
        }
        Commands::Replay {
            script,
            frames,
            show,
        } => {
            let mut stdout = std::io::stdout().lock();
            replay::run(&config, &script, frames.as_deref(), show, &mut stdout).await?;
        }
    }

    Ok(())
}

/// Load the configuration, falling back to defaults when no file exists.
fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => SessionConfig::from_file(path).context("Failed to load configuration"),
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if default.exists() {
                SessionConfig::from_file(default).context("Failed to load configuration")
            } else {
                Ok(SessionConfig::default())
            }
        }
    }
}

/// Log to stderr; stdout carries command output.
fn init_logging(fallback: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
