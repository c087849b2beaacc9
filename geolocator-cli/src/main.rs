//! Terminal front end for the location aggregation engine.
//!
//! Runs the engine against a simulated platform so the whole surface
//! can be exercised without device hardware: a continuous watch, the
//! one-shot reads, and the permission/service status checks.

mod config;
mod error;
mod runner;

use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::error;

use geolocator::data::{Permission, Priority};

use crate::config::CliConfig;
use crate::error::CliError;
use crate::runner::WatchArgs;

#[derive(Debug, Parser)]
#[command(name = "geolocator", version = geolocator::VERSION)]
#[command(about = "Drive the location aggregation engine against a simulated platform")]
struct Cli {
    /// Explicit configuration file instead of the default location.
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stream simulated fixes until interrupted or a count is reached
    Watch {
        /// Accuracy tier requested from the platform
        #[arg(long, value_enum, default_value = "balanced")]
        accuracy: AccuracyArg,

        /// Permission to validate before subscribing
        #[arg(long, value_enum, default_value = "when-in-use")]
        permission: PermissionArg,

        /// Delivery interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Minimum movement in meters between printed fixes
        #[arg(long, default_value_t = 0.0)]
        displacement: f32,

        /// Stop after this many fixes
        #[arg(long)]
        count: Option<u32>,
    },

    /// Print the last-known fix
    Locate {
        #[arg(long, value_enum, default_value = "when-in-use")]
        permission: PermissionArg,
    },

    /// Report whether location work could proceed right now
    Status {
        #[arg(long, value_enum, default_value = "when-in-use")]
        permission: PermissionArg,
    },

    /// Drive the enable-location-services flow
    Enable,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AccuracyArg {
    NoPower,
    Low,
    Balanced,
    High,
}

impl From<AccuracyArg> for Priority {
    fn from(value: AccuracyArg) -> Self {
        match value {
            AccuracyArg::NoPower => Priority::NoPower,
            AccuracyArg::Low => Priority::Low,
            AccuracyArg::Balanced => Priority::Balanced,
            AccuracyArg::High => Priority::High,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PermissionArg {
    Coarse,
    Fine,
    WhenInUse,
    Always,
}

impl From<PermissionArg> for Permission {
    fn from(value: PermissionArg) -> Self {
        match value {
            PermissionArg::Coarse => Permission::Coarse,
            PermissionArg::Fine => Permission::Fine,
            PermissionArg::WhenInUse => Permission::WhenInUse,
            PermissionArg::Always => Permission::Always,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => CliConfig::from_file(path)?,
        None => CliConfig::load()?,
    };

    let _logging = geolocator::logging::init_logging(&config.log_dir, &config.log_file)?;

    let cancel = CancellationToken::new();
    let ctrlc_cancel = cancel.clone();
    ctrlc::set_handler(move || ctrlc_cancel.cancel())
        .map_err(|e| CliError::Config(format!("cannot install interrupt handler: {e}")))?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        match cli.command {
            Command::Watch {
                accuracy,
                permission,
                interval_ms,
                displacement,
                count,
            } => {
                let args = WatchArgs {
                    accuracy: accuracy.into(),
                    permission: permission.into(),
                    interval_ms,
                    displacement,
                    count,
                };
                runner::watch(&config, args, cancel).await
            }
            Command::Locate { permission } => runner::locate(&config, permission.into()).await,
            Command::Status { permission } => runner::status(&config, permission.into()).await,
            Command::Enable => runner::enable(&config).await,
        }
    })
}
