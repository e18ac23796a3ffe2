//! inputmux CLI: watch input devices and decode captured streams.

mod config;
mod dump;
mod output;
mod setup;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use inputmux_types::DeviceProtocol;

use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "inputmux",
    about = "Read BSD mouse and keyboard devices as a normalized event stream",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open devices and print their events until interrupted.
    Watch {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print one JSON object per event.
        #[arg(long)]
        json: bool,

        /// Device nodes to open. Defaults to the `devices` list in the config.
        devices: Vec<PathBuf>,
    },

    /// Decode a captured device stream.
    Decode {
        /// Wire format of the capture.
        #[arg(short, long, value_enum)]
        protocol: Protocol,

        /// Path to configuration file (for the wheel format).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// The captured bytes.
        file: PathBuf,
    },

    /// Print the default configuration.
    DefaultConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum Protocol {
    MousePacket,
    EventRecord,
}

impl From<Protocol> for DeviceProtocol {
    fn from(protocol: Protocol) -> Self {
        match protocol {
            Protocol::MousePacket => DeviceProtocol::MousePacket,
            Protocol::EventRecord => DeviceProtocol::EventRecord,
        }
    }
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            config,
            json,
            devices,
        } => {
            let (config, loaded) = setup::load_config(config.as_deref())?;
            init_tracing(&config.log.level);
            match loaded {
                Some(path) => tracing::info!(path = %path.display(), "loaded config"),
                None => tracing::info!("no config file found, using defaults"),
            }
            watch::run(config, devices, json).await?;
        }
        Commands::Decode {
            protocol,
            config,
            file,
        } => {
            let (config, _) = setup::load_config(config.as_deref())?;
            init_tracing(&config.log.level);
            dump::run(&file, protocol.into(), config.context.pointer.wheel_format)?;
        }
        Commands::DefaultConfig => {
            print!("{}", toml::to_string_pretty(&Config::default())?);
        }
    }

    Ok(())
}
