//! `emvtap`, read contactless payment cards from a PC/SC reader

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::debug;

mod commands;
mod config;
mod display;

use commands::*;

#[derive(Parser)]
#[command(version, about = "Read contactless payment cards from a PC/SC reader")]
struct Cli {
    /// Reader to watch for cards (any reader if not specified)
    #[arg(short, long)]
    reader: Option<String>,

    /// Debug level output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file (default ~/.emvtap/emvtap.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available readers
    List,

    /// Show whether contactless reading is available
    Status,

    /// Read what the presented tag reports about itself
    Read {
        /// How long to wait for a tag, in milliseconds
        #[arg(long, default_value_t = 15_000)]
        timeout_ms: u64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read payment card data over EMV
    Emv {
        /// AID to try when the card lists none, in hex (repeatable)
        #[arg(long = "aid")]
        aids: Vec<String>,

        /// Print the full card number
        #[arg(long)]
        show_pan: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Leave record responses with an error status out of the decoded data
        #[arg(long)]
        skip_failed_records: bool,

        /// Print the decoded TLV data of the matching application
        #[arg(long)]
        dump: bool,
    },

    /// Send raw command APDUs over ISO-DEP
    Apdu {
        /// Command APDUs in hex
        #[arg(required = true)]
        commands: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    let pcsc = config.pcsc(cli.reader.as_deref());
    let mut scan = config.scan();

    match cli.command {
        Commands::List => list_command()?,
        Commands::Status => status_command(pcsc)?,
        Commands::Read { timeout_ms, json } => {
            read_command(pcsc, scan, Duration::from_millis(timeout_ms), json)?
        }
        Commands::Emv {
            aids,
            show_pan,
            json,
            skip_failed_records,
            dump,
        } => {
            if !aids.is_empty() {
                scan = scan.with_fallback_aids(&aids);
            }
            if skip_failed_records {
                scan = scan.with_skip_failed_records(true);
            }
            emv_command(
                pcsc,
                scan,
                EmvOutput {
                    show_pan,
                    json,
                    dump,
                },
            )?
        }
        Commands::Apdu { commands } => apdu_command(pcsc, &scan, &commands)?,
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_ansi(true)
        .init();
}
