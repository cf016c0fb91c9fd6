use std::io::Read;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use txdecode::api::{self, AppState};
use txdecode::classify::classify_script_pubkey;
use txdecode::codec::{BitcoinAddressCodec, Network};
use txdecode::config::init_global_config;
use txdecode::hasher::Sha256dHasher;
use txdecode::report::decode_report;
use txdecode::script::render_script;
use txdecode::telemetry::{init_tracing, TelemetryConfig};
use txdecode::SAMPLE_TX_HEX;

#[derive(Parser, Debug)]
#[clap(name = "txdecode")]
#[clap(about = "Decode raw Bitcoin transactions", long_about = None)]
struct Args {
    /// Settings file (defaults to ./txdecode.toml when present)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a transaction from an argument, a file, or stdin
    Decode {
        hex: Option<String>,

        #[clap(long)]
        file: Option<PathBuf>,

        /// Print the report as JSON
        #[clap(long, default_value_t = false)]
        json: bool,

        #[clap(long)]
        network: Option<Network>,
    },
    /// Disassemble a script
    Disasm { script_hex: String },
    /// Classify a scriptPubKey and derive its address
    Classify {
        script_hex: String,

        #[clap(long)]
        network: Option<Network>,
    },
    /// Run the HTTP API
    Serve {
        #[clap(long)]
        bind: Option<String>,

        #[clap(long)]
        network: Option<Network>,
    },
    /// Print the built-in sample transaction
    Sample,
}

fn read_input(hex: Option<String>, file: Option<PathBuf>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(hex) = hex {
        return Ok(hex);
    }
    if let Some(path) = file {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let settings = init_global_config(args.config.as_deref())?;
    let _log_guard = init_tracing(TelemetryConfig::from(settings))?;
    debug!(network = %settings.network, "Loaded settings");

    match args.command {
        Command::Decode { hex, file, json, network } => {
            let network = network.unwrap_or(settings.network);
            let input = read_input(hex, file)?;
            let report = decode_report(&input, &BitcoinAddressCodec, &Sha256dHasher, network)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", report.render_text());
            }
        }
        Command::Disasm { script_hex } => {
            let script = hex::decode(script_hex.trim())?;
            println!("{}", render_script(&script));
        }
        Command::Classify { script_hex, network } => {
            let network = network.unwrap_or(settings.network);
            let script = hex::decode(script_hex.trim())?;
            let classification = classify_script_pubkey(&script, &BitcoinAddressCodec, network);
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
        Command::Serve { bind, network } => {
            let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
            let state = AppState::new(network.unwrap_or(settings.network));
            api::serve(&bind, state).await?;
        }
        Command::Sample => {
            println!("{}", SAMPLE_TX_HEX);
        }
    }

    Ok(())
}
