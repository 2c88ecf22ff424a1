//! Consumer-Driven Contracts - CLI Entry Point

use anyhow::Result;
use cdc_contracts::{serialize, verify, HoldMode, Method, MockConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(
    name = "cdc-contracts",
    about = "Consumer-driven HTTP contracts - mock resolution, documentation and verification",
    version
)]
struct Args {
    /// Path to contracts file
    #[arg(short, long, default_value = "contracts.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, default_value = "info")]
    log_level: Level,

    /// Print example configuration and exit
    #[arg(long)]
    print_config: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate contracts and exit
    Validate,
    /// Print contract documentation as JSON
    Serialize {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print provider verification interactions as JSON
    Interactions,
    /// Print the initial response selection of every contract
    State,
    /// Resolve a sequence of calls against the mock store
    Resolve {
        /// Override a selection before resolving (contract=response)
        #[arg(long = "set", value_name = "CONTRACT=RESPONSE")]
        overrides: Vec<String>,

        /// Calls as METHOD URL pairs, e.g. GET /api/customers/se
        #[arg(required = true, num_args = 2..)]
        calls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.print_config {
        let example_config = include_str!("../demos/contracts.yaml");
        println!("{}", example_config);
        return Ok(());
    }

    info!(path = ?args.config, "Loading contracts");
    let config = MockConfig::from_file(&args.config)?;

    match args.command.unwrap_or(Command::Validate) {
        Command::Validate => {
            println!(
                "Contracts are valid ({} contracts defined)",
                config.contracts.len()
            );
        }
        Command::Serialize { output } => {
            let document = serialize::serialize(&config.contracts)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, document)?;
                    info!(path = %path.display(), "Documentation written");
                }
                None => println!("{}", document),
            }
        }
        Command::Interactions => {
            let interactions = verify::interactions(&config.contracts);
            println!("{}", serde_json::to_string_pretty(&interactions)?);
        }
        Command::State => {
            let store = config.build_store()?;
            println!("{}", serde_json::to_string_pretty(&store.get_state())?);
        }
        Command::Resolve { overrides, calls } => {
            if calls.len() % 2 != 0 {
                anyhow::bail!("Calls must be given as METHOD URL pairs");
            }

            // A manual hold would never be released here
            let delay = Duration::from_millis(config.settings.hold_delay_ms.unwrap_or(0));
            let store = config
                .build_store()?
                .with_hold_mode(HoldMode::Timed(delay));

            for entry in &overrides {
                let (contract, response) = entry.split_once('=').ok_or_else(|| {
                    anyhow::anyhow!("Invalid override '{}', expected CONTRACT=RESPONSE", entry)
                })?;
                store.set_response(contract, response)?;
            }

            for call in calls.chunks(2) {
                let method: Method = call[0].parse()?;
                let url = &call[1];
                let response = store
                    .get_response(method, url)
                    .await
                    .ok_or_else(|| anyhow::anyhow!("No contract matches {} {}", method, url))?;
                println!(
                    "{} {} -> {}",
                    method,
                    url,
                    serde_json::to_string(&response)?
                );
            }
        }
    }

    Ok(())
}
