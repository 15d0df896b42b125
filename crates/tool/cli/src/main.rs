mod batch;
mod call;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use log::{LevelFilter, Log, Record};
use mrpc_connector::{ChainId, Connector, EndpointConfig, NetworkConfig, NetworkConnector};
use tokio::runtime;

const LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser)]
#[clap(name = "mrpc", about = "Batched JSON-RPC client for Ethereum-compatible nodes")]
struct CliArgs {
    /// Enables verbose mode
    #[clap(short, long, takes_value = false)]
    verbose: bool,
    /// Path to a TOML network configuration
    #[clap(short, long, conflicts_with = "url")]
    config: Option<PathBuf>,
    /// Endpoint URL, used instead of a configuration file
    #[clap(long)]
    url: Option<String>,
    /// Chain to use. Selects a configured network, or labels `--url`.
    #[clap(long)]
    chain_id: Option<ChainId>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sends a single request
    Call {
        /// The JSON-RPC method
        method: String,
        /// Parameters as a JSON array or object
        params: Option<String>,
    },
    /// Sends the requests in a JSON file as one batch
    Batch {
        /// File containing an array of `{ "method", "params" }` objects
        path: PathBuf,
    },
    /// Lists the configured chains
    Chains,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    init_logger(args.verbose)?;

    #[cfg(feature = "tracing")]
    init_tracing()?;

    let connector = NetworkConnector::new(runtime::Handle::current(), network_config(&args)?)?;
    if let Some(chain_id) = args.chain_id {
        connector.switch_chain(chain_id)?;
    }

    let update = connector.activate();
    log::debug!(
        "Using chain id {} at {}",
        update.chain_id,
        update.provider.url()
    );

    match args.command {
        Command::Call { method, params } => {
            call::execute(&update.provider, method, params.as_deref()).await
        }
        Command::Batch { path } => batch::execute(&update.provider, &path).await,
        Command::Chains => {
            for chain_id in connector.supported_chain_ids() {
                let marker = if chain_id == update.chain_id { "*" } else { " " };
                if let Some(provider) = connector.provider_for(chain_id) {
                    println!("{marker} {chain_id}\t{}", provider.url());
                }
            }
            Ok(())
        }
    }
}

fn network_config(args: &CliArgs) -> anyhow::Result<NetworkConfig> {
    match (&args.config, &args.url) {
        (Some(path), _) => Ok(NetworkConfig::load(path)?),
        (None, Some(url)) => {
            let chain_id = args.chain_id.unwrap_or(1);
            Ok(NetworkConfig {
                default_chain_id: Some(chain_id),
                networks: vec![EndpointConfig::new(chain_id, url.clone())],
            })
        }
        (None, None) => Err(anyhow!("Either --config or --url is required")),
    }
}

struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if self.enabled(record.metadata()) {
            eprintln!("{} - {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

fn init_logger(verbose: bool) -> anyhow::Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(level))
        .map_err(|error| anyhow!(error))
}

#[cfg(feature = "tracing")]
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .try_init()
        .map_err(|error| anyhow!(error))
}
