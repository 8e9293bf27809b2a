mod addresses;
mod args;
mod chain;
mod config;
mod error;
mod executor;
mod fee;
mod retry;
mod scheduler;
mod selector;
#[cfg(test)]
mod testutil;
mod types;

use anyhow::{Context, Result};
use args::{Args, Commands, KeyArgs, NetworkArgs};
use chain::EthersClient;
use clap::Parser;
use config::{Config, SAMPLE_CONFIG, load_wallets};
use executor::TransferExecutor;
use rand::SeedableRng;
use rand::rngs::StdRng;
use retry::TokioSleeper;
use scheduler::{Countdown, RunState, Scheduler};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env has to be loaded before clap reads RPC_URL and the keys
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match args.command {
        Commands::Run {
            config: config_path,
            addresses,
            network,
            keys,
        } => run(&config_path, addresses, network, keys).await?,

        Commands::GenerateConfig { output } => generate_config(&output)?,

        Commands::CheckGas {
            network,
            token_symbol,
        } => {
            let client = EthersClient::connect(&network.rpc_url).await?;
            info!(
                "Connected to {} (chain id {})",
                network.rpc_url,
                client.chain_id()
            );
            fee::report_network_fee(&client, &token_symbol).await;
        }
    }

    Ok(())
}

async fn run(
    config_path: &Path,
    address_file: Option<PathBuf>,
    network: NetworkArgs,
    keys: KeyArgs,
) -> Result<()> {
    info!("Starting daily-sender");

    let wallets = load_wallets(&keys.all_keys())?;
    info!("Loaded {} wallet(s)", wallets.len());

    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    config.validate().context("Invalid configuration")?;

    let address_file = address_file.unwrap_or_else(|| config.address_file.clone());
    let recipients = addresses::load_recipients(&address_file).await;

    let client = EthersClient::connect(&network.rpc_url).await?;
    info!(
        "Connected to {} (chain id {})",
        network.rpc_url,
        client.chain_id()
    );
    fee::report_network_fee(&client, &config.token_symbol).await;

    let settings = config.transfer_settings();
    let mut rng = StdRng::from_entropy();
    let mut state = RunState::new(config.target.resolve(&mut rng));

    let executor = TransferExecutor::new(&client, &TokioSleeper, &wallets, &recipients, &settings);
    let scheduler = Scheduler::new(executor, config.schedule.clone(), &Countdown);

    info!("Starting transaction scheduler");
    scheduler.run(&mut state, &mut rng).await;

    state.stats.print_summary(&config.token_symbol);
    Ok(())
}

fn generate_config(output: &Path) -> Result<()> {
    let mut file = File::create(output)
        .with_context(|| format!("Failed to create config file at {:?}", output))?;
    file.write_all(SAMPLE_CONFIG.as_bytes())?;

    info!("Sample configuration file generated at {:?}", output);
    info!("Set RPC_URL and PRIVATE_KEYS (or PRIVATE_KEY) in the environment or a .env file.");
    Ok(())
}
