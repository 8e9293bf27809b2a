use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_RPC_URL: &str = "https://tea-sepolia.g.alchemy.com/public";

#[derive(Parser, Debug)]
#[command(version = "0.1.0")]
#[command(about = "Daily native-token transfer scheduler")]
#[command(
    long_about = "Sends small native-token transfers from randomly chosen wallets to randomly \
    chosen recipients, spread across a day. Supports fixed or live gas pricing, balance checks \
    and retry with a fixed delay, configured from YAML and environment variables."
)]
pub struct Args {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the transfer schedule until today's target is reached
    Run {
        /// Path to the YAML configuration file
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Recipient address file, overrides `address_file` from the config
        #[arg(short, long)]
        addresses: Option<PathBuf>,

        #[command(flatten)]
        network: NetworkArgs,

        #[command(flatten)]
        keys: KeyArgs,
    },

    /// Generate a sample config file
    GenerateConfig {
        /// Path to output config file
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Print the current network gas price and the fee of a plain transfer
    CheckGas {
        #[command(flatten)]
        network: NetworkArgs,

        /// Native token symbol shown next to the fee
        #[arg(long, default_value = "TEA")]
        token_symbol: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct NetworkArgs {
    /// JSON-RPC endpoint of the chain
    #[arg(long, env = "RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,
}

#[derive(clap::Args, Debug)]
pub struct KeyArgs {
    /// Comma-separated private keys of the sending wallets
    #[arg(long, env = "PRIVATE_KEYS", value_delimiter = ',', hide_env_values = true)]
    pub private_keys: Vec<String>,

    /// Single private key, used alongside PRIVATE_KEYS
    #[arg(long, env = "PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,
}

impl KeyArgs {
    /// All configured keys, trimmed, with blanks dropped.
    pub fn all_keys(&self) -> Vec<String> {
        self.private_keys
            .iter()
            .chain(self.private_key.iter())
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .collect()
    }
}
