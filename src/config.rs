use crate::error::ConfigError;
use crate::executor::TransferSettings;
use crate::fee::{AmountRange, FeePolicy};
use crate::retry::RetryPolicy;
use crate::scheduler::{DailyTarget, SchedulePolicy};
use crate::types::SenderWallet;
use anyhow::{Context, Result};
use ethers::signers::LocalWallet;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

pub const SAMPLE_CONFIG: &str = r#"# Recipient addresses, one per line
address_file: "address.txt"

# Symbol of the chain's native token, used in logs
token_symbol: "TEA"

# Amount of each transfer in whole tokens, drawn on a 10^-decimals grid.
# Set min == max for a fixed amount.
amount:
  min: 0.01
  max: 3.0
  decimals: 2

# Gas price policy: fixed, live or live_markup
fee:
  policy: fixed
  gwei: 100.0
# fee:
#   policy: live_markup
#   min_factor: 1.1
#   max_factor: 1.3
#   min_gwei: 1.0
#   max_gwei: 200.0
#   fallback_gwei: 100.0

# Transfers per day: fixed count or a range drawn once per run
target:
  kind: range
  min: 125
  max: 150

# Spacing between transfers: even (day / target) or random per transfer
schedule:
  mode: even
# schedule:
#   mode: random
#   min_secs: 300
#   max_secs: 900

# Submissions per transfer and the wait between them
retry:
  max_attempts: 5
  delay_secs: 10

# Give up waiting for a receipt after this many seconds (unset waits forever)
# confirmation_timeout_secs: 600
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_secs: policy.delay.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub address_file: PathBuf,
    pub token_symbol: String,
    pub amount: AmountRange,
    pub fee: FeePolicy,
    pub target: DailyTarget,
    pub schedule: SchedulePolicy,
    pub retry: RetryConfig,
    pub confirmation_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address_file: PathBuf::from("address.txt"),
            token_symbol: "TEA".to_string(),
            amount: AmountRange::default(),
            fee: FeePolicy::default(),
            target: DailyTarget::default(),
            schedule: SchedulePolicy::default(),
            retry: RetryConfig::default(),
            confirmation_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path).context("Failed to open config file")?;
        let config: Config =
            serde_yaml::from_reader(file).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file means defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            warn!("Config file {:?} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.amount.validate()?;
        self.fee.validate()?;
        self.target.validate()?;
        self.schedule.validate()?;
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ZeroRetryAttempts);
        }
        Ok(())
    }

    pub fn transfer_settings(&self) -> TransferSettings {
        TransferSettings {
            amount: self.amount.clone(),
            fee: self.fee.clone(),
            retry: RetryPolicy {
                max_attempts: self.retry.max_attempts,
                delay: Duration::from_secs(self.retry.delay_secs),
            },
            confirmation_timeout: self.confirmation_timeout_secs.map(Duration::from_secs),
            token_symbol: self.token_symbol.clone(),
        }
    }
}

/// Builds the sending wallets. Duplicate keys collapse to one wallet.
pub fn load_wallets(keys: &[String]) -> Result<Vec<SenderWallet>, ConfigError> {
    if keys.is_empty() {
        return Err(ConfigError::NoSigningKeys);
    }

    let mut seen = HashSet::new();
    let mut wallets = Vec::with_capacity(keys.len());
    for (index, key) in keys.iter().enumerate() {
        let signer = key
            .parse::<LocalWallet>()
            .map_err(|e| ConfigError::InvalidKey {
                index: index + 1,
                reason: e.to_string(),
            })?;
        let wallet = SenderWallet::new(signer);
        if seen.insert(wallet.address()) {
            wallets.push(wallet);
        }
    }
    Ok(wallets)
}
