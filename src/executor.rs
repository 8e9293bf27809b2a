use crate::chain::ChainClient;
use crate::fee::{AmountRange, FeePolicy};
use crate::retry::{RetryPolicy, Sleeper};
use crate::selector::{pick_recipient, pick_wallet};
use crate::types::{
    AttemptOutcome, GAS_LIMIT, SenderWallet, Settlement, TransferRequest, TransferResult,
};
use anyhow::{Result, anyhow, bail};
use ethers::types::{TxHash, U256};
use ethers::utils::format_ether;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct TransferSettings {
    pub amount: AmountRange,
    pub fee: FeePolicy,
    pub retry: RetryPolicy,
    /// `None` waits for the receipt indefinitely.
    pub confirmation_timeout: Option<Duration>,
    pub token_symbol: String,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            amount: AmountRange::default(),
            fee: FeePolicy::default(),
            retry: RetryPolicy::default(),
            confirmation_timeout: None,
            token_symbol: "TEA".to_string(),
        }
    }
}

/// Runs one transfer attempt: select, check balance, then submit and confirm
/// under the retry policy.
pub struct TransferExecutor<'a> {
    client: &'a dyn ChainClient,
    sleeper: &'a dyn Sleeper,
    wallets: &'a [SenderWallet],
    recipients: &'a [String],
    settings: &'a TransferSettings,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(
        client: &'a dyn ChainClient,
        sleeper: &'a dyn Sleeper,
        wallets: &'a [SenderWallet],
        recipients: &'a [String],
        settings: &'a TransferSettings,
    ) -> Self {
        Self {
            client,
            sleeper,
            wallets,
            recipients,
            settings,
        }
    }

    pub async fn execute<R: Rng + ?Sized>(&self, rng: &mut R) -> AttemptOutcome {
        // Selection failures abort without touching the chain.
        let Some(recipient) = pick_recipient(self.recipients, rng) else {
            return skipped("No recipient addresses available");
        };
        let to = match self.client.validate_address(recipient) {
            Ok(address) => address,
            Err(e) => return skipped(format!("Invalid recipient address {}: {}", recipient, e)),
        };
        let Some(wallet) = pick_wallet(self.wallets, rng) else {
            return skipped("No wallets available");
        };

        let amount = self.settings.amount.sample(rng);
        let gas_price = self.settings.fee.gas_price(self.client, rng).await;
        let request = TransferRequest {
            to,
            value: amount,
            gas_price,
            gas_limit: U256::from(GAS_LIMIT),
        };
        let from = wallet.address();
        let symbol = &self.settings.token_symbol;

        info!(
            "Sending {} {} from {:?} to {:?} at {} gwei",
            format_ether(amount),
            symbol,
            from,
            to,
            gas_price / U256::exp10(9)
        );

        let balance = match self.client.balance(from).await {
            Ok(balance) => balance,
            Err(e) => return failed(format!("Balance check for {:?} failed: {:#}", from, e), 0),
        };
        info!("Wallet balance: {} {}", format_ether(balance), symbol);

        let Some(required) = request.required_balance() else {
            return failed(
                format!(
                    "Transfer cost overflows: {} wei at gas price {} wei",
                    amount, gas_price
                ),
                0,
            );
        };
        if balance < required {
            return failed(
                format!(
                    "Insufficient balance in {:?}: has {} {}, needs {} {}",
                    from,
                    format_ether(balance),
                    symbol,
                    format_ether(required),
                    symbol
                ),
                0,
            );
        }

        let start = Instant::now();
        let outcome = self
            .settings
            .retry
            .run(self.sleeper, |attempt| {
                self.submit_and_confirm(wallet, request, attempt)
            })
            .await;

        match outcome {
            Ok(((tx_hash, settlement), submissions)) => {
                info!(
                    "Sent {} {} to {:?}, confirmed in block {}",
                    format_ether(amount),
                    symbol,
                    to,
                    settlement
                        .block_number
                        .map(|b| b.to_string())
                        .unwrap_or_else(|| "unknown".to_string())
                );
                AttemptOutcome::Succeeded(TransferResult {
                    from,
                    to,
                    amount,
                    tx_hash,
                    block_number: settlement.block_number,
                    submissions,
                    duration_ms: start.elapsed().as_millis() as u64,
                })
            }
            Err(exhausted) => failed(
                format!("Transfer from {:?} to {:?} abandoned: {}", from, to, exhausted),
                exhausted.attempts,
            ),
        }
    }

    async fn submit_and_confirm(
        &self,
        wallet: &SenderWallet,
        request: TransferRequest,
        attempt: u32,
    ) -> Result<(TxHash, Settlement)> {
        let tx_hash = self
            .client
            .submit_transfer(&wallet.signer, request)
            .await?;
        info!("Tx hash: {:?} (submission {})", tx_hash, attempt);
        info!("Waiting for transaction confirmation...");

        let settlement = match self.settings.confirmation_timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.await_settlement(tx_hash))
                .await
                .map_err(|_| {
                    anyhow!(
                        "Timed out after {}s waiting for {:?}",
                        limit.as_secs(),
                        tx_hash
                    )
                })??,
            None => self.client.await_settlement(tx_hash).await?,
        };

        if !settlement.success {
            bail!("Transaction {:?} failed on chain", tx_hash);
        }
        Ok((tx_hash, settlement))
    }
}

fn skipped(reason: impl Into<String>) -> AttemptOutcome {
    let reason = reason.into();
    warn!("Skipping transfer: {}", reason);
    AttemptOutcome::Skipped { reason }
}

fn failed(reason: String, submissions: u32) -> AttemptOutcome {
    error!("Transfer failed after {} submissions: {}", submissions, reason);
    AttemptOutcome::Failed {
        reason,
        submissions,
    }
}
