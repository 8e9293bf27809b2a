use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash, U256};
use ethers::utils::format_ether;

/// Gas units consumed by a plain value transfer.
pub const GAS_LIMIT: u64 = 21_000;

#[derive(Debug, Clone)]
pub struct SenderWallet {
    pub signer: LocalWallet,
}

impl SenderWallet {
    pub fn new(signer: LocalWallet) -> Self {
        Self { signer }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

/// One transfer as it goes on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub to: Address,
    pub value: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
}

impl TransferRequest {
    /// `None` when the product does not fit in 256 bits.
    pub fn estimated_fee(&self) -> Option<U256> {
        self.gas_price.checked_mul(self.gas_limit)
    }

    /// Balance the sender needs to cover value and fee.
    pub fn required_balance(&self) -> Option<U256> {
        self.estimated_fee()?.checked_add(self.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub success: bool,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct TransferResult {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub submissions: u32,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Succeeded(TransferResult),
    /// Balance check or every submission failed.
    Failed { reason: String, submissions: u32 },
    /// Aborted before anything was checked on chain.
    Skipped { reason: String },
}

/// Counters for one scheduling run. `done == succeeded + failed + skipped`.
#[derive(Debug, Default)]
pub struct RunStatistics {
    pub done: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub skipped: u32,
    pub total_sent: U256,
    pub results: Vec<TransferResult>,
    pub failures: Vec<String>,
    pub skips: Vec<String>,
}

impl RunStatistics {
    pub fn record(&mut self, outcome: AttemptOutcome) {
        self.done += 1;
        match outcome {
            AttemptOutcome::Succeeded(result) => {
                self.succeeded += 1;
                self.total_sent = self.total_sent.saturating_add(result.amount);
                self.results.push(result);
            }
            AttemptOutcome::Failed { reason, .. } => {
                self.failed += 1;
                self.failures.push(reason);
            }
            AttemptOutcome::Skipped { reason } => {
                self.skipped += 1;
                self.skips.push(reason);
            }
        }
    }

    pub fn print_summary(&self, token_symbol: &str) {
        println!("\n{:-^80}", " RESULTS SUMMARY ");
        println!(
            "{:<5} {:<68} {:<14} {:<10} {:<10} {:<44} {:<44}",
            "No.", "Tx Hash", "Amount", "Block", "Time (ms)", "From", "To"
        );
        println!("{:-^80}", "");

        for (i, result) in self.results.iter().enumerate() {
            println!(
                "{:<5} {:<68} {:<14} {:<10} {:<10} {:<44} {:<44}",
                i + 1,
                format!("{:?}", result.tx_hash),
                format_ether(result.amount),
                result
                    .block_number
                    .map(|b| b.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                result.duration_ms,
                format!("{:?}", result.from),
                format!("{:?}", result.to),
            );
        }

        if !self.failures.is_empty() {
            println!("\n{:-^80}", " FAILURES ");
            for reason in &self.failures {
                println!("    {}", reason);
            }
        }

        if !self.skips.is_empty() {
            println!("\n{:-^80}", " SKIPPED ");
            for reason in &self.skips {
                println!("    {}", reason);
            }
        }

        let average_duration = if self.results.is_empty() {
            0
        } else {
            self.results.iter().map(|r| r.duration_ms).sum::<u64>() / self.results.len() as u64
        };

        println!("\n{:-^80}", " STATISTICS ");
        println!("Total attempts: {}", self.done);
        println!("Successful: {}", self.succeeded);
        println!("Failed: {}", self.failed);
        println!("Skipped: {}", self.skipped);
        println!("Total sent: {} {}", format_ether(self.total_sent), token_symbol);
        println!("Average confirmation time: {}ms", average_duration);
    }
}
