use crate::chain::ChainClient;
use crate::retry::Sleeper;
use crate::types::{SenderWallet, Settlement, TransferRequest};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, TxHash, U256};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

pub fn test_wallets(count: u8) -> Vec<SenderWallet> {
    (1..=count)
        .map(|i| SenderWallet::new(LocalWallet::from_bytes(&[i; 32]).unwrap()))
        .collect()
}

enum ScriptedSettlement {
    Mined(Settlement),
    Dropped,
    /// Never resolves, as when the node loses the transaction silently.
    Hang,
}

/// Scripted chain. Submissions and settlements succeed unless a failure was
/// queued for them.
#[derive(Default)]
pub struct MockChain {
    balance: U256,
    balance_unavailable: bool,
    gas_price: Option<U256>,
    submit_failures: Mutex<VecDeque<String>>,
    settlements: Mutex<VecDeque<ScriptedSettlement>>,
    submitted: Mutex<Vec<(Address, TransferRequest)>>,
    gas_price_calls: AtomicU32,
    balance_calls: AtomicU32,
}

impl MockChain {
    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    pub fn with_balance_unavailable(mut self) -> Self {
        self.balance_unavailable = true;
        self
    }

    pub fn with_gas_price(mut self, gas_price: Option<U256>) -> Self {
        self.gas_price = gas_price;
        self
    }

    pub fn failing_submissions(self, count: usize) -> Self {
        self.submit_failures
            .lock()
            .unwrap()
            .extend((0..count).map(|i| format!("replacement fee too low #{}", i + 1)));
        self
    }

    pub fn reverted_settlements(self, count: usize) -> Self {
        self.settlements.lock().unwrap().extend((0..count).map(|_| {
            ScriptedSettlement::Mined(Settlement {
                success: false,
                block_number: Some(1),
            })
        }));
        self
    }

    pub fn dropped_settlements(self, count: usize) -> Self {
        self.settlements
            .lock()
            .unwrap()
            .extend((0..count).map(|_| ScriptedSettlement::Dropped));
        self
    }

    pub fn hanging_settlements(self, count: usize) -> Self {
        self.settlements
            .lock()
            .unwrap()
            .extend((0..count).map(|_| ScriptedSettlement::Hang));
        self
    }

    pub fn submissions(&self) -> Vec<(Address, TransferRequest)> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn gas_price_calls(&self) -> u32 {
        self.gas_price_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> u32 {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn balance(&self, _address: Address) -> Result<U256> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if self.balance_unavailable {
            return Err(anyhow!("balance query timed out"));
        }
        Ok(self.balance)
    }

    async fn gas_price(&self) -> Result<U256> {
        self.gas_price_calls.fetch_add(1, Ordering::SeqCst);
        self.gas_price.ok_or_else(|| anyhow!("eth_gasPrice unavailable"))
    }

    async fn submit_transfer(
        &self,
        wallet: &LocalWallet,
        request: TransferRequest,
    ) -> Result<TxHash> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push((wallet.address(), request));
        if let Some(reason) = self.submit_failures.lock().unwrap().pop_front() {
            return Err(anyhow!(reason));
        }
        Ok(TxHash::from_low_u64_be(submitted.len() as u64))
    }

    async fn await_settlement(&self, _tx_hash: TxHash) -> Result<Settlement> {
        let next = self.settlements.lock().unwrap().pop_front();
        match next {
            Some(ScriptedSettlement::Mined(settlement)) => Ok(settlement),
            Some(ScriptedSettlement::Dropped) => Err(anyhow!("dropped from the mempool")),
            Some(ScriptedSettlement::Hang) => std::future::pending().await,
            None => Ok(Settlement {
                success: true,
                block_number: Some(42),
            }),
        }
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
