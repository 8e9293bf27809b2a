use crate::error::AddressError;
use crate::types::{Settlement, TransferRequest};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use ethers::prelude::*;
use ethers::utils::to_checksum;
use tracing::debug;

/// The chain operations a transfer run needs. Signing, nonces and RPC
/// transport stay inside the implementation.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn balance(&self, address: Address) -> Result<U256>;

    async fn gas_price(&self) -> Result<U256>;

    /// Signs and broadcasts a value transfer, returning its hash.
    async fn submit_transfer(&self, wallet: &LocalWallet, request: TransferRequest)
    -> Result<TxHash>;

    /// Blocks until the transaction is mined.
    async fn await_settlement(&self, tx_hash: TxHash) -> Result<Settlement>;

    fn validate_address(&self, input: &str) -> Result<Address, AddressError> {
        parse_address(input)
    }
}

/// Parses 40 hex digits, `0x` prefix optional. Mixed-case input must carry a
/// valid EIP-55 checksum.
pub fn parse_address(input: &str) -> Result<Address, AddressError> {
    let hex = input.strip_prefix("0x").unwrap_or(input);
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AddressError::NotHex);
    }
    if hex.len() != 40 {
        return Err(AddressError::BadLength(hex.len()));
    }

    let address: Address = hex.parse().map_err(|_| AddressError::NotHex)?;

    let mixed_case = hex.chars().any(|c| c.is_ascii_lowercase())
        && hex.chars().any(|c| c.is_ascii_uppercase());
    if mixed_case && to_checksum(&address, None).trim_start_matches("0x") != hex {
        return Err(AddressError::BadChecksum);
    }

    Ok(address)
}

pub struct EthersClient {
    provider: Provider<Http>,
    chain_id: u64,
}

impl EthersClient {
    pub async fn connect(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .with_context(|| format!("Invalid RPC url: {}", rpc_url))?;

        let chain_id = provider
            .get_chainid()
            .await
            .context("Failed to query chain id")?
            .as_u64();

        Ok(Self { provider, chain_id })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[async_trait]
impl ChainClient for EthersClient {
    async fn balance(&self, address: Address) -> Result<U256> {
        self.provider
            .get_balance(address, None)
            .await
            .with_context(|| format!("Failed to get balance of {:?}", address))
    }

    async fn gas_price(&self) -> Result<U256> {
        self.provider
            .get_gas_price()
            .await
            .context("Failed to get gas price")
    }

    async fn submit_transfer(
        &self,
        wallet: &LocalWallet,
        request: TransferRequest,
    ) -> Result<TxHash> {
        let client = SignerMiddleware::new(
            self.provider.clone(),
            wallet.clone().with_chain_id(self.chain_id),
        );

        let tx = TransactionRequest::new()
            .to(request.to)
            .value(request.value)
            .gas_price(request.gas_price)
            .gas(request.gas_limit);

        let pending = client
            .send_transaction(tx, None)
            .await
            .context("Failed to send transaction")?;

        let tx_hash = pending.tx_hash();
        debug!("Broadcast transaction {:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn await_settlement(&self, tx_hash: TxHash) -> Result<Settlement> {
        let receipt = PendingTransaction::new(tx_hash, &self.provider)
            .await
            .with_context(|| format!("Failed to confirm transaction {:?}", tx_hash))?
            .ok_or_else(|| anyhow!("Transaction {:?} was dropped from the mempool", tx_hash))?;

        Ok(Settlement {
            success: receipt.status == Some(U64::from(1)),
            block_number: receipt.block_number.map(|block| block.as_u64()),
        })
    }
}
