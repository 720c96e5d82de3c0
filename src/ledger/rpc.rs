use std::{str::FromStr, sync::Arc, time::Duration};

use alloy::{
    network::{EthereumWallet, ReceiptResponse, TransactionBuilder},
    primitives::{Address, B256, U256},
    providers::{DynProvider, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::local::PrivateKeySigner,
    sol,
    transports::TransportError,
};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::{
    chains::ChainDescriptor,
    error::{LedgerError, SwapError},
    secret::SecretString,
    types::{AssembledTransaction, ReceiptStatus, SwapConfig, SwapReceipt, NATIVE_TOKEN},
};

use super::{LedgerClient, LedgerConnector};

sol! {
    #[sol(rpc)]
    contract ERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function decimals() external view returns (uint8);
    }
}

/// [`LedgerClient`] backed by a local private key and a JSON-RPC endpoint.
///
/// The endpoint may come from the `RPC_URL` override rather than the chain
/// table, so the chain id it reports is checked once before the first read or
/// write. A mismatch fails every call with [`LedgerError::ChainMismatch`].
pub struct RpcLedger {
    provider: DynProvider,
    signer: Address,
    chain: ChainDescriptor,
    verified_chain: OnceCell<()>,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl RpcLedger {
    /// Loads the signer and builds the HTTP provider. No request is sent until
    /// the first ledger call.
    pub fn connect(
        chain: &ChainDescriptor,
        private_key: &SecretString,
        config: &SwapConfig,
    ) -> Result<Self, SwapError> {
        let signer = PrivateKeySigner::from_str(private_key.expose_secret().trim())
            .map_err(|e| SwapError::Config(format!("invalid wallet private key: {e}")))?;
        let address = signer.address();

        let endpoint = config
            .rpc_url
            .as_deref()
            .unwrap_or(&chain.default_endpoint);
        let url = endpoint
            .parse::<reqwest::Url>()
            .map_err(|e| SwapError::Config(format!("invalid RPC URL {endpoint}: {e}")))?;

        debug!(chain_id = chain.id, %address, "connecting ledger to {url}");
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            signer: address,
            chain: chain.clone(),
            verified_chain: OnceCell::new(),
            receipt_timeout: config.receipt_timeout,
            poll_interval: config.receipt_poll_interval,
        })
    }

    async fn ensure_chain(&self) -> Result<(), LedgerError> {
        self.verified_chain
            .get_or_try_init(|| async {
                let actual = self
                    .provider
                    .get_chain_id()
                    .await
                    .map_err(|e| LedgerError::Rpc(format!("failed to fetch chain id: {e}")))?;
                if actual != self.chain.id {
                    warn!(expected = self.chain.id, actual, "RPC endpoint serves another chain");
                    return Err(LedgerError::ChainMismatch {
                        expected: self.chain.id,
                        actual,
                    });
                }
                debug!(chain_id = actual, "RPC endpoint chain verified");
                Ok(())
            })
            .await
            .copied()
    }

    fn erc20(&self, token: Address) -> ERC20::ERC20Instance<DynProvider> {
        ERC20::new(token, self.provider.clone())
    }
}

fn classify(e: &TransportError) -> LedgerError {
    if e.as_error_resp().is_some() {
        LedgerError::Rejected(e.to_string())
    } else {
        LedgerError::Rpc(e.to_string())
    }
}

fn to_swap_receipt(receipt: &TransactionReceipt) -> SwapReceipt {
    SwapReceipt {
        hash: receipt.transaction_hash(),
        status: if receipt.status() {
            ReceiptStatus::Confirmed
        } else {
            ReceiptStatus::Failed
        },
        block_number: receipt.block_number().unwrap_or_default(),
        gas_used: receipt.gas_used(),
        effective_gas_price: receipt.effective_gas_price(),
        from: receipt.from(),
        to: receipt.to(),
    }
}

#[async_trait]
impl LedgerClient for RpcLedger {
    fn signer_address(&self) -> Option<Address> {
        Some(self.signer)
    }

    fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    async fn token_decimals(&self, token: Address) -> Result<u8, LedgerError> {
        if token == NATIVE_TOKEN {
            return Ok(self.chain.native_currency.decimals);
        }
        self.ensure_chain().await?;
        self.erc20(token)
            .decimals()
            .call()
            .await
            .map_err(|e| LedgerError::Rpc(format!("decimals() on {token} failed: {e}")))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        self.ensure_chain().await?;
        self.erc20(token)
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|e| LedgerError::Rpc(format!("allowance() on {token} failed: {e}")))
    }

    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, LedgerError> {
        self.ensure_chain().await?;
        let pending = self
            .erc20(token)
            .approve(spender, amount)
            .from(self.signer)
            .chain_id(self.chain.id)
            .send()
            .await
            .map_err(|e| LedgerError::Rejected(format!("approve() on {token} failed: {e}")))?;
        Ok(*pending.tx_hash())
    }

    async fn transaction_count(&self, owner: Address) -> Result<u64, LedgerError> {
        self.ensure_chain().await?;
        self.provider
            .get_transaction_count(owner)
            .pending()
            .await
            .map_err(|e| LedgerError::Rpc(format!("failed to fetch nonce: {e}")))
    }

    async fn send_transaction(
        &self,
        txn: &AssembledTransaction,
        nonce: u64,
    ) -> Result<B256, LedgerError> {
        self.ensure_chain().await?;
        let request = TransactionRequest::default()
            .with_from(self.signer)
            .with_to(txn.to)
            .with_input(txn.data.clone())
            .with_value(txn.value)
            .with_gas_limit(txn.gas)
            .with_gas_price(txn.gas_price)
            .with_nonce(nonce)
            .with_chain_id(self.chain.id);

        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| classify(&e))?;
        Ok(*pending.tx_hash())
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<SwapReceipt, LedgerError> {
        let poll = async {
            loop {
                match self.provider.get_transaction_receipt(hash).await {
                    Ok(Some(receipt)) => return to_swap_receipt(&receipt),
                    Ok(None) => {}
                    Err(e) => warn!(%hash, error = %e, "receipt lookup failed"),
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };
        tokio::time::timeout(self.receipt_timeout, poll)
            .await
            .map_err(|_| LedgerError::ReceiptTimeout(hash))
    }
}

/// Default [`LedgerConnector`]: one [`RpcLedger`] per operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct RpcConnector;

impl LedgerConnector for RpcConnector {
    fn connect(
        &self,
        chain: &ChainDescriptor,
        private_key: &SecretString,
        config: &SwapConfig,
    ) -> Result<Arc<dyn LedgerClient>, SwapError> {
        let ledger: Arc<dyn LedgerClient> =
            Arc::new(RpcLedger::connect(chain, private_key, config)?);
        Ok(ledger)
    }
}
