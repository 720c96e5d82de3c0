pub mod rpc;

use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;

use crate::{
    chains::ChainDescriptor,
    error::{LedgerError, SwapError},
    secret::SecretString,
    types::{AssembledTransaction, SwapConfig, SwapReceipt},
};

pub use rpc::{RpcConnector, RpcLedger};

/// Signing account plus chain access for one configured network.
///
/// Everything the pipeline does on chain goes through this trait: reads,
/// approvals, raw submission and receipt retrieval.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Address of the signing account, if one is loaded.
    fn signer_address(&self) -> Option<Address>;

    /// Chain the account signs for.
    fn chain(&self) -> &ChainDescriptor;

    /// Decimal exponent of `token`; the native sentinel answers with the
    /// chain's native currency decimals.
    async fn token_decimals(&self, token: Address) -> Result<u8, LedgerError>;

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError>;

    /// Submits `approve(spender, amount)` on `token` and returns the hash.
    async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, LedgerError>;

    async fn transaction_count(&self, owner: Address) -> Result<u64, LedgerError>;

    /// Signs and sends `txn` with `nonce` in place of the assembled one.
    async fn send_transaction(
        &self,
        txn: &AssembledTransaction,
        nonce: u64,
    ) -> Result<B256, LedgerError>;

    /// Blocks until `hash` is mined or the client's own timeout expires.
    async fn wait_for_receipt(&self, hash: B256) -> Result<SwapReceipt, LedgerError>;
}

/// Builds a [`LedgerClient`] for a resolved chain and signing credential.
pub trait LedgerConnector: Send + Sync {
    fn connect(
        &self,
        chain: &ChainDescriptor,
        private_key: &SecretString,
        config: &SwapConfig,
    ) -> Result<Arc<dyn LedgerClient>, SwapError>;
}
