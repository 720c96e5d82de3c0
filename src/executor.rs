use std::sync::Arc;

use alloy::primitives::B256;
use tracing::{info, warn};

use crate::{
    error::{LedgerError, SwapError},
    ledger::LedgerClient,
    types::{AssembledTransaction, SwapReceipt},
};

/// Sends an assembled swap and waits for it to settle.
pub struct TransactionExecutor {
    ledger: Arc<dyn LedgerClient>,
}

impl TransactionExecutor {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    /// Signs and sends `txn`. The nonce is read from chain right before
    /// sending; the one embedded by the assembler may already be stale.
    pub async fn submit(&self, txn: &AssembledTransaction) -> Result<B256, SwapError> {
        let signer = self
            .ledger
            .signer_address()
            .ok_or(SwapError::MissingSigner)?;
        let chain_id = self.ledger.chain().id;
        if txn.chain_id != chain_id {
            return Err(SwapError::Validation(format!(
                "transaction was assembled for chain {} but the signer is configured for chain {chain_id}",
                txn.chain_id
            )));
        }

        let nonce = self
            .ledger
            .transaction_count(signer)
            .await
            .map_err(|e| e.into_swap(SwapError::Submission))?;
        if nonce != txn.nonce {
            warn!(
                assembled = txn.nonce,
                current = nonce,
                "assembled nonce is stale, using current transaction count"
            );
        }

        let hash = self
            .ledger
            .send_transaction(txn, nonce)
            .await
            .map_err(|e| e.into_swap(SwapError::Submission))?;
        info!(%hash, nonce, to = %txn.to, "swap submitted");
        Ok(hash)
    }

    /// Waits for the receipt of `hash`. A reverted transaction is returned as
    /// a receipt with a failed status, not as an error.
    pub async fn confirm(&self, hash: B256) -> Result<SwapReceipt, SwapError> {
        self.ledger
            .wait_for_receipt(hash)
            .await
            .map_err(|e| match e {
                LedgerError::ReceiptTimeout(hash) => SwapError::ConfirmationTimeout { hash },
                other => SwapError::Ledger(other.to_string()),
            })
    }
}
