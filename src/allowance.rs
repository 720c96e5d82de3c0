use std::sync::Arc;

use alloy::primitives::{Address, U256};
use tracing::{debug, info, warn};

use crate::{error::SwapError, ledger::LedgerClient, types::NATIVE_TOKEN};

/// Makes sure the router may move the input token before a swap is sent.
///
/// Correct for one in-flight swap per signer; concurrent swaps for the same
/// owner/spender pair must be serialized by the caller.
pub struct AllowanceManager {
    ledger: Arc<dyn LedgerClient>,
}

impl AllowanceManager {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    pub fn requires_allowance(token: Address) -> bool {
        token != NATIVE_TOKEN
    }

    /// Returns `true` once `spender` may transfer `amount` of `token` for the
    /// signer. Approves exactly `amount` when the current allowance falls
    /// short, and returns whether that approval was mined successfully.
    pub async fn ensure_allowance(
        &self,
        token: Address,
        amount: U256,
        spender: Address,
    ) -> Result<bool, SwapError> {
        if !Self::requires_allowance(token) {
            debug!("native input, no allowance needed");
            return Ok(true);
        }

        let owner = self
            .ledger
            .signer_address()
            .ok_or(SwapError::MissingSigner)?;

        let current = self
            .ledger
            .allowance(token, owner, spender)
            .await
            .map_err(|e| e.into_swap(SwapError::Allowance))?;

        if current >= amount {
            debug!(%token, %spender, %current, "allowance already sufficient");
            return Ok(true);
        }

        info!(%token, %spender, %amount, "approving router allowance");
        let hash = self
            .ledger
            .approve(token, spender, amount)
            .await
            .map_err(|e| e.into_swap(SwapError::Allowance))?;

        let receipt = self
            .ledger
            .wait_for_receipt(hash)
            .await
            .map_err(|e| SwapError::Allowance(format!("approval {hash} not confirmed: {e}")))?;

        if !receipt.is_confirmed() {
            warn!(%hash, block = receipt.block_number, "approval reverted");
        }
        Ok(receipt.is_confirmed())
    }
}
