use std::{collections::HashMap, sync::Arc};

use alloy::primitives::Address;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Advisory locks keyed by signer address.
///
/// The pipeline reads the nonce and the router allowance without any locking
/// of its own, so two swaps for one signer must not overlap. Callers hold the
/// guard from [`SignerLocks::acquire`] for the whole run.
#[derive(Debug, Clone, Default)]
pub struct SignerLocks {
    inner: Arc<Mutex<HashMap<Address, Arc<Mutex<()>>>>>,
}

impl SignerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries nobody holds or waits on are dropped on the way in, so the
    /// table stays bounded by the number of signers in flight.
    pub async fn acquire(&self, signer: Address) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.inner.lock().await;
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(table.entry(signer).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of signers currently present in the table.
    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}
