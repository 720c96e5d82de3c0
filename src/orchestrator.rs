use std::{future::Future, sync::Arc, time::Duration};

use alloy::primitives::B256;
use tracing::{info, warn};

use crate::{
    allowance::AllowanceManager,
    error::{SwapError, SwapFailure},
    executor::TransactionExecutor,
    ledger::LedgerClient,
    odos::{AssembleService, OdosApi, QuoteService},
    types::{AssembledTransaction, Quote, Stage, SwapIntent, SwapReceipt, SwapState},
};

/// Terminal result of one pipeline run.
#[derive(Debug)]
pub enum SwapOutcome {
    NoRoute {
        quote: Quote,
    },
    Confirmed {
        quote: Quote,
        transaction: AssembledTransaction,
        receipt: SwapReceipt,
    },
    Reverted {
        quote: Quote,
        transaction: AssembledTransaction,
        receipt: SwapReceipt,
    },
    Failed(SwapFailure),
}

impl SwapOutcome {
    pub fn state(&self) -> SwapState {
        match self {
            Self::NoRoute { .. } => SwapState::NoRoute,
            Self::Confirmed { .. } => SwapState::Confirmed,
            Self::Reverted { .. } => SwapState::Reverted,
            Self::Failed(_) => SwapState::Failed,
        }
    }

    /// Collapses every outcome other than `Confirmed` into a failure, for
    /// callers that only care whether the swap went through.
    pub fn into_result(self) -> Result<SwapReceipt, SwapFailure> {
        match self {
            Self::Confirmed { receipt, .. } => Ok(receipt),
            Self::NoRoute { quote } => Err(SwapFailure {
                stage: Stage::Quote,
                source: SwapError::NoRouteFound,
                quote: Some(quote),
                transaction: None,
                hash: None,
            }),
            Self::Reverted {
                quote,
                transaction,
                receipt,
            } => Err(SwapFailure {
                stage: Stage::Confirm,
                source: SwapError::ExecutionReverted {
                    hash: receipt.hash,
                    block: receipt.block_number,
                },
                quote: Some(quote),
                transaction: Some(transaction),
                hash: Some(receipt.hash),
            }),
            Self::Failed(failure) => Err(failure),
        }
    }
}

/// Runs quote → assemble → allowance → submit → confirm for one intent.
///
/// Holds no state between runs. Each stage starts only after the previous one
/// succeeded, and nothing is retried. Runs for the same signer must not
/// overlap; [`SignerLocks`](crate::locks::SignerLocks) is the caller-side guard.
pub struct SwapOrchestrator {
    quotes: QuoteService,
    assembler: AssembleService,
    allowances: AllowanceManager,
    executor: TransactionExecutor,
    stage_timeout: Option<Duration>,
}

fn enter(state: SwapState, chain_id: u64) {
    info!(%state, chain_id, "swap state");
}

fn failed(
    stage: Stage,
    source: SwapError,
    quote: Option<Quote>,
    transaction: Option<AssembledTransaction>,
    hash: Option<B256>,
) -> SwapOutcome {
    let failure = SwapFailure {
        stage,
        source,
        quote,
        transaction,
        hash,
    };
    warn!(state = %SwapState::Failed, %stage, "{failure}");
    SwapOutcome::Failed(failure)
}

impl SwapOrchestrator {
    pub fn new(api: OdosApi, ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            quotes: QuoteService::new(api.clone(), Arc::clone(&ledger)),
            assembler: AssembleService::new(api, Arc::clone(&ledger)),
            allowances: AllowanceManager::new(Arc::clone(&ledger)),
            executor: TransactionExecutor::new(ledger),
            stage_timeout: None,
        }
    }

    /// Bounds the quote and assemble calls. Later stages are never cut short:
    /// an approval or swap already sent cannot be withdrawn.
    pub fn with_stage_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn quotes(&self) -> &QuoteService {
        &self.quotes
    }

    async fn bounded<T>(
        &self,
        stage: Stage,
        fut: impl Future<Output = Result<T, SwapError>>,
    ) -> Result<T, SwapError> {
        match self.stage_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| SwapError::StageTimeout { stage })?,
            None => fut.await,
        }
    }

    pub async fn run(&self, intent: &SwapIntent) -> SwapOutcome {
        let chain_id = intent.chain().id;
        enter(SwapState::Requested, chain_id);

        let quote = match self
            .bounded(Stage::Quote, self.quotes.get_quote(intent))
            .await
        {
            Ok(quote) => quote,
            Err(e) => return failed(Stage::Quote, e, None, None, None),
        };
        enter(SwapState::Quoted, chain_id);

        let Some(path_id) = quote.path_id.clone() else {
            enter(SwapState::NoRoute, chain_id);
            return SwapOutcome::NoRoute { quote };
        };

        let transaction = match self
            .bounded(Stage::Assemble, self.assembler.assemble(&path_id))
            .await
        {
            Ok(txn) => txn,
            Err(e) => return failed(Stage::Assemble, e, Some(quote), None, None),
        };
        enter(SwapState::Assembled, chain_id);

        let (token, amount) = match quote.input_leg() {
            Ok((token, _)) if token != intent.from_token() => {
                let e = SwapError::Validation(format!(
                    "quote input token {token} does not match requested {}",
                    intent.from_token()
                ));
                return failed(Stage::Allowance, e, Some(quote), Some(transaction), None);
            }
            Ok(leg) => leg,
            Err(e) => return failed(Stage::Allowance, e, Some(quote), Some(transaction), None),
        };

        match self
            .allowances
            .ensure_allowance(token, amount, transaction.to)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                let e = SwapError::Allowance("approval transaction reverted".to_string());
                return failed(Stage::Allowance, e, Some(quote), Some(transaction), None);
            }
            Err(e) => return failed(Stage::Allowance, e, Some(quote), Some(transaction), None),
        }
        enter(SwapState::Authorized, chain_id);

        let hash = match self.executor.submit(&transaction).await {
            Ok(hash) => hash,
            Err(e) => return failed(Stage::Submit, e, Some(quote), Some(transaction), None),
        };
        info!(state = %SwapState::Submitted, chain_id, %hash, "swap state");

        let receipt = match self.executor.confirm(hash).await {
            Ok(receipt) => receipt,
            Err(e) => {
                return failed(Stage::Confirm, e, Some(quote), Some(transaction), Some(hash));
            }
        };

        if receipt.is_confirmed() {
            info!(state = %SwapState::Confirmed, chain_id, %hash, block = receipt.block_number, "swap state");
            SwapOutcome::Confirmed {
                quote,
                transaction,
                receipt,
            }
        } else {
            warn!(state = %SwapState::Reverted, chain_id, %hash, block = receipt.block_number, "swap state");
            SwapOutcome::Reverted {
                quote,
                transaction,
                receipt,
            }
        }
    }
}
