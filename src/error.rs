use alloy::primitives::B256;

use crate::types::{AssembledTransaction, Quote, Stage};

#[derive(Debug, thiserror::Error)]
pub enum SwapError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("invalid or unsupported chain: {0}")]
    UnsupportedChain(String),

    #[error("user address is not defined")]
    MissingSigner,

    #[error("failed to fetch quote: HTTP {status}: {message}")]
    QuoteFetch { status: u16, message: String },

    #[error("failed to assemble path: HTTP {status}: {message}")]
    AssembleFetch { status: u16, message: String },

    #[error("quote expired: path {path_id} is no longer recognized by the router")]
    QuoteExpired { path_id: String },

    #[error("no route found")]
    NoRouteFound,

    #[error("allowance error: {0}")]
    Allowance(String),

    #[error("transaction submission rejected: {0}")]
    Submission(String),

    #[error("transaction {hash} was not confirmed before the receipt timeout")]
    ConfirmationTimeout { hash: B256 },

    #[error("transaction {hash} reverted in block {block}")]
    ExecutionReverted { hash: B256, block: u64 },

    #[error("{stage} stage did not finish before its deadline")]
    StageTimeout { stage: Stage },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Failure reported by the [`LedgerClient`](crate::ledger::LedgerClient) seam.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("transaction rejected: {0}")]
    Rejected(String),

    #[error("no receipt observed for {0} before timeout")]
    ReceiptTimeout(B256),

    #[error("RPC endpoint serves chain {actual}, expected chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl LedgerError {
    /// Maps a ledger failure into the pipeline taxonomy. An endpoint serving
    /// the wrong chain is a configuration error whichever stage finds it;
    /// everything else is wrapped by `stage`.
    pub(crate) fn into_swap(self, stage: impl FnOnce(String) -> SwapError) -> SwapError {
        match self {
            mismatch @ Self::ChainMismatch { .. } => SwapError::Config(mismatch.to_string()),
            other => stage(other.to_string()),
        }
    }
}

/// A pipeline run that ended in the `FAILED` state.
///
/// Carries the stage that failed and whatever the pipeline had produced up to
/// that point, so a caller can tell whether an approval or a swap transaction
/// may already be on chain.
#[derive(Debug)]
pub struct SwapFailure {
    pub stage: Stage,
    pub source: SwapError,
    pub quote: Option<Quote>,
    pub transaction: Option<AssembledTransaction>,
    pub hash: Option<B256>,
}

impl SwapFailure {
    /// True once the allowance stage has completed: the router approval
    /// outlives a swap that failed at submission or confirmation.
    pub fn allowance_in_effect(&self) -> bool {
        matches!(self.stage, Stage::Submit | Stage::Confirm)
    }
}

impl std::fmt::Display for SwapFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} stage failed: {}", self.stage, self.source)?;
        if let Some(hash) = &self.hash {
            write!(f, " (transaction {hash})")?;
        }
        if self.allowance_in_effect() {
            write!(f, "; the router allowance granted for this swap remains in effect")?;
        }
        Ok(())
    }
}

impl std::error::Error for SwapFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Error returned by the operation surface in [`crate::tools`].
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Failed to fetch quote: {0}")]
    Quote(#[source] SwapError),

    #[error("Failed in swap process: {0}")]
    Swap(#[source] SwapError),

    #[error("Failed in swap process: {0}")]
    Pipeline(#[source] SwapFailure),
}

impl ToolError {
    /// The library error at the root of this failure.
    pub fn cause(&self) -> &SwapError {
        match self {
            Self::Quote(e) | Self::Swap(e) => e,
            Self::Pipeline(f) => &f.source,
        }
    }
}
