pub mod allowance;
pub mod chains;
pub mod error;
pub mod executor;
pub mod format;
pub mod ledger;
pub mod locks;
pub mod odos;
pub mod orchestrator;
pub mod secret;
pub mod tools;
pub mod types;

pub use allowance::AllowanceManager;
pub use chains::{ChainDescriptor, ChainRegistry, NativeCurrency};
pub use error::{LedgerError, SwapError, SwapFailure, ToolError};
pub use executor::TransactionExecutor;
pub use ledger::{LedgerClient, LedgerConnector, RpcConnector, RpcLedger};
pub use locks::SignerLocks;
pub use odos::{AssembleService, OdosApi, QuoteService};
pub use orchestrator::{SwapOrchestrator, SwapOutcome};
pub use secret::SecretString;
pub use tools::{SwapArgs, SwapTools};
pub use types::{
    AssembledTransaction, Quote, ReceiptStatus, Stage, SwapConfig, SwapIntent, SwapReceipt,
    SwapState, NATIVE_TOKEN,
};
