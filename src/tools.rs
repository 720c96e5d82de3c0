use std::sync::Arc;

use alloy::primitives::B256;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    chains::ChainRegistry,
    error::{SwapError, ToolError},
    format::{format_chain_list, format_quote, format_receipt},
    ledger::{LedgerClient, LedgerConnector, RpcConnector},
    locks::SignerLocks,
    odos::{OdosApi, QuoteService},
    orchestrator::{SwapOrchestrator, SwapOutcome},
    types::{AssembledTransaction, Quote, SwapConfig, SwapIntent, SwapReceipt},
};

/// Caller input shared by the quote and swap operations.
#[derive(Debug, Clone)]
pub struct SwapArgs {
    /// Chain name; the registry default is used when absent.
    pub chain: Option<String>,
    pub from_token: String,
    pub to_token: String,
    /// Amount in base units.
    pub amount: String,
    pub pretty: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SwapReport<'a> {
    status: &'static str,
    hash: Option<B256>,
    quote: &'a Quote,
    transaction: Option<&'a AssembledTransaction>,
    receipt: Option<&'a SwapReceipt>,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, SwapError> {
    serde_json::to_string_pretty(value).map_err(|e| SwapError::Serialization(e.to_string()))
}

/// The quote, swap and chain-listing operations exposed to a calling agent.
pub struct SwapTools<C = RpcConnector> {
    config: SwapConfig,
    registry: Arc<ChainRegistry>,
    connector: C,
    api: OdosApi,
    locks: SignerLocks,
}

impl SwapTools<RpcConnector> {
    pub fn new(config: SwapConfig, registry: Arc<ChainRegistry>) -> Self {
        Self::with_connector(config, registry, RpcConnector)
    }
}

impl<C: LedgerConnector> SwapTools<C> {
    pub fn with_connector(config: SwapConfig, registry: Arc<ChainRegistry>, connector: C) -> Self {
        let api = OdosApi::new(config.odos_api_url.clone());
        Self {
            config,
            registry,
            connector,
            api,
            locks: SignerLocks::new(),
        }
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Checks the credential, the chain and the intent, in that order, before
    /// any ledger client exists or any request leaves the process.
    fn prepare(&self, args: &SwapArgs) -> Result<(Arc<dyn LedgerClient>, SwapIntent), SwapError> {
        let private_key = self.config.require_private_key()?;
        let chain = self.registry.resolve_or_default(args.chain.as_deref())?;
        let intent = SwapIntent::parse(chain.clone(), &args.from_token, &args.to_token, &args.amount)?;
        let ledger = self.connector.connect(chain, private_key, &self.config)?;
        debug!(
            chain = %chain.name,
            chain_id = chain.id,
            signer = ?ledger.signer_address(),
            "prepared swap intent"
        );
        Ok((ledger, intent))
    }

    pub async fn get_quote(&self, args: &SwapArgs) -> Result<String, ToolError> {
        info!("get quote called");
        self.quote_inner(args).await.map_err(|e| {
            error!(operation = "get_quote", "{e}");
            ToolError::Quote(e)
        })
    }

    async fn quote_inner(&self, args: &SwapArgs) -> Result<String, SwapError> {
        let (ledger, intent) = self.prepare(args)?;
        let service = QuoteService::new(self.api.clone(), ledger);
        let quote = service.get_quote(&intent).await?;
        if args.pretty {
            service.format(&quote).await
        } else {
            to_json(&quote)
        }
    }

    /// Runs the full pipeline while holding the signer's lock. A reverted
    /// swap or a quote without route is reported, not raised.
    pub async fn swap(&self, args: &SwapArgs) -> Result<String, ToolError> {
        info!("swap called");
        let (ledger, intent) = self.prepare(args).map_err(|e| {
            error!(operation = "swap", "{e}");
            ToolError::Swap(e)
        })?;
        let signer = ledger
            .signer_address()
            .ok_or(SwapError::MissingSigner)
            .map_err(ToolError::Swap)?;
        let chain = ledger.chain().clone();

        let _guard = self.locks.acquire(signer).await;
        let orchestrator = SwapOrchestrator::new(self.api.clone(), ledger)
            .with_stage_timeout(self.config.stage_timeout);

        let rendered = match orchestrator.run(&intent).await {
            SwapOutcome::NoRoute { quote } => {
                if args.pretty {
                    Ok(format_quote(&quote, 0, 0))
                } else {
                    to_json(&SwapReport {
                        status: "no_route",
                        hash: None,
                        quote: &quote,
                        transaction: None,
                        receipt: None,
                    })
                }
            }
            SwapOutcome::Confirmed {
                quote,
                transaction,
                receipt,
            }
            | SwapOutcome::Reverted {
                quote,
                transaction,
                receipt,
            } => {
                if args.pretty {
                    Ok(format_receipt(&transaction, &receipt, &chain))
                } else {
                    to_json(&SwapReport {
                        status: if receipt.is_confirmed() {
                            "confirmed"
                        } else {
                            "reverted"
                        },
                        hash: Some(receipt.hash),
                        quote: &quote,
                        transaction: Some(&transaction),
                        receipt: Some(&receipt),
                    })
                }
            }
            SwapOutcome::Failed(failure) => {
                error!(operation = "swap", "{failure}");
                return Err(ToolError::Pipeline(failure));
            }
        };
        rendered.map_err(ToolError::Swap)
    }

    pub fn list_chains(&self) -> String {
        format_chain_list(&self.registry)
    }
}
