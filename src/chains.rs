use std::collections::HashMap;

use serde::Serialize;

use crate::error::SwapError;

pub const DEFAULT_CHAIN: &str = "Fraxtal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub id: u64,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub default_endpoint: String,
}

impl ChainDescriptor {
    pub fn new(id: u64, name: &str, symbol: &str, decimals: u8, default_endpoint: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            native_currency: NativeCurrency {
                symbol: symbol.to_string(),
                decimals,
            },
            default_endpoint: default_endpoint.to_string(),
        }
    }
}

/// Immutable table of the networks the router may be used on.
///
/// Built once at startup and shared; every entry point resolves its chain
/// here, so no unvalidated chain name or id reaches the pipeline.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<u64, usize>,
    default_index: usize,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainDescriptor>, default_chain: &str) -> Result<Self, SwapError> {
        let mut by_name = HashMap::with_capacity(chains.len());
        let mut by_id = HashMap::with_capacity(chains.len());

        for (index, chain) in chains.iter().enumerate() {
            if by_name.insert(normalize(&chain.name), index).is_some() {
                return Err(SwapError::Config(format!(
                    "duplicate chain name in registry: {}",
                    chain.name
                )));
            }
            if by_id.insert(chain.id, index).is_some() {
                return Err(SwapError::Config(format!(
                    "duplicate chain id in registry: {}",
                    chain.id
                )));
            }
        }

        let default_index = *by_name.get(&normalize(default_chain)).ok_or_else(|| {
            SwapError::Config(format!("default chain {default_chain} is not in the registry"))
        })?;

        Ok(Self {
            chains,
            by_name,
            by_id,
            default_index,
        })
    }

    /// Networks supported by the Odos router.
    ///
    /// Goes through [`ChainRegistry::new`], so the table gets the same
    /// uniqueness and default-chain checks as any substitute registry.
    pub fn builtin() -> Result<Self, SwapError> {
        let chains = vec![
            ChainDescriptor::new(1, "Ethereum", "ETH", 18, "https://eth.merkle.io"),
            ChainDescriptor::new(10, "Optimism", "ETH", 18, "https://mainnet.optimism.io"),
            ChainDescriptor::new(56, "BNB Chain", "BNB", 18, "https://bsc-dataseed1.bnbchain.org"),
            ChainDescriptor::new(137, "Polygon", "POL", 18, "https://polygon-rpc.com"),
            ChainDescriptor::new(146, "Sonic", "S", 18, "https://rpc.soniclabs.com"),
            ChainDescriptor::new(250, "Fantom", "FTM", 18, "https://rpc.ftm.tools"),
            ChainDescriptor::new(252, "Fraxtal", "frxETH", 18, "https://rpc.frax.com"),
            ChainDescriptor::new(324, "zkSync Era", "ETH", 18, "https://mainnet.era.zksync.io"),
            ChainDescriptor::new(5000, "Mantle", "MNT", 18, "https://rpc.mantle.xyz"),
            ChainDescriptor::new(8453, "Base", "ETH", 18, "https://mainnet.base.org"),
            ChainDescriptor::new(34443, "Mode", "ETH", 18, "https://mainnet.mode.network"),
            ChainDescriptor::new(42161, "Arbitrum", "ETH", 18, "https://arb1.arbitrum.io/rpc"),
            ChainDescriptor::new(
                43114,
                "Avalanche",
                "AVAX",
                18,
                "https://api.avax.network/ext/bc/C/rpc",
            ),
            ChainDescriptor::new(59144, "Linea", "ETH", 18, "https://rpc.linea.build"),
            ChainDescriptor::new(534352, "Scroll", "ETH", 18, "https://rpc.scroll.io"),
        ];

        Self::new(chains, DEFAULT_CHAIN)
    }

    /// Case-insensitive exact lookup by name.
    pub fn resolve(&self, name: &str) -> Result<&ChainDescriptor, SwapError> {
        self.by_name
            .get(&normalize(name))
            .map(|&i| &self.chains[i])
            .ok_or_else(|| SwapError::UnsupportedChain(name.trim().to_string()))
    }

    /// Resolves `name`, falling back to the default chain when none is given.
    pub fn resolve_or_default(&self, name: Option<&str>) -> Result<&ChainDescriptor, SwapError> {
        match name {
            Some(name) if !name.trim().is_empty() => self.resolve(name),
            _ => Ok(self.default_chain()),
        }
    }

    pub fn chain_id(&self, name: &str) -> Result<u64, SwapError> {
        self.resolve(name).map(|c| c.id)
    }

    pub fn by_id(&self, id: u64) -> Option<&ChainDescriptor> {
        self.by_id.get(&id).map(|&i| &self.chains[i])
    }

    pub fn default_chain(&self) -> &ChainDescriptor {
        &self.chains[self.default_index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
