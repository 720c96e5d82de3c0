use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Serialize;

use crate::{chains::ChainDescriptor, error::SwapError, secret::SecretString};

/// Address the router uses for the chain's native currency.
pub const NATIVE_TOKEN: Address = Address::ZERO;

pub const WALLET_PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";
pub const ODOS_API_URL_ENV: &str = "ODOS_API_URL";
pub const RPC_URL_ENV: &str = "RPC_URL";
pub const RECEIPT_TIMEOUT_ENV: &str = "ODOS_RECEIPT_TIMEOUT_SECS";
pub const STAGE_TIMEOUT_ENV: &str = "ODOS_STAGE_TIMEOUT_SECS";

const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Pipeline stage a failure originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Quote,
    Assemble,
    Allowance,
    Submit,
    Confirm,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quote => write!(f, "quote"),
            Self::Assemble => write!(f, "assemble"),
            Self::Allowance => write!(f, "allowance"),
            Self::Submit => write!(f, "submit"),
            Self::Confirm => write!(f, "confirm"),
        }
    }
}

/// States of a single swap pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapState {
    Requested,
    Quoted,
    NoRoute,
    Assembled,
    Authorized,
    Submitted,
    Confirmed,
    Reverted,
    Failed,
}

impl SwapState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::NoRoute | Self::Confirmed | Self::Reverted | Self::Failed
        )
    }
}

impl std::fmt::Display for SwapState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Requested => "REQUESTED",
            Self::Quoted => "QUOTED",
            Self::NoRoute => "NO_ROUTE",
            Self::Assembled => "ASSEMBLED",
            Self::Authorized => "AUTHORIZED",
            Self::Submitted => "SUBMITTED",
            Self::Confirmed => "CONFIRMED",
            Self::Reverted => "REVERTED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// A validated request to swap `amount` base units of `from_token` into `to_token`.
#[derive(Debug, Clone)]
pub struct SwapIntent {
    chain: ChainDescriptor,
    from_token: Address,
    to_token: Address,
    amount: U256,
}

impl SwapIntent {
    pub fn new(
        chain: ChainDescriptor,
        from_token: Address,
        to_token: Address,
        amount: U256,
    ) -> Result<Self, SwapError> {
        if from_token == to_token {
            return Err(SwapError::Validation(format!(
                "fromToken and toToken must differ (both {from_token})"
            )));
        }
        if amount.is_zero() {
            return Err(SwapError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            chain,
            from_token,
            to_token,
            amount,
        })
    }

    /// Builds an intent from caller-supplied strings: `0x`-prefixed 20-byte hex
    /// addresses and a base-unit amount made only of decimal digits.
    pub fn parse(
        chain: ChainDescriptor,
        from_token: &str,
        to_token: &str,
        amount: &str,
    ) -> Result<Self, SwapError> {
        let from_token = parse_address("fromToken", from_token)?;
        let to_token = parse_address("toToken", to_token)?;
        let amount = parse_amount(amount)?;
        Self::new(chain, from_token, to_token, amount)
    }

    pub fn chain(&self) -> &ChainDescriptor {
        &self.chain
    }

    pub fn from_token(&self) -> Address {
        self.from_token
    }

    pub fn to_token(&self) -> Address {
        self.to_token
    }

    pub fn amount(&self) -> U256 {
        self.amount
    }
}

pub(crate) fn parse_address(field: &str, value: &str) -> Result<Address, SwapError> {
    let value = value.trim();
    let well_formed = value.len() == 42
        && value.starts_with("0x")
        && value[2..].chars().all(|c| c.is_ascii_hexdigit());
    if !well_formed {
        return Err(SwapError::Validation(format!("Invalid {field} address: {value}")));
    }
    Address::from_str(value)
        .map_err(|e| SwapError::Validation(format!("Invalid {field} address: {e}")))
}

pub(crate) fn parse_amount(value: &str) -> Result<U256, SwapError> {
    let value = value.trim();
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(SwapError::Validation(
            "Amount must be a string in wei (no decimals)".to_string(),
        ));
    }
    U256::from_str_radix(value, 10)
        .map_err(|e| SwapError::Validation(format!("amount out of range: {e}")))
}

/// Routed quote returned by the routing service.
///
/// `path_id` is `None` when the service found no viable route; that is a
/// normal result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub path_id: Option<String>,
    pub in_tokens: Vec<Address>,
    pub out_tokens: Vec<Address>,
    pub in_amounts: Vec<String>,
    pub out_amounts: Vec<String>,
    pub in_values_usd: Vec<f64>,
    pub out_values_usd: Vec<f64>,
    pub gas_estimate: f64,
    pub gwei_per_gas: f64,
    pub gas_estimate_value_usd: f64,
    pub net_out_value_usd: f64,
    pub price_impact_percent: Option<f64>,
    pub percent_diff: f64,
    pub block_number: u64,
}

impl Quote {
    pub fn has_route(&self) -> bool {
        self.path_id.is_some()
    }

    /// Input token and base-unit amount of the single-input quote.
    pub fn input_leg(&self) -> Result<(Address, U256), SwapError> {
        leg(&self.in_tokens, &self.in_amounts, "input")
    }

    /// Output token and base-unit amount of the single-output quote.
    pub fn output_leg(&self) -> Result<(Address, U256), SwapError> {
        leg(&self.out_tokens, &self.out_amounts, "output")
    }
}

fn leg(tokens: &[Address], amounts: &[String], side: &str) -> Result<(Address, U256), SwapError> {
    let (Some(token), Some(amount)) = (tokens.first(), amounts.first()) else {
        return Err(SwapError::Serialization(format!("quote has no {side} leg")));
    };
    let amount = U256::from_str_radix(amount, 10)
        .map_err(|e| SwapError::Serialization(format!("invalid {side} amount {amount}: {e}")))?;
    Ok((*token, amount))
}

/// Executable transaction produced by the assembly endpoint for one path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledTransaction {
    pub chain_id: u64,
    pub to: Address,
    pub from: Address,
    pub data: Bytes,
    pub value: U256,
    pub gas: u64,
    pub gas_price: u128,
    pub nonce: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapReceipt {
    pub hash: B256,
    pub status: ReceiptStatus,
    pub block_number: u64,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub from: Address,
    pub to: Option<Address>,
}

impl SwapReceipt {
    pub fn is_confirmed(&self) -> bool {
        self.status == ReceiptStatus::Confirmed
    }

    /// Realized fee in the native currency's base unit.
    pub fn gas_cost(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_gas_price)
    }
}

#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub odos_api_url: Option<String>,
    /// Overrides the resolved chain's default endpoint.
    pub rpc_url: Option<String>,
    pub wallet_private_key: Option<SecretString>,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
    /// Deadline for each pre-submission network stage.
    pub stage_timeout: Option<Duration>,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            odos_api_url: None,
            rpc_url: None,
            wallet_private_key: None,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            stage_timeout: None,
        }
    }
}

impl SwapConfig {
    pub fn from_env() -> Result<Self, SwapError> {
        let defaults = Self::default();
        Ok(Self {
            odos_api_url: non_empty_env(ODOS_API_URL_ENV),
            rpc_url: non_empty_env(RPC_URL_ENV),
            wallet_private_key: non_empty_env(WALLET_PRIVATE_KEY_ENV).map(SecretString::new),
            receipt_timeout: seconds_env(RECEIPT_TIMEOUT_ENV)?
                .unwrap_or(defaults.receipt_timeout),
            receipt_poll_interval: defaults.receipt_poll_interval,
            stage_timeout: seconds_env(STAGE_TIMEOUT_ENV)?,
        })
    }

    /// The signing credential, or the `Config` error both operations fail with.
    pub fn require_private_key(&self) -> Result<&SecretString, SwapError> {
        self.wallet_private_key.as_ref().ok_or_else(|| {
            SwapError::Config(format!(
                "{WALLET_PRIVATE_KEY_ENV} is not set in the environment. This is required to execute trades."
            ))
        })
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn seconds_env(name: &str) -> Result<Option<Duration>, SwapError> {
    non_empty_env(name)
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| SwapError::Config(format!("{name} must be a whole number of seconds: {e}")))
        })
        .transpose()
}
