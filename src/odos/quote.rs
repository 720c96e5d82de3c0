use std::{str::FromStr, sync::Arc};

use alloy::primitives::Address;
use tracing::debug;

use crate::{
    error::SwapError,
    format::format_quote,
    ledger::LedgerClient,
    types::{Quote, SwapIntent},
};

use super::{
    types::{OdosInputToken, OdosOutputToken, OdosQuoteRequest, OdosQuoteResponse},
    OdosApi,
};

pub const SLIPPAGE_LIMIT_PERCENT: f64 = 0.3;
pub const REFERRAL_CODE: u32 = 0;

/// Turns a [`SwapIntent`] into a routed [`Quote`].
pub struct QuoteService {
    api: OdosApi,
    ledger: Arc<dyn LedgerClient>,
}

impl QuoteService {
    pub fn new(api: OdosApi, ledger: Arc<dyn LedgerClient>) -> Self {
        Self { api, ledger }
    }

    /// Requests a quote for the signer. A response without `pathId` is
    /// returned as a route-less `Quote`, not as an error.
    pub async fn get_quote(&self, intent: &SwapIntent) -> Result<Quote, SwapError> {
        let user = self
            .ledger
            .signer_address()
            .ok_or(SwapError::MissingSigner)?;
        let ledger_chain = self.ledger.chain().id;
        if intent.chain().id != ledger_chain {
            return Err(SwapError::Validation(format!(
                "intent targets chain {} but the signer is configured for chain {ledger_chain}",
                intent.chain().id
            )));
        }

        let request = OdosQuoteRequest {
            chain_id: intent.chain().id,
            user_addr: user.to_string(),
            input_tokens: vec![OdosInputToken {
                token_address: intent.from_token().to_string(),
                amount: intent.amount().to_string(),
            }],
            output_tokens: vec![OdosOutputToken {
                token_address: intent.to_token().to_string(),
                proportion: 1.0,
            }],
            slippage_limit_percent: SLIPPAGE_LIMIT_PERCENT,
            referral_code: REFERRAL_CODE,
            disable_rfqs: true,
            compact: true,
        };

        debug!(chain_id = request.chain_id, "odos quote");
        let response = self
            .api
            .post::<_, OdosQuoteResponse>("/sor/quote/v2", &request)
            .await?
            .map_err(|failure| SwapError::QuoteFetch {
                status: failure.status.as_u16(),
                message: failure.message(),
            })?;

        convert_quote(response)
    }

    /// Human-readable summary, with each leg scaled by its token's own decimals.
    pub async fn format(&self, quote: &Quote) -> Result<String, SwapError> {
        if !quote.has_route() {
            return Ok(format_quote(quote, 0, 0));
        }
        let (in_token, _) = quote.input_leg()?;
        let (out_token, _) = quote.output_leg()?;
        let in_decimals = self
            .ledger
            .token_decimals(in_token)
            .await
            .map_err(|e| e.into_swap(SwapError::Ledger))?;
        let out_decimals = self
            .ledger
            .token_decimals(out_token)
            .await
            .map_err(|e| e.into_swap(SwapError::Ledger))?;
        Ok(format_quote(quote, in_decimals, out_decimals))
    }
}

fn parse_tokens(tokens: &[String]) -> Result<Vec<Address>, SwapError> {
    tokens
        .iter()
        .map(|t| {
            Address::from_str(t)
                .map_err(|e| SwapError::Serialization(format!("invalid token address {t}: {e}")))
        })
        .collect()
}

fn check_amounts(amounts: &[String]) -> Result<(), SwapError> {
    match amounts
        .iter()
        .find(|a| a.is_empty() || !a.chars().all(|c| c.is_ascii_digit()))
    {
        Some(bad) => Err(SwapError::Serialization(format!(
            "amount {bad} is not a base-unit integer"
        ))),
        None => Ok(()),
    }
}

pub(crate) fn convert_quote(response: OdosQuoteResponse) -> Result<Quote, SwapError> {
    if response.in_tokens.len() != response.in_amounts.len()
        || response.out_tokens.len() != response.out_amounts.len()
    {
        return Err(SwapError::Serialization(format!(
            "quote token and amount arrays disagree: {} in tokens / {} in amounts, {} out tokens / {} out amounts",
            response.in_tokens.len(),
            response.in_amounts.len(),
            response.out_tokens.len(),
            response.out_amounts.len(),
        )));
    }
    if response.path_id.is_some()
        && (response.in_amounts.len() != 1 || response.out_amounts.len() != 1)
    {
        return Err(SwapError::Serialization(format!(
            "routed quote must have exactly one input and one output leg, got {} and {}",
            response.in_amounts.len(),
            response.out_amounts.len(),
        )));
    }
    check_amounts(&response.in_amounts)?;
    check_amounts(&response.out_amounts)?;

    Ok(Quote {
        path_id: response.path_id.filter(|p| !p.is_empty()),
        in_tokens: parse_tokens(&response.in_tokens)?,
        out_tokens: parse_tokens(&response.out_tokens)?,
        in_amounts: response.in_amounts,
        out_amounts: response.out_amounts,
        in_values_usd: response.in_values,
        out_values_usd: response.out_values,
        gas_estimate: response.gas_estimate,
        gwei_per_gas: response.gwei_per_gas,
        gas_estimate_value_usd: response.gas_estimate_value,
        net_out_value_usd: response.net_out_value,
        price_impact_percent: response.price_impact,
        percent_diff: response.percent_diff,
        block_number: response.block_number,
    })
}
