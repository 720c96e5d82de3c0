use alloy::primitives::{utils, U256};

use crate::{
    chains::{ChainDescriptor, ChainRegistry},
    types::{AssembledTransaction, Quote, SwapReceipt},
};

/// Renders `value` base units as a decimal string with trailing zeros removed.
pub fn format_units(value: U256, decimals: u8) -> String {
    match utils::format_units(value, decimals) {
        Ok(s) if s.contains('.') => s.trim_end_matches('0').trim_end_matches('.').to_string(),
        Ok(s) => s,
        Err(_) => value.to_string(),
    }
}

fn leg_amount(amount: &str, decimals: u8) -> String {
    match U256::from_str_radix(amount, 10) {
        Ok(v) => format_units(v, decimals),
        Err(_) => amount.to_string(),
    }
}

pub fn format_quote(quote: &Quote, in_decimals: u8, out_decimals: u8) -> String {
    if !quote.has_route() {
        return format!(
            "💱 Quote Details\n- Route: no viable route found\n- Block: {}",
            quote.block_number
        );
    }

    let mut lines = vec!["💱 Quote Details".to_string()];
    if let (Some(token), Some(amount)) = (quote.in_tokens.first(), quote.in_amounts.first()) {
        lines.push(format!("- Input: {} {token}", leg_amount(amount, in_decimals)));
    }
    if let (Some(token), Some(amount)) = (quote.out_tokens.first(), quote.out_amounts.first()) {
        lines.push(format!("- Output: {} {token}", leg_amount(amount, out_decimals)));
    }
    let impact = quote
        .price_impact_percent
        .map_or_else(|| "N/A".to_string(), |p| format!("{p:.2}%"));
    lines.push(format!("- Price Impact: {impact}"));
    lines.push(format!(
        "- Gas Estimate: {:.0} ({:.2} USD)",
        quote.gas_estimate, quote.gas_estimate_value_usd
    ));
    lines.push(format!("- Net Output Value: ${:.2}", quote.net_out_value_usd));
    lines.join("\n")
}

/// Gas cost is scaled by the chain's native decimals, not a fixed 18.
pub fn format_receipt(
    txn: &AssembledTransaction,
    receipt: &SwapReceipt,
    chain: &ChainDescriptor,
) -> String {
    let status = if receipt.is_confirmed() {
        "✅ Confirmed"
    } else {
        "❌ Failed"
    };
    let gas_cost = format_units(receipt.gas_cost(), chain.native_currency.decimals);

    [
        "💫 Swap Transaction".to_string(),
        format!("- Status: {status}"),
        format!("- Transaction Hash: {}", receipt.hash),
        format!("- Block: {}", receipt.block_number),
        format!("- From: {}", txn.from),
        format!("- To: {}", txn.to),
        format!("- Gas Cost: {gas_cost} {}", chain.native_currency.symbol),
        format!("- Chain: {}", chain.name),
    ]
    .join("\n")
}

pub fn format_chain_list(registry: &ChainRegistry) -> String {
    let chains = registry
        .iter()
        .map(|c| format!("{}: {}", c.name, c.id))
        .collect::<Vec<_>>()
        .join("\n");
    format!("The available chains and their IDs are:\n{chains}")
}
