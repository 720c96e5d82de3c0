use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosQuoteRequest {
    pub chain_id: u64,
    pub user_addr: String,
    pub input_tokens: Vec<OdosInputToken>,
    pub output_tokens: Vec<OdosOutputToken>,
    pub slippage_limit_percent: f64,
    pub referral_code: u32,
    #[serde(rename = "disableRFQs")]
    pub disable_rfqs: bool,
    pub compact: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosInputToken {
    pub token_address: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosOutputToken {
    pub token_address: String,
    pub proportion: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosQuoteResponse {
    #[serde(default)]
    pub in_tokens: Vec<String>,
    #[serde(default)]
    pub out_tokens: Vec<String>,
    #[serde(default)]
    pub in_amounts: Vec<String>,
    #[serde(default)]
    pub out_amounts: Vec<String>,
    #[serde(default)]
    pub gas_estimate: f64,
    #[serde(default)]
    pub gwei_per_gas: f64,
    #[serde(default)]
    pub gas_estimate_value: f64,
    #[serde(default)]
    pub in_values: Vec<f64>,
    #[serde(default)]
    pub out_values: Vec<f64>,
    #[serde(default)]
    pub net_out_value: f64,
    #[serde(default)]
    pub price_impact: Option<f64>,
    #[serde(default)]
    pub percent_diff: f64,
    #[serde(default)]
    pub path_id: Option<String>,
    #[serde(default)]
    pub block_number: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosAssembleRequest {
    pub user_addr: String,
    pub path_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OdosAssembleResponse {
    #[serde(default)]
    pub transaction: Option<OdosTransaction>,
}

/// Quantities arrive as JSON numbers or decimal strings depending on the field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OdosQuantity {
    Number(serde_json::Number),
    Text(String),
}

impl OdosQuantity {
    pub fn as_decimal_str(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OdosTransaction {
    pub chain_id: u64,
    pub gas: OdosQuantity,
    pub gas_price: OdosQuantity,
    #[serde(default)]
    pub value: Option<OdosQuantity>,
    pub to: String,
    pub from: String,
    pub data: String,
    #[serde(default)]
    pub nonce: u64,
}
