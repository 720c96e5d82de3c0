use std::{str::FromStr, sync::Arc};

use alloy::primitives::{Address, Bytes, U256};
use reqwest::StatusCode;
use tracing::debug;

use crate::{error::SwapError, ledger::LedgerClient, types::AssembledTransaction};

use super::{
    types::{OdosAssembleRequest, OdosAssembleResponse, OdosQuantity, OdosTransaction},
    HttpFailure, OdosApi,
};

/// Redeems a quote's `pathId` for an executable transaction.
pub struct AssembleService {
    api: OdosApi,
    ledger: Arc<dyn LedgerClient>,
}

impl AssembleService {
    pub fn new(api: OdosApi, ledger: Arc<dyn LedgerClient>) -> Self {
        Self { api, ledger }
    }

    pub async fn assemble(&self, path_id: &str) -> Result<AssembledTransaction, SwapError> {
        let user = self
            .ledger
            .signer_address()
            .ok_or(SwapError::MissingSigner)?;

        let request = OdosAssembleRequest {
            user_addr: user.to_string(),
            path_id: path_id.to_string(),
        };

        debug!(path_id, "odos assemble");
        let response = self
            .api
            .post::<_, OdosAssembleResponse>("/sor/assemble", &request)
            .await?
            .map_err(|failure| assemble_failure(path_id, &failure))?;

        let transaction = response.transaction.ok_or_else(|| SwapError::AssembleFetch {
            status: StatusCode::OK.as_u16(),
            message: format!("no transaction in assemble response for path {path_id}"),
        })?;

        convert_transaction(&transaction)
    }
}

/// The router answers an unknown or expired `pathId` with a client error
/// naming the path; anything else is a plain fetch failure.
fn assemble_failure(path_id: &str, failure: &HttpFailure) -> SwapError {
    let body = failure.body.to_lowercase();
    let names_path = body.contains("path");
    let expired = body.contains("expired")
        || body.contains("not found")
        || body.contains("invalid")
        || failure.status == StatusCode::NOT_FOUND;
    if failure.status.is_client_error() && names_path && expired {
        return SwapError::QuoteExpired {
            path_id: path_id.to_string(),
        };
    }
    SwapError::AssembleFetch {
        status: failure.status.as_u16(),
        message: failure.message(),
    }
}

fn quantity<T: FromStr>(field: &str, value: &OdosQuantity) -> Result<T, SwapError>
where
    T::Err: std::fmt::Display,
{
    let text = value.as_decimal_str();
    text.parse::<T>()
        .map_err(|e| SwapError::Serialization(format!("invalid {field} {text}: {e}")))
}

fn address(field: &str, value: &str) -> Result<Address, SwapError> {
    Address::from_str(value)
        .map_err(|e| SwapError::Serialization(format!("invalid {field} address {value}: {e}")))
}

pub(crate) fn convert_transaction(txn: &OdosTransaction) -> Result<AssembledTransaction, SwapError> {
    let value = match &txn.value {
        Some(v) => U256::from_str_radix(&v.as_decimal_str(), 10)
            .map_err(|e| SwapError::Serialization(format!("invalid value: {e}")))?,
        None => U256::ZERO,
    };
    let data = Bytes::from_str(&txn.data)
        .map_err(|e| SwapError::Serialization(format!("invalid calldata: {e}")))?;

    Ok(AssembledTransaction {
        chain_id: txn.chain_id,
        to: address("to", &txn.to)?,
        from: address("from", &txn.from)?,
        data,
        value,
        gas: quantity("gas", &txn.gas)?,
        gas_price: quantity("gasPrice", &txn.gas_price)?,
        nonce: txn.nonce,
    })
}
