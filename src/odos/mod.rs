pub mod assemble;
pub mod quote;
pub mod types;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::SwapError;

pub use assemble::AssembleService;
pub use quote::QuoteService;

pub const DEFAULT_ODOS_API_URL: &str = "https://api.odos.xyz";

/// HTTP access to the Odos smart order router. Cheap to clone; the quote and
/// assemble services share one connection pool.
#[derive(Debug, Clone)]
pub struct OdosApi {
    pub client: reqwest::Client,
    pub base_url: String,
}

/// Body of a non-success response, kept for the caller's diagnosis.
#[derive(Debug)]
pub struct HttpFailure {
    pub status: reqwest::StatusCode,
    pub body: String,
}

impl HttpFailure {
    pub fn message(&self) -> String {
        let reason = self.status.canonical_reason().unwrap_or("Unknown Status");
        if self.body.is_empty() {
            reason.to_string()
        } else {
            format!("{reason} - {}", self.body)
        }
    }
}

impl OdosApi {
    pub fn new(base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_ODOS_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// POSTs `body` as JSON to `path`. The outer error covers transport and
    /// decoding; the inner one a non-success status.
    pub(crate) async fn post<B, R>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Result<R, HttpFailure>, SwapError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        debug!("odos request: {url}");
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Ok(Err(HttpFailure { status, body }));
        }

        let parsed = response
            .json::<R>()
            .await
            .map_err(|e| SwapError::Serialization(e.to_string()))?;
        Ok(Ok(parsed))
    }
}
