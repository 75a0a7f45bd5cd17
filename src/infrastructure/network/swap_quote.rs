// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::APP_NAME;
use crate::common::error::AppError;
use crate::common::parsing::parse_prefixed_calldata;
use alloy::primitives::{Address, Bytes, U256};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Parameters of a collateral -> debt swap quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub from_token: Address,
    pub to_token: Address,
    pub amount: U256,
    /// Contract that will execute the swap calldata.
    pub from_address: Address,
    /// Maximum slippage in percent, as the provider expects it.
    pub slippage: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapQuote {
    pub calldata: Bytes,
    /// Provider's estimate of the debt-asset output, when it reports one.
    pub to_token_amount: Option<U256>,
}

/// One attempt at an off-chain swap quote.
///
/// Implementations map 5xx responses to `QuoteUnavailable` so callers can
/// retry them; every other failure is permanent.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn swap(&self, request: &SwapRequest) -> Result<SwapQuote, AppError>;
}

#[derive(Debug, Deserialize)]
struct SwapResponse {
    tx: Option<SwapTx>,
    #[serde(rename = "toTokenAmount")]
    to_token_amount: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SwapTx {
    data: Option<String>,
}

/// Extracts `tx.data` from a swap response. Unknown fields are ignored.
pub fn parse_swap_response(body: &[u8]) -> Result<SwapQuote, AppError> {
    let parsed: SwapResponse = serde_json::from_slice(body)
        .map_err(|e| AppError::Parse(format!("swap response is not valid JSON: {e}")))?;
    let tx = parsed
        .tx
        .ok_or_else(|| AppError::Parse("swap response has no tx object".into()))?;
    let data = tx
        .data
        .ok_or_else(|| AppError::Parse("swap response has no tx.data".into()))?;
    let calldata = parse_prefixed_calldata(&data)
        .ok_or_else(|| AppError::Parse(format!("tx.data is not 0x-prefixed hex: {data}")))?;

    Ok(SwapQuote {
        calldata,
        to_token_amount: parsed
            .to_token_amount
            .as_deref()
            .and_then(|raw| U256::from_str(raw).ok()),
    })
}

/// 1inch-compatible `/swap` client.
pub struct SwapQuoteClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl SwapQuoteClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, AppError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| AppError::Config(format!("Invalid quote URL: {}", e)))?;
        let http = reqwest::Client::builder()
            .user_agent(APP_NAME)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client init failed: {}", e)))?;
        Ok(Self { http, endpoint })
    }

    pub fn request_url(&self, request: &SwapRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("fromTokenAddress", &request.from_token.to_checksum(None))
            .append_pair("toTokenAddress", &request.to_token.to_checksum(None))
            .append_pair("amount", &request.amount.to_string())
            .append_pair("fromAddress", &request.from_address.to_checksum(None))
            .append_pair("slippage", &request.slippage)
            .append_pair("disableEstimate", "true");
        url
    }
}

#[async_trait]
impl QuoteSource for SwapQuoteClient {
    async fn swap(&self, request: &SwapRequest) -> Result<SwapQuote, AppError> {
        let url = self.request_url(request);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Quote {
                status: None,
                reason: format!("request failed: {e}"),
            })?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(AppError::QuoteUnavailable {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| AppError::Quote {
            status: Some(status.as_u16()),
            reason: format!("reading body failed: {e}"),
        })?;
        if status != StatusCode::OK {
            let snippet: String = String::from_utf8_lossy(&body).chars().take(256).collect();
            return Err(AppError::Quote {
                status: Some(status.as_u16()),
                reason: snippet,
            });
        }

        parse_swap_response(&body)
    }
}
