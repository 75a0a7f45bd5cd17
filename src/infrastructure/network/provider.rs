// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::{Provider, RootProvider};
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = RootProvider::new_http(url);
        Ok(provider)
    }

    /// Uses `configured` when present, otherwise asks the node.
    pub async fn resolve_chain_id(
        provider: &HttpProvider,
        configured: Option<u64>,
    ) -> Result<u64, AppError> {
        if let Some(id) = configured {
            return Ok(id);
        }
        let detected = provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("chain_id detect failed: {e}")))?;
        tracing::info!(target: "config", detected_chain = detected, "Auto-detected chain_id from RPC");
        Ok(detected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        match ConnectionFactory::http("not a url") {
            Err(AppError::Config(msg)) => assert!(msg.contains("Invalid RPC URL")),
            Err(other) => panic!("Unexpected error variant: {other:?}"),
            Ok(_) => panic!("malformed url accepted"),
        }
        assert!(ConnectionFactory::http("http://localhost:8545").is_ok());
    }

    #[tokio::test]
    async fn configured_chain_id_skips_detection() {
        let provider = ConnectionFactory::http("http://127.0.0.1:1").unwrap();
        let id = ConnectionFactory::resolve_chain_id(&provider, Some(1337))
            .await
            .unwrap();
        assert_eq!(id, 1337);
    }
}
