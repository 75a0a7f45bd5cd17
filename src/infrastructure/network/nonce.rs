// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::network::provider::HttpProvider;
use alloy::primitives::Address;
use alloy::providers::Provider;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Hands out sequential nonces for the guardian wallet.
///
/// Several accounts can trigger at once; reservations are serialized so two
/// repayments never share a nonce. The cache is seeded from the pending
/// transaction count and dropped after a failed submission.
#[derive(Clone)]
pub struct NonceManager {
    provider: HttpProvider,
    address: Address,
    next: Arc<Mutex<Option<u64>>>,
}

impl NonceManager {
    pub fn new(provider: HttpProvider, address: Address) -> Self {
        Self {
            provider,
            address,
            next: Arc::new(Mutex::new(None)),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Reserves the next nonce, fetching the pending count on first use.
    pub async fn reserve(&self) -> Result<u64, AppError> {
        let mut guard = self.next.lock().await;
        let nonce = match *guard {
            Some(cached) => cached,
            None => self.fetch_pending().await?,
        };
        *guard = Some(nonce.saturating_add(1));
        Ok(nonce)
    }

    /// Forgets the cached value; the next reservation re-reads the chain.
    pub async fn resync(&self) {
        *self.next.lock().await = None;
        tracing::debug!(target: "chain", address = %self.address, "Nonce cache cleared");
    }

    async fn fetch_pending(&self) -> Result<u64, AppError> {
        let provider = self.provider.clone();
        let address = self.address;
        let on_chain_nonce: u64 = retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_transaction_count(address).pending().await }
            },
            3,
            Duration::from_millis(100),
        )
        .await
        .map_err(|e| AppError::Connection(format!("Failed to fetch nonce: {}", e)))?;

        tracing::debug!(target: "chain", nonce = on_chain_nonce, "Nonce synced from pending state");
        Ok(on_chain_nonce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::provider::ConnectionFactory;

    #[tokio::test]
    async fn unreachable_node_surfaces_connection_error() {
        let provider = ConnectionFactory::http("http://127.0.0.1:1").unwrap();
        let nonces = NonceManager::new(provider, Address::ZERO);
        match nonces.reserve().await {
            Err(AppError::Connection(msg)) => assert!(msg.contains("nonce")),
            other => panic!("Unexpected result: {other:?}"),
        }
    }
}
