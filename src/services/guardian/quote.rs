// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::domain::position::Loan;
use crate::network::chain::ChainClient;
use crate::network::swap_quote::{QuoteSource, SwapRequest};
use alloy::primitives::{Address, Bytes, U256};
use std::sync::Arc;
use std::time::Duration;

/// Swap calldata plus the collateral amount it was quoted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredQuote {
    pub calldata: Bytes,
    pub collateral_amount: U256,
    pub expected_debt_amount: Option<U256>,
}

pub struct QuoteAcquisition {
    chain: Arc<dyn ChainClient>,
    source: Arc<dyn QuoteSource>,
    repayment_contract: Address,
    slippage: String,
    backoff: Duration,
}

impl QuoteAcquisition {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        source: Arc<dyn QuoteSource>,
        repayment_contract: Address,
        slippage: String,
        backoff: Duration,
    ) -> Self {
        Self {
            chain,
            source,
            repayment_contract,
            slippage,
            backoff,
        }
    }

    /// Quotes the borrower's whole collateral balance into the debt asset.
    ///
    /// The balance is re-read before every attempt. Provider 5xx responses
    /// are retried after `backoff` until the provider recovers; anything else
    /// is returned.
    pub async fn acquire(&self, loan: &Loan) -> Result<AcquiredQuote, AppError> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            let collateral_amount = self.chain.balance_of(loan.a_token, loan.user).await?;
            let request = SwapRequest {
                from_token: loan.collateral,
                to_token: loan.debt,
                amount: collateral_amount,
                from_address: self.repayment_contract,
                slippage: self.slippage.clone(),
            };

            match self.source.swap(&request).await {
                Ok(quote) => {
                    tracing::info!(
                        target: "quote",
                        account = %loan.user,
                        amount = %collateral_amount,
                        attempt,
                        calldata_len = quote.calldata.len(),
                        expected_out = ?quote.to_token_amount,
                        "Swap quote acquired"
                    );
                    return Ok(AcquiredQuote {
                        calldata: quote.calldata,
                        collateral_amount,
                        expected_debt_amount: quote.to_token_amount,
                    });
                }
                Err(AppError::QuoteUnavailable { status }) => {
                    tracing::warn!(
                        target: "quote",
                        account = %loan.user,
                        status,
                        attempt,
                        "Quote provider unavailable, retrying"
                    );
                    tokio::time::sleep(self.backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
