// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::data::executor::{ILiquidationGuardian, RepaymentParams};
use crate::domain::position::Loan;
use crate::guardian::quote::{AcquiredQuote, QuoteAcquisition};
use crate::network::chain::ChainClient;
use alloy::primitives::{Address, B256, Bytes};
use alloy_sol_types::{SolCall, SolValue};
use std::sync::Arc;

/// `execute(user, signature, params, swapCalldata)` calldata for the repayment contract.
pub fn build_execute_calldata(loan: &Loan, signature: &Bytes, quote: &AcquiredQuote) -> Bytes {
    let params = RepaymentParams {
        collateral: loan.collateral,
        collateralAToken: loan.a_token,
        debt: loan.debt,
        stableDebtToken: loan.stable_debt_token,
        variableDebtToken: loan.variable_debt_token,
        collateralAmount: quote.collateral_amount,
    };
    let call = ILiquidationGuardian::executeCall {
        user: loan.user,
        signature: signature.clone(),
        params: Bytes::from(params.abi_encode_params()),
        swapCalldata: quote.calldata.clone(),
    };
    Bytes::from(call.abi_encode())
}

/// A repayment that did not land, tagged with the phase it failed in.
#[derive(Debug)]
pub struct ExecutionFailure {
    pub stage: String,
    pub error: AppError,
}

impl ExecutionFailure {
    fn quote(error: AppError) -> Self {
        Self {
            stage: "quote".to_string(),
            error,
        }
    }

    fn submit(error: AppError) -> Self {
        let stage = match &error {
            AppError::Execution { stage, .. } => stage.clone(),
            _ => "submit".to_string(),
        };
        Self { stage, error }
    }
}

/// Quotes the swap and submits the authorized repayment, signed by the guardian key.
pub struct RepaymentExecutor {
    chain: Arc<dyn ChainClient>,
    quotes: QuoteAcquisition,
    repayment_contract: Address,
}

impl RepaymentExecutor {
    pub fn new(chain: Arc<dyn ChainClient>, quotes: QuoteAcquisition, repayment_contract: Address) -> Self {
        Self {
            chain,
            quotes,
            repayment_contract,
        }
    }

    pub async fn execute(&self, loan: &Loan, signature: &Bytes) -> Result<B256, ExecutionFailure> {
        let quote = self
            .quotes
            .acquire(loan)
            .await
            .map_err(ExecutionFailure::quote)?;
        let calldata = build_execute_calldata(loan, signature, &quote);
        tracing::info!(
            target: "executor",
            account = %loan.user,
            stage = "submit",
            collateral = %loan.collateral_name,
            debt = %loan.debt_name,
            amount = %quote.collateral_amount,
            expected_out = ?quote.expected_debt_amount,
            "Submitting repayment"
        );
        self.chain
            .submit_and_wait("executing repayment", self.repayment_contract, calldata)
            .await
            .map_err(ExecutionFailure::submit)
    }
}
