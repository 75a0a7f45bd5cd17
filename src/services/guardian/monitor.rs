// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::stats::GuardianStats;
use crate::domain::position::{Loan, format_bps};
use crate::guardian::executor::RepaymentExecutor;
use crate::guardian::registry::{MonitoredAccount, TaskState};
use crate::network::chain::ChainClient;
use crate::network::lending::load_position;
use std::sync::Arc;
use std::time::Duration;

pub struct AccountMonitor {
    chain: Arc<dyn ChainClient>,
    executor: RepaymentExecutor,
    stats: Arc<GuardianStats>,
    poll_interval: Duration,
}

impl AccountMonitor {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        executor: RepaymentExecutor,
        stats: Arc<GuardianStats>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            chain,
            executor,
            stats,
            poll_interval,
        }
    }

    /// Drives a `Polling` account to a terminal state.
    ///
    /// Polls until the ratio reaches the current threshold, then executes the
    /// repayment once. Returns the state the task ended in.
    pub async fn run(&self, account: Arc<MonitoredAccount>) -> TaskState {
        let loan = self.poll_until_breach(&account).await;

        if !account.try_transition(TaskState::Polling, TaskState::Triggered)
            || !account.try_transition(TaskState::Triggered, TaskState::Executing)
        {
            return account.state();
        }

        match self.executor.execute(&loan, &account.signature).await {
            Ok(tx) => {
                account.try_transition(TaskState::Executing, TaskState::Done);
                GuardianStats::incr(&self.stats.executions_succeeded);
                tracing::info!(
                    target: "monitor",
                    account = %account.user,
                    tx = %format!("{:#x}", tx),
                    "Repayment executed"
                );
            }
            Err(failure) => {
                account.try_transition(TaskState::Executing, TaskState::Failed);
                GuardianStats::incr(&self.stats.executions_failed);
                tracing::error!(
                    target: "monitor",
                    account = %account.user,
                    stage = %failure.stage,
                    category = failure.error.category(),
                    error = %failure.error,
                    "Repayment failed; account is no longer guarded"
                );
            }
        }
        account.state()
    }

    async fn poll_until_breach(&self, account: &MonitoredAccount) -> Loan {
        loop {
            match load_position(self.chain.as_ref(), account.user).await {
                Ok(position) => {
                    let threshold_bps = account.threshold_bps();
                    if position.ratio.meets_bps(threshold_bps) {
                        tracing::info!(
                            target: "monitor",
                            account = %account.user,
                            ratio = %position.ratio,
                            threshold = %format_bps(threshold_bps),
                            "Threshold breached, repaying"
                        );
                        return position.loan;
                    }
                    tracing::debug!(
                        target: "monitor",
                        account = %account.user,
                        collateral = %position.collateral_amount,
                        debt = %position.debt_amount,
                        ratio = %position.ratio,
                        threshold_bps,
                        "Below threshold"
                    );
                }
                Err(e) => {
                    GuardianStats::incr(&self.stats.poll_errors);
                    tracing::warn!(
                        target: "monitor",
                        account = %account.user,
                        transient = e.is_transient(),
                        error = %e,
                        "Position read failed, retrying next cycle"
                    );
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
