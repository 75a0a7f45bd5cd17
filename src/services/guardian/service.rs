// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::stats::GuardianStats;
use crate::domain::position::AccountPosition;
use crate::guardian::delegation::DelegationCertificate;
use crate::guardian::executor::RepaymentExecutor;
use crate::guardian::monitor::AccountMonitor;
use crate::guardian::quote::QuoteAcquisition;
use crate::guardian::registry::{AccountRegistry, MonitoredAccount, TaskState};
use crate::guardian::verifier::{RegistrationRequest, RegistrationVerifier};
use crate::network::chain::ChainClient;
use crate::network::lending::load_position;
use crate::network::swap_quote::QuoteSource;
use alloy::primitives::Address;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct GuardianSettings {
    pub repayment_contract: Address,
    pub poll_interval: Duration,
    pub quote_backoff: Duration,
    pub slippage: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    Updated,
}

impl RegistrationOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RegistrationOutcome::Registered => "registered",
            RegistrationOutcome::Updated => "updated",
        }
    }
}

/// Owns the account registry and every guardian component.
pub struct GuardianService {
    chain: Arc<dyn ChainClient>,
    registry: AccountRegistry,
    certificate: DelegationCertificate,
    verifier: RegistrationVerifier,
    monitor: Arc<AccountMonitor>,
    stats: Arc<GuardianStats>,
    repayment_contract: Address,
}

impl GuardianService {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        quotes: Arc<dyn QuoteSource>,
        settings: GuardianSettings,
    ) -> Self {
        let certificate = DelegationCertificate::new(chain.guardian_address());
        let verifier = RegistrationVerifier::new(chain.clone(), certificate.hash());
        let stats = Arc::new(GuardianStats::default());
        let acquisition = QuoteAcquisition::new(
            chain.clone(),
            quotes,
            settings.repayment_contract,
            settings.slippage,
            settings.quote_backoff,
        );
        let executor = RepaymentExecutor::new(chain.clone(), acquisition, settings.repayment_contract);
        let monitor = Arc::new(AccountMonitor::new(
            chain.clone(),
            executor,
            stats.clone(),
            settings.poll_interval,
        ));
        tracing::info!(
            target: "guardian",
            delegate = %certificate.delegate(),
            hash = %format!("{:#x}", certificate.hash()),
            "Delegation certificate ready"
        );

        Self {
            chain,
            registry: AccountRegistry::new(),
            certificate,
            verifier,
            monitor,
            stats,
            repayment_contract: settings.repayment_contract,
        }
    }

    /// Verifies `request` and starts or updates guarding of the account.
    ///
    /// Verification failures are returned and leave the registry untouched.
    /// Only the first registration for an account spawns a monitoring task.
    pub async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationOutcome, AppError> {
        let registration = match self.verifier.verify(request).await {
            Ok(reg) => reg,
            Err(e) => {
                GuardianStats::incr(&self.stats.registrations_rejected);
                tracing::warn!(
                    target: "verifier",
                    user = %request.user,
                    category = e.category(),
                    error = %e,
                    "Registration rejected"
                );
                return Err(e);
            }
        };

        let threshold_bps = registration.threshold_bps;
        let upsert = self.registry.upsert(registration);
        if !upsert.created {
            GuardianStats::incr(&self.stats.registrations_updated);
            tracing::info!(
                target: "guardian",
                account = %upsert.account.user,
                threshold_bps,
                state = upsert.account.state().as_str(),
                "Threshold updated"
            );
            return Ok(RegistrationOutcome::Updated);
        }

        GuardianStats::incr(&self.stats.registrations_accepted);
        if upsert.account.try_transition(TaskState::Idle, TaskState::Polling) {
            self.spawn_monitor(upsert.account);
        }
        Ok(RegistrationOutcome::Registered)
    }

    fn spawn_monitor(&self, account: Arc<MonitoredAccount>) {
        GuardianStats::incr(&self.stats.monitors_started);
        tracing::info!(
            target: "guardian",
            account = %account.user,
            threshold_bps = account.threshold_bps(),
            "Monitoring started"
        );
        let monitor = self.monitor.clone();
        tokio::spawn(async move {
            monitor.run(account).await;
        });
    }

    /// Fresh position snapshot for `user`, guarded or not.
    pub async fn position(&self, user: Address) -> Result<AccountPosition, AppError> {
        load_position(self.chain.as_ref(), user).await
    }

    pub fn account(&self, user: &Address) -> Option<Arc<MonitoredAccount>> {
        self.registry.get(user)
    }

    pub fn certificate(&self) -> &DelegationCertificate {
        &self.certificate
    }

    pub fn stats(&self) -> &GuardianStats {
        &self.stats
    }

    pub fn monitored_accounts(&self) -> usize {
        self.registry.len()
    }

    pub fn repayment_contract(&self) -> Address {
        self.repayment_contract
    }
}
