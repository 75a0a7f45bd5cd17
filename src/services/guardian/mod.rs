// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod delegation;
pub mod executor;
pub mod monitor;
pub mod quote;
pub mod registry;
pub mod service;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use delegation::DelegationCertificate;
pub use registry::{AccountRegistry, MonitoredAccount, TaskState};
pub use service::{GuardianService, GuardianSettings, RegistrationOutcome};
pub use verifier::{Registration, RegistrationRequest, RegistrationVerifier};
