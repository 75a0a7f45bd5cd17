// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::guardian::verifier::Registration;
use alloy::primitives::{Address, Bytes};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU16, Ordering};

/// Lifecycle of an account's monitoring task.
///
/// `Idle -> Polling -> Triggered -> Executing -> Done | Failed`. Every
/// transition is a compare-and-swap, so each edge is taken at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TaskState {
    Idle = 0,
    Polling = 1,
    Triggered = 2,
    Executing = 3,
    Done = 4,
    Failed = 5,
}

impl TaskState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => TaskState::Polling,
            2 => TaskState::Triggered,
            3 => TaskState::Executing,
            4 => TaskState::Done,
            5 => TaskState::Failed,
            _ => TaskState::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Idle => "idle",
            TaskState::Polling => "polling",
            TaskState::Triggered => "triggered",
            TaskState::Executing => "executing",
            TaskState::Done => "done",
            TaskState::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Done | TaskState::Failed)
    }
}

/// Registry entry for one guarded account. Only the threshold and state
/// change after creation.
#[derive(Debug)]
pub struct MonitoredAccount {
    pub user: Address,
    pub signature: Bytes,
    threshold_bps: AtomicU16,
    state: AtomicU8,
}

impl MonitoredAccount {
    pub fn new(registration: Registration) -> Self {
        Self {
            user: registration.user,
            signature: registration.signature,
            threshold_bps: AtomicU16::new(registration.threshold_bps),
            state: AtomicU8::new(TaskState::Idle as u8),
        }
    }

    pub fn threshold_bps(&self) -> u16 {
        self.threshold_bps.load(Ordering::Acquire)
    }

    pub fn set_threshold_bps(&self, bps: u16) {
        self.threshold_bps.store(bps, Ordering::Release);
    }

    pub fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Moves `from -> to` only if the task is currently in `from`.
    pub fn try_transition(&self, from: TaskState, to: TaskState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

pub struct Upsert {
    pub account: Arc<MonitoredAccount>,
    pub created: bool,
}

/// Service-owned map of guarded accounts. Entries are never removed.
#[derive(Default)]
pub struct AccountRegistry {
    accounts: DashMap<Address, Arc<MonitoredAccount>>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new account or updates only the threshold of an existing one.
    pub fn upsert(&self, registration: Registration) -> Upsert {
        match self.accounts.entry(registration.user) {
            Entry::Occupied(entry) => {
                let account = entry.get().clone();
                account.set_threshold_bps(registration.threshold_bps);
                Upsert {
                    account,
                    created: false,
                }
            }
            Entry::Vacant(entry) => {
                let account = Arc::new(MonitoredAccount::new(registration));
                entry.insert(account.clone());
                Upsert {
                    account,
                    created: true,
                }
            }
        }
    }

    pub fn get(&self, user: &Address) -> Option<Arc<MonitoredAccount>> {
        self.accounts.get(user).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(threshold_bps: u16) -> Registration {
        Registration {
            user: Address::from([0x11; 20]),
            signature: Bytes::from(vec![0xaa; 65]),
            threshold_bps,
        }
    }

    #[test]
    fn second_registration_only_updates_threshold() {
        let registry = AccountRegistry::new();
        let first = registry.upsert(registration(7_000));
        assert!(first.created);
        assert!(first.account.try_transition(TaskState::Idle, TaskState::Polling));

        let second = registry.upsert(Registration {
            signature: Bytes::from(vec![0xbb; 65]),
            ..registration(6_500)
        });
        assert!(!second.created);
        assert!(Arc::ptr_eq(&first.account, &second.account));
        assert_eq!(second.account.threshold_bps(), 6_500);
        assert_eq!(second.account.signature, Bytes::from(vec![0xaa; 65]));
        assert_eq!(second.account.state(), TaskState::Polling);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn transitions_are_one_shot() {
        let account = MonitoredAccount::new(registration(7_000));
        assert_eq!(account.state(), TaskState::Idle);
        assert!(account.try_transition(TaskState::Idle, TaskState::Polling));
        assert!(!account.try_transition(TaskState::Idle, TaskState::Polling));
        assert!(account.try_transition(TaskState::Polling, TaskState::Triggered));
        assert!(account.try_transition(TaskState::Triggered, TaskState::Executing));
        assert!(!account.try_transition(TaskState::Triggered, TaskState::Executing));
        assert!(account.try_transition(TaskState::Executing, TaskState::Done));
        assert!(account.state().is_terminal());
        assert_eq!(account.state().as_str(), "done");
    }

    #[test]
    fn concurrent_upserts_create_one_entry() {
        let registry = Arc::new(AccountRegistry::new());
        let handles: Vec<_> = (0..16u16)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.upsert(registration(5_000 + i)).created)
            })
            .collect();
        let created = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|c| *c)
            .count();
        assert_eq!(created, 1);
        assert_eq!(registry.len(), 1);
    }
}
