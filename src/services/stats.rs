// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default, Debug)]
pub struct GuardianStats {
    pub registrations_accepted: AtomicU64,
    pub registrations_rejected: AtomicU64,
    pub registrations_updated: AtomicU64,
    pub monitors_started: AtomicU64,
    pub poll_errors: AtomicU64,
    pub executions_succeeded: AtomicU64,
    pub executions_failed: AtomicU64,
}

impl GuardianStats {
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Prometheus text exposition of every counter.
    pub fn render(&self, monitored_accounts: usize) -> String {
        let counters = [
            ("guardian_registrations_accepted", &self.registrations_accepted),
            ("guardian_registrations_rejected", &self.registrations_rejected),
            ("guardian_registrations_updated", &self.registrations_updated),
            ("guardian_monitors_started", &self.monitors_started),
            ("guardian_poll_errors", &self.poll_errors),
            ("guardian_executions_succeeded", &self.executions_succeeded),
            ("guardian_executions_failed", &self.executions_failed),
        ];
        let mut body = String::new();
        for (name, value) in counters {
            body.push_str(&format!(
                "# TYPE {name} counter\n{name} {}\n",
                value.load(Ordering::Relaxed)
            ));
        }
        body.push_str(&format!(
            "# TYPE guardian_monitored_accounts gauge\nguardian_monitored_accounts {}\n",
            monitored_accounts
        ));
        body
    }
}
