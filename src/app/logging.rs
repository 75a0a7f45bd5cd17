// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use std::str::FromStr;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const QUIET_MODULES: &str =
    "h2=info,hyper=info,hyper_util=info,reqwest=info,alloy_transport_http=info,alloy_rpc_client=info";

/// Bare levels (e.g. "debug") get the noisy transport crates capped at info.
/// Custom directive strings (with ',' or '=') are respected as-is.
pub fn filter_spec(log_level: &str) -> String {
    let normalized = log_level.trim();
    if normalized.is_empty() {
        return format!("info,{QUIET_MODULES}");
    }
    if normalized.contains(',') || normalized.contains('=') {
        normalized.to_string()
    } else {
        format!("{normalized},{QUIET_MODULES}")
    }
}

/// Installs the global subscriber. `RUST_LOG` wins over `log_level` when set.
pub fn setup_logging(log_level: &str, json_format: bool) -> Result<(), AppError> {
    let spec = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| filter_spec(log_level));
    let filter = EnvFilter::from_str(&spec).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        let json_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);
        subscriber.with(json_layer).try_init()
    } else {
        let fmt_layer = fmt::layer().with_target(true).compact();
        subscriber.with(fmt_layer).try_init()
    };
    installed.map_err(|e| AppError::Config(format!("Logging init failed: {e}")))?;

    tracing::info!(
        target: "config",
        filter = %spec,
        format = if json_format { "json" } else { "compact" },
        "Logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_quiets_transport_crates() {
        let spec = filter_spec("debug");
        assert!(spec.starts_with("debug,"));
        assert!(spec.contains("hyper=info"));
        assert!(EnvFilter::from_str(&spec).is_ok());
    }

    #[test]
    fn directive_strings_pass_through() {
        assert_eq!(
            filter_spec("warn,liquidation_guardian=trace"),
            "warn,liquidation_guardian=trace"
        );
        assert!(filter_spec("  ").starts_with("info,"));
    }
}
