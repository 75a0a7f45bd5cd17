// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::{parse_address_hex, parse_address_map};
use crate::domain::constants;
use crate::domain::error::AppError;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_false")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub log_json: bool,

    // Chain
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    pub chain_id: Option<u64>,

    // Identity
    #[serde(default)]
    pub guardian_key: String,
    pub guardian_address: Option<String>,

    // Contracts
    #[serde(default = "default_lending_pool")]
    pub lending_pool_address: String,
    #[serde(default = "default_base_asset")]
    pub base_asset_address: String,
    #[serde(default)]
    pub repayment_contract_address: String,
    /// Asset address -> Chainlink aggregator, overriding the built-in table.
    pub price_feeds: Option<HashMap<String, String>>,

    // API
    #[serde(default = "default_api_bind")]
    pub api_bind: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    // Monitoring and quotes
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_quote_url")]
    pub quote_url: String,
    #[serde(default = "default_quote_retry_backoff_ms")]
    pub quote_retry_backoff_ms: u64,
    #[serde(default = "default_quote_timeout_ms")]
    pub quote_timeout_ms: u64,
    /// Percent, passed through to the quote provider.
    #[serde(default = "default_slippage_percent")]
    pub slippage_percent: String,

    // Transaction
    #[serde(default = "default_tx_gas_limit")]
    pub tx_gas_limit: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
}

// Defaults
fn default_false() -> bool {
    false
}
fn default_rpc_url() -> String {
    "http://localhost:8545".to_string()
}
fn default_lending_pool() -> String {
    constants::AAVE_V2_LENDING_POOL.to_string()
}
fn default_base_asset() -> String {
    constants::WETH_MAINNET.to_string()
}
fn default_api_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_api_port() -> u16 {
    3000
}
fn default_poll_interval_ms() -> u64 {
    constants::DEFAULT_POLL_INTERVAL_MS
}
fn default_quote_url() -> String {
    constants::ONEINCH_SWAP_URL.to_string()
}
fn default_quote_retry_backoff_ms() -> u64 {
    constants::DEFAULT_QUOTE_BACKOFF_MS
}
fn default_quote_timeout_ms() -> u64 {
    constants::DEFAULT_QUOTE_TIMEOUT_MS
}
fn default_slippage_percent() -> String {
    "1".to_string()
}
fn default_tx_gas_limit() -> u64 {
    constants::DEFAULT_GAS_LIMIT
}
fn default_receipt_poll_ms() -> u64 {
    500
}
fn default_receipt_timeout_ms() -> u64 {
    120_000
}

fn address_setting(field: &str, raw: &str) -> Result<Address, AppError> {
    parse_address_hex(raw)
        .ok_or_else(|| AppError::InvalidAddress(format!("{field}={}", raw.trim())))
}

impl GlobalSettings {
    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder();
        if let Some(selected_path) = path {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // CLI (in main) > env/.env > config file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects settings the service cannot start with.
    pub fn validate(&self) -> Result<(), AppError> {
        self.guardian_signer()?;
        self.lending_pool()?;
        self.base_asset()?;
        self.repayment_contract()?;
        self.price_feed_overrides()?;
        self.api_addr()?;
        Ok(())
    }

    /// Guardian signing key, checked against `guardian_address` when set.
    pub fn guardian_signer(&self) -> Result<PrivateKeySigner, AppError> {
        let key = self.guardian_key.trim();
        if key.is_empty() {
            return Err(AppError::Config("GUARDIAN_KEY is missing".to_string()));
        }
        let signer = PrivateKeySigner::from_str(key)
            .map_err(|e| AppError::Config(format!("Invalid guardian key: {}", e)))?;
        if let Some(raw) = self.guardian_address.as_deref().filter(|s| !s.trim().is_empty()) {
            let configured = address_setting("guardian_address", raw)?;
            if configured != signer.address() {
                return Err(AppError::Config(format!(
                    "guardian_address {} does not match guardian_key address {}",
                    configured,
                    signer.address()
                )));
            }
        }
        Ok(signer)
    }

    pub fn lending_pool(&self) -> Result<Address, AppError> {
        address_setting("lending_pool_address", &self.lending_pool_address)
    }

    pub fn base_asset(&self) -> Result<Address, AppError> {
        address_setting("base_asset_address", &self.base_asset_address)
    }

    pub fn repayment_contract(&self) -> Result<Address, AppError> {
        if self.repayment_contract_address.trim().is_empty() {
            return Err(AppError::Config(
                "REPAYMENT_CONTRACT_ADDRESS is missing".to_string(),
            ));
        }
        address_setting("repayment_contract_address", &self.repayment_contract_address)
    }

    pub fn price_feed_overrides(&self) -> Result<HashMap<Address, Address>, AppError> {
        match &self.price_feeds {
            Some(raw) => parse_address_map(raw),
            None => Ok(HashMap::new()),
        }
    }

    pub fn api_addr(&self) -> Result<SocketAddr, AppError> {
        let ip = IpAddr::from_str(self.api_bind.trim())
            .map_err(|e| AppError::Config(format!("Invalid api_bind {}: {}", self.api_bind, e)))?;
        Ok(SocketAddr::new(ip, self.api_port))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(100))
    }

    pub fn quote_backoff(&self) -> Duration {
        Duration::from_millis(self.quote_retry_backoff_ms)
    }

    pub fn quote_timeout(&self) -> Duration {
        Duration::from_millis(self.quote_timeout_ms.max(1_000))
    }

    pub fn receipt_poll_ms_value(&self) -> u64 {
        self.receipt_poll_ms.max(100)
    }

    pub fn receipt_timeout_ms_value(&self) -> u64 {
        self.receipt_timeout_ms.max(self.receipt_poll_ms_value())
    }

    pub fn log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}
