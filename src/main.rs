// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use clap::Parser;
use liquidation_guardian::app::config::GlobalSettings;
use liquidation_guardian::app::logging::setup_logging;
use liquidation_guardian::domain::error::AppError;
use liquidation_guardian::guardian::{GuardianService, GuardianSettings};
use liquidation_guardian::infrastructure::network::chain::{AlloyChainClient, ChainClientConfig};
use liquidation_guardian::infrastructure::network::provider::ConnectionFactory;
use liquidation_guardian::infrastructure::network::swap_quote::SwapQuoteClient;
use liquidation_guardian::services::api::spawn_api_server;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "Guards Aave loans against liquidation with delegated repayments")]
struct Cli {
    /// Path to config file (default: config.toml when present)
    #[arg(long)]
    config: Option<String>,

    /// JSON-RPC endpoint (overrides config/env)
    #[arg(long)]
    rpc_url: Option<String>,

    /// API port (overrides config/env)
    #[arg(long)]
    api_port: Option<u16>,

    /// Poll interval in milliseconds (overrides config/env)
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Verbose logging
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Emit JSON log lines
    #[arg(long, default_value_t = false)]
    log_json: bool,
}

impl Cli {
    fn apply(&self, settings: &mut GlobalSettings) {
        if let Some(url) = &self.rpc_url {
            settings.rpc_url = url.clone();
        }
        if let Some(port) = self.api_port {
            settings.api_port = port;
        }
        if let Some(ms) = self.poll_interval_ms {
            settings.poll_interval_ms = ms;
        }
        settings.debug |= self.debug;
        settings.log_json |= self.log_json;
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let mut settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    cli.apply(&mut settings);
    setup_logging(settings.log_level(), settings.log_json)?;

    let signer = settings.guardian_signer()?;
    let provider = ConnectionFactory::http(&settings.rpc_url)?;
    let chain_id = ConnectionFactory::resolve_chain_id(&provider, settings.chain_id).await?;
    let repayment_contract = settings.repayment_contract()?;
    let price_feeds = settings.price_feed_overrides()?;
    if !price_feeds.is_empty() {
        tracing::info!(target: "config", overrides = price_feeds.len(), "Price feed overrides loaded");
    }

    let chain = Arc::new(AlloyChainClient::new(
        provider,
        signer,
        ChainClientConfig {
            chain_id,
            lending_pool: settings.lending_pool()?,
            base_asset: settings.base_asset()?,
            gas_limit: settings.tx_gas_limit,
            receipt_poll: Duration::from_millis(settings.receipt_poll_ms_value()),
            receipt_timeout: Duration::from_millis(settings.receipt_timeout_ms_value()),
            price_feeds,
        },
    ));
    let quotes = Arc::new(SwapQuoteClient::new(
        &settings.quote_url,
        settings.quote_timeout(),
    )?);

    let service = Arc::new(GuardianService::new(
        chain,
        quotes,
        GuardianSettings {
            repayment_contract,
            poll_interval: settings.poll_interval(),
            quote_backoff: settings.quote_backoff(),
            slippage: settings.slippage_percent.clone(),
        },
    ));
    tracing::info!(
        target: "config",
        chain_id,
        rpc = %settings.rpc_url,
        guardian = %service.certificate().delegate(),
        contract = %repayment_contract,
        poll_ms = settings.poll_interval().as_millis() as u64,
        "Guardian configured"
    );

    let shutdown = CancellationToken::new();
    spawn_api_server(settings.api_addr()?, service, shutdown.clone()).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| AppError::Unknown(anyhow::anyhow!("signal handler failed: {e}")))?;
    tracing::info!(target: "api", "Shutdown requested; in-flight registrations are dropped");
    shutdown.cancel();
    Ok(())
}
