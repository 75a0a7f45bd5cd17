// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::{DEFAULT_PRIORITY_FEE_GWEI, default_aggregator};
use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::data::abi::{IAggregatorV3, IERC20, ILendingPool};
use crate::domain::position::PriceFactor;
use crate::network::nonce::NonceManager;
use crate::network::provider::HttpProvider;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::eips::eip2930::AccessList;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::providers::Provider;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

/// Reserve fields the guardian needs from `getReserveData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveInfo {
    /// Packed reserve configuration bitmap.
    pub configuration: U256,
    pub a_token: Address,
    pub stable_debt_token: Address,
    pub variable_debt_token: Address,
}

impl ReserveInfo {
    /// Bits 16..32 of the configuration word.
    pub fn liquidation_threshold_bps(&self) -> u16 {
        (u16::from(self.configuration.byte(3)) << 8) | u16::from(self.configuration.byte(2))
    }
}

/// Everything the guardian reads from or writes to the chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address that signs repayment transactions.
    fn guardian_address(&self) -> Address;

    async fn reserves_list(&self) -> Result<Vec<Address>, AppError>;

    /// Raw user configuration bitmap from the lending pool.
    async fn user_configuration(&self, user: Address) -> Result<U256, AppError>;

    async fn reserve_data(&self, asset: Address) -> Result<ReserveInfo, AppError>;

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, AppError>;

    /// Price of `asset` in the base asset. The base asset itself is `PriceFactor::BASE`.
    async fn price_of(&self, asset: Address) -> Result<PriceFactor, AppError>;

    /// Signs with the guardian key, broadcasts, and blocks until mined.
    /// A reverted or unmined transaction is an `Execution` error.
    async fn submit_and_wait(
        &self,
        label: &str,
        to: Address,
        calldata: Bytes,
    ) -> Result<B256, AppError>;
}

#[derive(Debug, Clone)]
pub struct ChainClientConfig {
    pub chain_id: u64,
    pub lending_pool: Address,
    pub base_asset: Address,
    pub gas_limit: u64,
    pub receipt_poll: Duration,
    pub receipt_timeout: Duration,
    /// Asset -> aggregator entries that take precedence over the built-in table.
    pub price_feeds: HashMap<Address, Address>,
}

pub struct AlloyChainClient {
    provider: HttpProvider,
    signer: PrivateKeySigner,
    nonces: NonceManager,
    config: ChainClientConfig,
    decimals_cache: DashMap<Address, u8>,
}

impl AlloyChainClient {
    pub fn new(provider: HttpProvider, signer: PrivateKeySigner, config: ChainClientConfig) -> Self {
        let nonces = NonceManager::new(provider.clone(), signer.address());
        Self {
            provider,
            signer,
            nonces,
            config,
            decimals_cache: DashMap::new(),
        }
    }

    pub fn aggregator_for(&self, asset: Address) -> Option<Address> {
        resolve_aggregator(&self.config.price_feeds, asset)
    }

    async fn read<T, F, Fut, E>(&self, operation: &str, op: F) -> Result<T, AppError>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        retry_async(op, 3, Duration::from_millis(100))
            .await
            .map_err(|e| AppError::chain(operation, e))
    }

    async fn feed_decimals(&self, aggregator: Address) -> Result<u8, AppError> {
        if let Some(cached) = self.decimals_cache.get(&aggregator) {
            return Ok(*cached);
        }
        let feed = IAggregatorV3::new(aggregator, self.provider.clone());
        let decimals: u8 = self
            .read("decimals", move |_| {
                let feed = feed.clone();
                async move { feed.decimals().call().await }
            })
            .await?;
        self.decimals_cache.insert(aggregator, decimals);
        Ok(decimals)
    }

    async fn sign_and_send(&self, to: Address, calldata: Bytes, nonce: u64) -> Result<B256, AppError> {
        let gas_price = self
            .provider
            .get_gas_price()
            .await
            .map_err(|e| AppError::chain("eth_gasPrice", e))?;
        let max_priority_fee_per_gas =
            (u128::from(DEFAULT_PRIORITY_FEE_GWEI) * 1_000_000_000).min(gas_price);
        let max_fee_per_gas = gas_price.saturating_mul(2).max(max_priority_fee_per_gas);

        let mut tx = TxEip1559 {
            chain_id: self.config.chain_id,
            nonce,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_limit: self.config.gas_limit,
            to: TxKind::Call(to),
            value: U256::ZERO,
            access_list: AccessList::default(),
            input: calldata,
        };

        let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
            .map_err(|e| AppError::execution("sign", format!("Sign tx failed: {}", e)))?;
        let signed: TxEnvelope = tx.into_signed(sig).into();
        let raw = signed.encoded_2718();

        self.provider
            .send_raw_transaction(&raw)
            .await
            .map_err(|e| AppError::execution("broadcast", e.to_string()))?;
        Ok(*signed.tx_hash())
    }

    async fn await_receipt(&self, hash: &B256) -> Result<u64, AppError> {
        let timeout = self.config.receipt_timeout;
        let poll = self.config.receipt_poll;
        let started = Instant::now();

        loop {
            if started.elapsed() >= timeout {
                return Err(AppError::execution(
                    "receipt",
                    format!("{:#x} not mined within {:?}", hash, timeout),
                ));
            }

            match self.provider.get_transaction_receipt(*hash).await {
                Ok(Some(rcpt)) => {
                    let block = rcpt.block_number.unwrap_or_default();
                    if !rcpt.status() {
                        return Err(AppError::execution(
                            "receipt",
                            format!("{:#x} reverted in block {}", hash, block),
                        ));
                    }
                    return Ok(block);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "chain",
                        error = %e,
                        tx = %format!("{:#x}", hash),
                        "Receipt lookup error; retrying"
                    );
                }
            }

            tokio::time::sleep(poll).await;
        }
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    fn guardian_address(&self) -> Address {
        self.signer.address()
    }

    async fn reserves_list(&self) -> Result<Vec<Address>, AppError> {
        let pool = ILendingPool::new(self.config.lending_pool, self.provider.clone());
        self.read("getReservesList", move |_| {
            let pool = pool.clone();
            async move { pool.getReservesList().call().await }
        })
        .await
    }

    async fn user_configuration(&self, user: Address) -> Result<U256, AppError> {
        let pool = ILendingPool::new(self.config.lending_pool, self.provider.clone());
        self.read("getUserConfiguration", move |_| {
            let pool = pool.clone();
            async move { pool.getUserConfiguration(user).call().await.map(|c| c.data) }
        })
        .await
    }

    async fn reserve_data(&self, asset: Address) -> Result<ReserveInfo, AppError> {
        let pool = ILendingPool::new(self.config.lending_pool, self.provider.clone());
        let data = self
            .read("getReserveData", move |_| {
                let pool = pool.clone();
                async move { pool.getReserveData(asset).call().await }
            })
            .await?;
        Ok(ReserveInfo {
            configuration: data.configuration.data,
            a_token: data.aTokenAddress,
            stable_debt_token: data.stableDebtTokenAddress,
            variable_debt_token: data.variableDebtTokenAddress,
        })
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        self.read("balanceOf", move |_| {
            let erc20 = erc20.clone();
            async move { erc20.balanceOf(owner).call().await }
        })
        .await
    }

    async fn price_of(&self, asset: Address) -> Result<PriceFactor, AppError> {
        if asset == self.config.base_asset {
            return Ok(PriceFactor::BASE);
        }
        let aggregator = self
            .aggregator_for(asset)
            .ok_or_else(|| AppError::NotFound(format!("price feed for asset {asset}")))?;

        let decimals = self.feed_decimals(aggregator).await?;
        let feed = IAggregatorV3::new(aggregator, self.provider.clone());
        let answer = self
            .read("latestRoundData", move |_| {
                let feed = feed.clone();
                async move { feed.latestRoundData().call().await.map(|r| r.answer) }
            })
            .await?;
        if answer.is_negative() {
            return Err(AppError::chain(
                "latestRoundData",
                format!("negative answer {answer} from {aggregator}"),
            ));
        }
        Ok(PriceFactor::from_decimals(answer.into_raw(), decimals))
    }

    async fn submit_and_wait(
        &self,
        label: &str,
        to: Address,
        calldata: Bytes,
    ) -> Result<B256, AppError> {
        let nonce = self.nonces.reserve().await?;
        let hash = match self.sign_and_send(to, calldata, nonce).await {
            Ok(hash) => hash,
            Err(e) => {
                self.nonces.resync().await;
                return Err(e);
            }
        };
        tracing::info!(
            target: "chain",
            label,
            nonce,
            tx = %format!("{:#x}", hash),
            "Transaction broadcast"
        );

        match self.await_receipt(&hash).await {
            Ok(block) => {
                tracing::info!(target: "chain", label, block, tx = %format!("{:#x}", hash), "Transaction mined");
                Ok(hash)
            }
            Err(e) => {
                self.nonces.resync().await;
                Err(e)
            }
        }
    }
}

/// Configured override first, then the built-in mainnet table.
pub fn resolve_aggregator(overrides: &HashMap<Address, Address>, asset: Address) -> Option<Address> {
    overrides
        .get(&asset)
        .copied()
        .or_else(|| default_aggregator(asset))
}
