// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! In-memory chain and quote doubles shared by the guardian unit tests.

use crate::common::constants::WETH_MAINNET;
use crate::common::error::AppError;
use crate::data::executor::ILiquidationGuardian;
use crate::domain::position::PriceFactor;
use crate::network::chain::{ChainClient, ReserveInfo};
use crate::network::swap_quote::{QuoteSource, SwapQuote, SwapRequest};
use alloy::primitives::{Address, B256, Bytes, U256, address};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
pub const A_WETH: Address = address!("030bA81f1c18d280636F32af80b9AAd02Cf0854e");
pub const STABLE_DEBT_DAI: Address = address!("778A13D3eeb110A4f7bb6529F99c000119a08E92");
pub const VARIABLE_DEBT_DAI: Address = address!("6C3c78838c761c6Ac7bE9F59fe808ea2A6E4379d");
pub const GUARDIAN: Address = address!("9999999999999999999999999999999999999999");

pub fn eth(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}

/// DAI price in wei of ETH for a given ETH/DAI rate.
pub fn dai_price(dai_per_eth: u64) -> U256 {
    eth(1) / U256::from(dai_per_eth)
}

/// WETH collateral, DAI debt; reserves are `[DAI, WETH]`.
pub struct MockChain {
    reserves: Vec<Address>,
    reserve_data: HashMap<Address, ReserveInfo>,
    configurations: Mutex<HashMap<Address, U256>>,
    balances: Mutex<HashMap<(Address, Address), U256>>,
    prices: Mutex<HashMap<Address, PriceFactor>>,
    failing_reads: AtomicUsize,
    reads: AtomicUsize,
    submissions: Mutex<Vec<(String, Address, Bytes)>>,
    submit_error: Mutex<Option<String>>,
    submit_delay: Mutex<Duration>,
}

impl MockChain {
    pub fn new() -> Self {
        let weth_config = (U256::from(8_250u64) << 16) | U256::from(8_000u64);
        let reserve_data = HashMap::from([
            (
                WETH_MAINNET,
                ReserveInfo {
                    configuration: weth_config,
                    a_token: A_WETH,
                    stable_debt_token: Address::from([0x01; 20]),
                    variable_debt_token: Address::from([0x02; 20]),
                },
            ),
            (
                DAI,
                ReserveInfo {
                    configuration: (U256::from(8_000u64) << 16) | U256::from(7_500u64),
                    a_token: Address::from([0x03; 20]),
                    stable_debt_token: STABLE_DEBT_DAI,
                    variable_debt_token: VARIABLE_DEBT_DAI,
                },
            ),
        ]);
        Self {
            reserves: vec![DAI, WETH_MAINNET],
            reserve_data,
            configurations: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            prices: Mutex::new(HashMap::new()),
            failing_reads: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            submissions: Mutex::new(Vec::new()),
            submit_error: Mutex::new(None),
            submit_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// Deposits `collateral` WETH and borrows `debt` DAI at `dai_price_wei` per DAI.
    pub fn open_loan(&self, user: Address, collateral: U256, debt: U256, dai_price_wei: U256) {
        // DAI (index 0) borrowed -> bit 0, WETH (index 1) collateral -> bit 3.
        let bitmap = U256::from(1u64) | (U256::from(1u64) << 3);
        self.configurations.lock().unwrap().insert(user, bitmap);
        let mut balances = self.balances.lock().unwrap();
        balances.insert((A_WETH, user), collateral);
        balances.insert((VARIABLE_DEBT_DAI, user), debt);
        balances.insert((STABLE_DEBT_DAI, user), U256::ZERO);
        drop(balances);
        self.set_dai_price(dai_price_wei);
    }

    pub fn set_dai_price(&self, price_wei: U256) {
        self.prices
            .lock()
            .unwrap()
            .insert(DAI, PriceFactor::from_decimals(price_wei, 18));
    }

    pub fn set_stable_debt(&self, user: Address, amount: U256) {
        self.balances
            .lock()
            .unwrap()
            .insert((STABLE_DEBT_DAI, user), amount);
    }

    pub fn debt_of(&self, user: Address) -> U256 {
        let balances = self.balances.lock().unwrap();
        let stable = balances.get(&(STABLE_DEBT_DAI, user)).copied().unwrap_or_default();
        let variable = balances.get(&(VARIABLE_DEBT_DAI, user)).copied().unwrap_or_default();
        stable + variable
    }

    pub fn fail_next_reads(&self, count: usize) {
        self.failing_reads.store(count, Ordering::SeqCst);
    }

    pub fn fail_submissions(&self, reason: &str) {
        *self.submit_error.lock().unwrap() = Some(reason.to_string());
    }

    pub fn delay_submissions(&self, delay: Duration) {
        *self.submit_delay.lock().unwrap() = delay;
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<(String, Address, Bytes)> {
        self.submissions.lock().unwrap().clone()
    }

    fn read(&self, operation: &str) -> Result<(), AppError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(AppError::chain(operation, "connection reset"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn guardian_address(&self) -> Address {
        GUARDIAN
    }

    async fn reserves_list(&self) -> Result<Vec<Address>, AppError> {
        self.read("getReservesList")?;
        Ok(self.reserves.clone())
    }

    async fn user_configuration(&self, user: Address) -> Result<U256, AppError> {
        self.read("getUserConfiguration")?;
        Ok(self
            .configurations
            .lock()
            .unwrap()
            .get(&user)
            .copied()
            .unwrap_or_default())
    }

    async fn reserve_data(&self, asset: Address) -> Result<ReserveInfo, AppError> {
        self.read("getReserveData")?;
        self.reserve_data
            .get(&asset)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("reserve {asset}")))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        self.read("balanceOf")?;
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn price_of(&self, asset: Address) -> Result<PriceFactor, AppError> {
        if asset == WETH_MAINNET {
            return Ok(PriceFactor::BASE);
        }
        self.read("latestRoundData")?;
        self.prices
            .lock()
            .unwrap()
            .get(&asset)
            .copied()
            .ok_or_else(|| AppError::NotFound(format!("price feed for asset {asset}")))
    }

    async fn submit_and_wait(
        &self,
        label: &str,
        to: Address,
        calldata: Bytes,
    ) -> Result<B256, AppError> {
        let delay = *self.submit_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.submissions
            .lock()
            .unwrap()
            .push((label.to_string(), to, calldata.clone()));

        if let Some(reason) = self.submit_error.lock().unwrap().clone() {
            return Err(AppError::execution("receipt", reason));
        }

        // The repayment contract clears the borrower's debt.
        let call = ILiquidationGuardian::executeCall::abi_decode(&calldata)
            .map_err(|e| AppError::Parse(e.to_string()))?;
        let mut balances = self.balances.lock().unwrap();
        balances.insert((STABLE_DEBT_DAI, call.user), U256::ZERO);
        balances.insert((VARIABLE_DEBT_DAI, call.user), U256::ZERO);
        Ok(B256::repeat_byte(0x42))
    }
}

/// Replays scripted quote responses and records each request.
pub struct ScriptedQuotes {
    responses: Mutex<VecDeque<Result<SwapQuote, AppError>>>,
    requests: Mutex<Vec<SwapRequest>>,
}

impl ScriptedQuotes {
    pub fn new(responses: Vec<Result<SwapQuote, AppError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok() -> Self {
        Self::new(Vec::new())
    }

    pub fn requests(&self) -> Vec<SwapRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn quote_ok() -> SwapQuote {
    SwapQuote {
        calldata: Bytes::from(vec![0x7c, 0x02, 0x52, 0x00]),
        to_token_amount: Some(eth(19_800)),
    }
}

#[async_trait]
impl QuoteSource for ScriptedQuotes {
    async fn swap(&self, request: &SwapRequest) -> Result<SwapQuote, AppError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(quote_ok()))
    }
}
