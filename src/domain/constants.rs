// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};
use lazy_static::lazy_static;
use std::collections::HashMap;

// =============================================================================
// PROTOCOL ADDRESSES (Ethereum mainnet)
// =============================================================================

pub const AAVE_V2_LENDING_POOL: Address = address!("7d2768dE32b0b80b7a3454c06BdAc94A69DDc7A9");
pub const WETH_MAINNET: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

pub const ONEINCH_SWAP_URL: &str = "https://api.1inch.exchange/v2.0/swap";

// =============================================================================
// DELEGATION CERTIFICATE DOMAIN
// =============================================================================

pub const APP_NAME: &str = "AAVE Liquidation Protection Bot";
pub const APP_VERSION: &str = "1";
pub const CERTIFICATE_CHAIN_ID: u64 = 1337;
pub const CERTIFICATE_SALT: &str = "SU%N6gmumvj.A{@B,SdWXtVgg(Bof9SA";

// =============================================================================
// TIMING & TRANSACTION CONSTANTS
// =============================================================================

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_QUOTE_BACKOFF_MS: u64 = 1_000;
pub const DEFAULT_QUOTE_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_GAS_LIMIT: u64 = 9_500_000;
pub const DEFAULT_PRIORITY_FEE_GWEI: u64 = 2;

/// Liquidation thresholds and guardian thresholds share this scale.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Digits of the rendered health ratio.
pub const RATIO_DISPLAY_PLACES: u32 = 10;

// =============================================================================
// PRICE FEEDS
// =============================================================================

/// Reserve token metadata: display name and its Chainlink ETH-denominated aggregator.
/// `aggregator` is `None` for the base asset and for reserves without a feed.
#[derive(Debug, Clone, Copy)]
pub struct FeedEntry {
    pub name: &'static str,
    pub aggregator: Option<Address>,
}

const fn feed(name: &'static str, aggregator: Option<Address>) -> FeedEntry {
    FeedEntry { name, aggregator }
}

lazy_static! {
    // Aave v2 mainnet reserves
    pub static ref PRICE_FEEDS_MAINNET: HashMap<Address, FeedEntry> = {
        let mut m = HashMap::new();
        m.insert(address!("dAC17F958D2ee523a2206206994597C13D831ec7"), feed("USDT", Some(address!("Ee9F2375b4bdF6387aa8265dD4FB8F16512A1d46"))));
        m.insert(address!("2260FAC5E5542a773Aa44fBCfeDf7C193bc2C599"), feed("WBTC", Some(address!("deb288F737066589598e9214E782fa5A8eD689e8"))));
        m.insert(WETH_MAINNET, feed("WETH9", None));
        m.insert(address!("0bc529c00C6401aEF6D220BE8C6Ea1667F6Ad93e"), feed("YFI", Some(address!("7c5d4F8345e66f68099581Db340cd65B078C41f4"))));
        m.insert(address!("E41d2489571d322189246DaFA5ebDe1F4699F498"), feed("ZRXToken", Some(address!("2Da4983a622a8498bb1a21FaE9D8F6C664939962"))));
        m.insert(address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984"), feed("Uni", Some(address!("D6aA3D25116d8dA79Ea0246c4826EB951872e02e"))));
        m.insert(address!("7Fc66500c84A76Ad7e9c93437bFc5Ac33E2DDaE9"), feed("AAVE", Some(address!("6Df09E975c830ECae5bd4eD9d90f3A95a4f88012"))));
        m.insert(address!("0D8775F648430679A709E98d2b0Cb6250d2887EF"), feed("BAToken", Some(address!("0d16d4528239e9ee52fa531af613AcdB23D88c94"))));
        m.insert(address!("4Fabb145d64652a948d72533023f6E7A623C7C53"), feed("Binance USD", Some(address!("614715d2Af89E6EC99A233818275142cE88d1Cfd"))));
        m.insert(address!("6B175474E89094C44Da98b954EedeAC495271d0F"), feed("Dai", Some(address!("773616E4d11A78F511299002da57A0a94577F1f4"))));
        m.insert(address!("F629cBd94d3791C9250152BD8dfBDF380E2a3B9c"), feed("ENJToken", Some(address!("24D9aB51950F3d62E9144fdC2f3135DAA6Ce8D1B"))));
        m.insert(address!("dd974D5C2e2928deA5F71b9825b8b646686BD200"), feed("KyberNetworkCrystal", Some(address!("656c0544eF4C98A6a98491833A89204Abb045d6b"))));
        m.insert(address!("514910771AF9Ca656af840dff83E8264EcF986CA"), feed("LinkToken", Some(address!("DC530D9457755926550b59e8ECcdaE7624181557"))));
        m.insert(address!("0F5D2fB29fb7d3CFeE444a200298f468908cC942"), feed("MANAToken", Some(address!("82A44D92D6c329826dc557c5E1Be6ebeC5D5FeB9"))));
        m.insert(address!("9f8F72aA9304c8B593d555F12eF6589cC3A579A2"), feed("DSToken", None));
        m.insert(address!("408e41876cCCDC0F92210600ef50372656052a38"), feed("RepublicToken", Some(address!("F1939BECE7708382b5fb5e559f630CB8B39a10ee"))));
        m.insert(address!("C011a73ee8576Fb46F5E1c5751cA3B9Fe0af2a6F"), feed("Synthetix Network Token", Some(address!("F9A76ae7a1075Fe7d646b06fF05Bd48b9FA5582e"))));
        m.insert(address!("57Ab1ec28D129707052df4dF418D58a2D46d5f51"), feed("Synth sUSD", Some(address!("b343e7a1aF578FA35632435243D814e7497622f7"))));
        m.insert(address!("0000000000085d4780B73119b644AE5ecd22b376"), feed("TrueUSD", Some(address!("7aeCF1c19661d12E962b69eBC8f6b2E63a55C660"))));
        m.insert(address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), feed("USD Coin", Some(address!("64EaC61A2DFda2c3Fa04eED49AA33D021AeC8838"))));
        m.insert(address!("D533a949740bb3306d119CC777fa900bA034cd52"), feed("Vyper_contract", Some(address!("8a12Be339B0cD1829b91Adc01977caa5E9ac121e"))));
        m.insert(address!("056Fd409E1d7A124BD7017459dFEa2F387b6d5Cd"), feed("Gemini dollar", None));
        m
    };
}

/// Display name for a reserve asset; unknown assets render as their checksummed address.
pub fn asset_name(asset: Address) -> String {
    PRICE_FEEDS_MAINNET
        .get(&asset)
        .map(|entry| entry.name.to_string())
        .unwrap_or_else(|| asset.to_checksum(None))
}

/// Chainlink aggregator for `asset`, if the table knows one.
pub fn default_aggregator(asset: Address) -> Option<Address> {
    PRICE_FEEDS_MAINNET
        .get(&asset)
        .and_then(|entry| entry.aggregator)
}
