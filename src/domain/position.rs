// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::constants::BPS_DENOMINATOR;
use crate::domain::error::AppError;
use alloy::primitives::{Address, U256, U512, Uint};
use std::fmt;

/// Headroom for scaling a ratio by 10^places without overflow.
type Wide = Uint<640, 10>;

fn widen(value: U512) -> Wide {
    Wide::from(value)
}

/// Single collateral/debt pair of a borrower, as configured in the lending pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub user: Address,
    pub collateral: Address,
    pub collateral_name: String,
    pub a_token: Address,
    pub debt: Address,
    pub debt_name: String,
    pub stable_debt_token: Address,
    pub variable_debt_token: Address,
    /// Protocol liquidation threshold in basis points.
    pub liquidation_threshold_bps: u16,
}

impl Loan {
    /// Liquidation threshold as a four-place fraction, e.g. `0.8250`.
    pub fn liquidation_threshold_display(&self) -> String {
        format_bps(self.liquidation_threshold_bps)
    }
}

pub fn format_bps(bps: u16) -> String {
    let denom = BPS_DENOMINATOR as u16;
    format!("{}.{:04}", bps / denom, bps % denom)
}

/// Asset price in the base asset, with the feed's decimal scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFactor {
    pub price: U256,
    pub decimal_factor: U256,
}

impl PriceFactor {
    /// The base asset prices itself at 1 with no decimals.
    pub const BASE: Self = Self {
        price: U256::from_limbs([1, 0, 0, 0]),
        decimal_factor: U256::from_limbs([1, 0, 0, 0]),
    };

    pub fn from_decimals(price: U256, decimals: u8) -> Self {
        Self {
            price,
            decimal_factor: U256::from(10u64).pow(U256::from(decimals)),
        }
    }
}

/// Fresh snapshot of a loan; never reused across poll cycles.
#[derive(Debug, Clone)]
pub struct AccountPosition {
    pub loan: Loan,
    pub collateral_amount: U256,
    pub debt_amount: U256,
    pub collateral_price: PriceFactor,
    pub debt_price: PriceFactor,
    pub ratio: Ratio,
}

impl AccountPosition {
    pub fn new(
        loan: Loan,
        collateral_amount: U256,
        debt_amount: U256,
        collateral_price: PriceFactor,
        debt_price: PriceFactor,
    ) -> Result<Self, AppError> {
        let ratio = Ratio::health(collateral_amount, debt_amount, collateral_price, debt_price)?;
        Ok(Self {
            loan,
            collateral_amount,
            debt_amount,
            collateral_price,
            debt_price,
            ratio,
        })
    }
}

/// Exact debt-to-collateral value ratio.
///
/// A zero denominator with a positive numerator is an infinite ratio and
/// breaches every threshold. Zero over zero is normalized to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    numerator: U512,
    denominator: U512,
}

impl Ratio {
    pub fn new(numerator: U512, denominator: U512) -> Self {
        if numerator.is_zero() && denominator.is_zero() {
            return Self {
                numerator,
                denominator: U512::from(1u64),
            };
        }
        Self {
            numerator,
            denominator,
        }
    }

    /// `(D·pd·dc) / (C·pc·dd)` for collateral C priced by `(pc, dc)` and debt D priced by `(pd, dd)`.
    pub fn health(
        collateral: U256,
        debt: U256,
        collateral_price: PriceFactor,
        debt_price: PriceFactor,
    ) -> Result<Self, AppError> {
        let numerator = product(&[debt, debt_price.price, collateral_price.decimal_factor])?;
        let denominator = product(&[
            collateral,
            collateral_price.price,
            debt_price.decimal_factor,
        ])?;
        Ok(Self::new(numerator, denominator))
    }

    pub fn numerator(&self) -> U512 {
        self.numerator
    }

    pub fn denominator(&self) -> U512 {
        self.denominator
    }

    pub fn is_infinite(&self) -> bool {
        self.denominator.is_zero()
    }

    /// `ratio >= bps / 10000`, compared by cross-multiplication.
    pub fn meets_bps(&self, bps: u16) -> bool {
        if self.is_infinite() {
            return true;
        }
        let lhs = widen(self.numerator) * Wide::from(BPS_DENOMINATOR);
        let rhs = widen(self.denominator) * Wide::from(bps);
        lhs >= rhs
    }

    /// Ratio in basis points, rounded down. `None` when infinite.
    pub fn to_bps(&self) -> Option<U512> {
        if self.is_infinite() {
            return None;
        }
        let scaled = widen(self.numerator) * Wide::from(BPS_DENOMINATOR) / widen(self.denominator);
        U512::checked_from_uint(scaled)
    }

    /// Decimal rendering with `places` fractional digits, halves rounded up.
    pub fn to_fixed(&self, places: u32) -> String {
        if self.is_infinite() {
            return "inf".to_string();
        }
        let scale = Wide::from(10u64).pow(Wide::from(places));
        let den = widen(self.denominator);
        let scaled = widen(self.numerator) * scale;
        let mut quotient = scaled / den;
        let remainder = scaled % den;
        if remainder * Wide::from(2u64) >= den {
            quotient += Wide::from(1u64);
        }

        let digits = quotient.to_string();
        let places = places as usize;
        if places == 0 {
            return digits;
        }
        let padded = if digits.len() <= places {
            format!("{}{}", "0".repeat(places + 1 - digits.len()), digits)
        } else {
            digits
        };
        let split = padded.len() - places;
        format!("{}.{}", &padded[..split], &padded[split..])
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fixed(crate::domain::constants::RATIO_DISPLAY_PLACES))
    }
}

fn product(factors: &[U256]) -> Result<U512, AppError> {
    factors.iter().try_fold(U512::from(1u64), |acc, factor| {
        acc.checked_mul(U512::from(*factor)).ok_or_else(|| {
            AppError::validation("position", "amounts overflow ratio arithmetic")
        })
    })
}
