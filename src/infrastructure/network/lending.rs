// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::asset_name;
use crate::common::error::AppError;
use crate::domain::position::{AccountPosition, Loan};
use crate::network::chain::ChainClient;
use alloy::primitives::{Address, U256};

/// Splits the user configuration bitmap into its single (collateral, debt) pair.
///
/// Bit `2i` marks reserve `i` as borrowed, bit `2i + 1` as used for collateral.
pub fn select_pair(reserves: &[Address], bitmap: U256) -> Result<(Address, Address), AppError> {
    let mut collateral = Vec::new();
    let mut debt = Vec::new();
    for (i, asset) in reserves.iter().enumerate().take(128) {
        if bitmap.bit(2 * i) {
            debt.push(*asset);
        }
        if bitmap.bit(2 * i + 1) {
            collateral.push(*asset);
        }
    }

    match (collateral.as_slice(), debt.as_slice()) {
        ([c], [d]) => Ok((*c, *d)),
        _ => Err(AppError::validation(
            "user",
            format!(
                "expected exactly one collateral and one debt reserve, found {} and {}",
                collateral.len(),
                debt.len()
            ),
        )),
    }
}

/// Loan identity and protocol liquidation threshold for `user`.
pub async fn load_loan(chain: &dyn ChainClient, user: Address) -> Result<Loan, AppError> {
    let (reserves, bitmap) =
        tokio::try_join!(chain.reserves_list(), chain.user_configuration(user))?;
    let (collateral, debt) = select_pair(&reserves, bitmap)?;
    let (collateral_info, debt_info) =
        tokio::try_join!(chain.reserve_data(collateral), chain.reserve_data(debt))?;

    Ok(Loan {
        user,
        collateral,
        collateral_name: asset_name(collateral),
        a_token: collateral_info.a_token,
        debt,
        debt_name: asset_name(debt),
        stable_debt_token: debt_info.stable_debt_token,
        variable_debt_token: debt_info.variable_debt_token,
        liquidation_threshold_bps: collateral_info.liquidation_threshold_bps(),
    })
}

/// Current amounts, prices and exact health ratio. Always read fresh.
pub async fn load_position(
    chain: &dyn ChainClient,
    user: Address,
) -> Result<AccountPosition, AppError> {
    let loan = load_loan(chain, user).await?;
    let (collateral_amount, stable_debt, variable_debt, collateral_price, debt_price) = tokio::try_join!(
        chain.balance_of(loan.a_token, user),
        chain.balance_of(loan.stable_debt_token, user),
        chain.balance_of(loan.variable_debt_token, user),
        chain.price_of(loan.collateral),
        chain.price_of(loan.debt),
    )?;
    let debt_amount = stable_debt
        .checked_add(variable_debt)
        .ok_or_else(|| AppError::validation("position", "debt balance overflow"))?;

    AccountPosition::new(
        loan,
        collateral_amount,
        debt_amount,
        collateral_price,
        debt_price,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::WETH_MAINNET;
    use crate::guardian::testing::{DAI, MockChain, eth};

    fn reserves() -> Vec<Address> {
        vec![
            Address::from([0xa0; 20]),
            WETH_MAINNET,
            Address::from([0xa2; 20]),
            DAI,
        ]
    }

    #[test]
    fn bitmap_picks_collateral_and_debt() {
        // WETH (index 1) as collateral -> bit 3, DAI (index 3) borrowed -> bit 6.
        let bitmap = (U256::from(1u64) << 3) | (U256::from(1u64) << 6);
        assert_eq!(select_pair(&reserves(), bitmap).unwrap(), (WETH_MAINNET, DAI));
    }

    #[test]
    fn bitmap_requires_single_pair() {
        let none = select_pair(&reserves(), U256::ZERO).unwrap_err();
        assert!(matches!(none, AppError::Validation { .. }));

        let two_collaterals =
            (U256::from(1u64) << 1) | (U256::from(1u64) << 3) | (U256::from(1u64) << 6);
        assert!(select_pair(&reserves(), two_collaterals).is_err());

        let collateral_only = U256::from(1u64) << 3;
        assert!(select_pair(&reserves(), collateral_only).is_err());
    }

    #[tokio::test]
    async fn position_sums_stable_and_variable_debt() {
        let user = Address::from([0x11; 20]);
        let chain = MockChain::new();
        chain.open_loan(user, eth(10), eth(6_000), eth(1) / U256::from(2_000u64));
        chain.set_stable_debt(user, eth(2_000));

        let position = load_position(&chain, user).await.unwrap();
        assert_eq!(position.loan.collateral, WETH_MAINNET);
        assert_eq!(position.loan.debt, DAI);
        assert_eq!(position.loan.collateral_name, "WETH9");
        assert_eq!(position.loan.debt_name, "Dai");
        assert_eq!(position.loan.liquidation_threshold_bps, 8_250);
        assert_eq!(position.collateral_amount, eth(10));
        assert_eq!(position.debt_amount, eth(8_000));
        // 8000 DAI at 0.0005 ETH against 10 ETH.
        assert_eq!(position.ratio.to_fixed(10), "0.4000000000");
    }
}
