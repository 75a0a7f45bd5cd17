// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ILiquidationGuardian {
        /// `signature` is the borrower's delegation certificate signature,
        /// `params` the ABI-encoded `RepaymentParams` tuple and
        /// `swapCalldata` the aggregator payload converting collateral to debt.
        function execute(
            address user,
            bytes calldata signature,
            bytes calldata params,
            bytes calldata swapCalldata
        ) external;

        error InvalidSignature();
        error SwapFailed(bytes reason);
        error InsufficientRepayment(uint256 required, uint256 received);
    }

    // Matches abi.decode(params, (address, address, address, address, address, uint256)) in execute
    #[derive(Debug, PartialEq, Eq)]
    struct RepaymentParams {
        address collateral;
        address collateralAToken;
        address debt;
        address stableDebtToken;
        address variableDebtToken;
        uint256 collateralAmount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use alloy_sol_types::{SolCall, SolValue};

    fn sample_params() -> RepaymentParams {
        RepaymentParams {
            collateral: Address::from([1u8; 20]),
            collateralAToken: Address::from([2u8; 20]),
            debt: Address::from([3u8; 20]),
            stableDebtToken: Address::from([4u8; 20]),
            variableDebtToken: Address::from([5u8; 20]),
            collateralAmount: U256::from(10u64).pow(U256::from(18u64)),
        }
    }

    #[test]
    fn repayment_params_use_flat_tuple_encoding() {
        let params = sample_params();
        let flat = (
            params.collateral,
            params.collateralAToken,
            params.debt,
            params.stableDebtToken,
            params.variableDebtToken,
            params.collateralAmount,
        )
            .abi_encode_params();

        let encoded = params.abi_encode_params();
        assert_eq!(encoded, flat);
        // Static tuple: six words, no offset header.
        assert_eq!(encoded.len(), 6 * 32);

        let decoded =
            <RepaymentParams as SolValue>::abi_decode_params(&encoded).expect("decode params");
        assert_eq!(decoded, params);
    }

    #[test]
    fn execute_selector_is_stable() {
        let call = ILiquidationGuardian::executeCall {
            user: Address::from([9u8; 20]),
            signature: vec![0x1b; 65].into(),
            params: sample_params().abi_encode_params().into(),
            swapCalldata: vec![0xca, 0xfe].into(),
        };
        let encoded = call.abi_encode();
        assert_eq!(hex::encode(&encoded[..4]), "52d61419");

        let decoded =
            ILiquidationGuardian::executeCall::abi_decode(&encoded).expect("decode execute");
        assert_eq!(decoded.user, call.user);
        assert_eq!(decoded.signature, call.signature);
        assert_eq!(decoded.swapCalldata, call.swapCalldata);
    }
}
