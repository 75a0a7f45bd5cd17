// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use alloy::sol;

sol! {
    // Aave v2 DataTypes
    #[derive(Debug, PartialEq, Eq)]
    struct ReserveConfigurationMap {
        uint256 data;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct UserConfigurationMap {
        uint256 data;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct ReserveData {
        ReserveConfigurationMap configuration;
        uint128 liquidityIndex;
        uint128 variableBorrowIndex;
        uint128 currentLiquidityRate;
        uint128 currentVariableBorrowRate;
        uint128 currentStableBorrowRate;
        uint40 lastUpdateTimestamp;
        address aTokenAddress;
        address stableDebtTokenAddress;
        address variableDebtTokenAddress;
        address interestRateStrategyAddress;
        uint8 id;
    }

    #[sol(rpc)]
    interface ILendingPool {
        function getReservesList() external view returns (address[] memory);
        function getUserConfiguration(address user) external view returns (UserConfigurationMap memory);
        function getReserveData(address asset) external view returns (ReserveData memory);
    }

    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }

    #[sol(rpc)]
    interface IAggregatorV3 {
        function decimals() external view returns (uint8);
        function latestRoundData() external view returns (uint80 roundId, int256 answer, uint256 startedAt, uint256 updatedAt, uint80 answeredInRound);
    }
}
