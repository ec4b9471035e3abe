// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use alloy::primitives::{Bytes, U256};
use alloy::sol;
use alloy::sol_types::abi::TokenSeq;
use alloy::sol_types::{SolType, SolValue};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IWrappedNative {
        function deposit() external payable;
        function withdraw(uint256 amount) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IUniswapV2Router02 {
        function swapExactETHForTokens(uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external payable returns (uint256[] memory amounts);
        function swapExactTokensForETH(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IAsyncVault {
        function deposit(uint256 assets, address receiver) external payable returns (uint256 shares);
        function requestRedeem(uint256 shares, address controller, address owner) external returns (uint256 requestId);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IKintsuStaking {
        function stake() external payable returns (uint256);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface ILilChogstars {
        function mint(uint256 amount) external payable;
        function mintedCount(address user) external view returns (uint256);
    }
}

/// Calldata for contracts only known by selector: `selector ++ abi(args)`.
pub fn selector_call<T: SolValue>(selector: [u8; 4], args: T) -> Bytes
where
    for<'a> <T::SolType as SolType>::Token<'a>: TokenSeq<'a>,
{
    let encoded = args.abi_encode_params();
    let mut data = Vec::with_capacity(4 + encoded.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encoded);
    Bytes::from(data)
}

pub fn selector_only(selector: [u8; 4]) -> Bytes {
    Bytes::copy_from_slice(&selector)
}

/// Decode a single `uint256` return value.
pub fn decode_uint(data: &[u8]) -> Option<U256> {
    U256::abi_decode(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constants::{APRIORI_CLAIM_SELECTOR, MAGMA_UNSTAKE_SELECTOR};
    use alloy::primitives::Address;
    use alloy::sol_types::SolCall;

    #[test]
    fn selectors_match_deployed_contracts() {
        assert_eq!(IAsyncVault::depositCall::SELECTOR, [0x6e, 0x55, 0x3f, 0x65]);
        assert_eq!(
            IAsyncVault::requestRedeemCall::SELECTOR,
            [0x7d, 0x41, 0xc8, 0x6e]
        );
        assert_eq!(IWrappedNative::depositCall::SELECTOR, [0xd0, 0xe3, 0x0d, 0xb0]);
        assert_eq!(IERC20::approveCall::SELECTOR, [0x09, 0x5e, 0xa7, 0xb3]);
    }

    #[test]
    fn selector_call_appends_abi_words() {
        let data = selector_call(MAGMA_UNSTAKE_SELECTOR, (U256::from(5u64),));
        assert_eq!(data.len(), 36);
        assert_eq!(&data[..4], &MAGMA_UNSTAKE_SELECTOR);
        assert_eq!(data[35], 5);
    }

    #[test]
    fn claim_payload_encodes_dynamic_array() {
        let receiver = Address::repeat_byte(0x11);
        let data = selector_call(
            APRIORI_CLAIM_SELECTOR,
            (vec![U256::from(42u64)], receiver),
        );
        // head(offset, receiver) + tail(len, id)
        assert_eq!(data.len(), 4 + 32 * 4);
        assert_eq!(data[4 + 31], 0x40);
        assert_eq!(&data[4 + 44..4 + 64], receiver.as_slice());
        assert_eq!(data[4 + 95], 1);
        assert_eq!(data[4 + 127], 42);
    }

    #[test]
    fn decodes_uint_returns() {
        let word = U256::from(3u64).abi_encode();
        assert_eq!(decode_uint(&word), Some(U256::from(3u64)));
        assert_eq!(decode_uint(&[1, 2]), None);
    }
}
