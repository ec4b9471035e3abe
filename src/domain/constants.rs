// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use alloy::primitives::{Address, address};

// =============================================================================
// NETWORK CONSTANTS
// =============================================================================

pub const CHAIN_MONAD_TESTNET: u64 = 10143;
pub const DEFAULT_RPC_URL: &str = "https://testnet-rpc.monad.xyz/";
pub const DEFAULT_EXPLORER_URL: &str = "https://testnet.monadexplorer.com/tx/";

pub const NATIVE_SYMBOL: &str = "MON";
pub const NATIVE_DECIMALS: u8 = 18;

// =============================================================================
// GAS & TRANSACTION CONSTANTS
// =============================================================================

pub const TRANSFER_GAS_LIMIT: u64 = 21_000;
pub const APPROVE_GAS_LIMIT: u64 = 100_000;
pub const SWAP_GAS_LIMIT: u64 = 300_000;
pub const STAKE_GAS_LIMIT: u64 = 500_000;
pub const UNSTAKE_GAS_LIMIT: u64 = 800_000;
pub const DEPLOY_GAS_LIMIT: u64 = 2_000_000;
pub const MINT_GAS_LIMIT: u64 = 250_000;
pub const DEFAULT_PRIORITY_FEE_GWEI: u64 = 2;
pub const SWAP_DEADLINE_SECS: u64 = 600;

// =============================================================================
// CONTRACTS
// =============================================================================

pub const WMON: Address = address!("760AfE86e5de5fa0Ee542fc7B7B713e1c5425701");
pub const MAGMA_STAKING: Address = address!("2c9C959516e9AAEdB2C748224a41249202ca8BE7");
pub const KINTSU_STAKING: Address = address!("07AabD925866E8353407E67C1D157836f7Ad923e");
pub const APRIORI_STAKING: Address = address!("b2f82D0f38dc453D596Ad40A37799446Cc89274A");
pub const V2_ROUTER: Address = address!("Ca810D095e90Daae6e867c19DF6D9A8C56db2c89");
pub const LIL_CHOGSTARS_NFT: Address = address!("b33D7138c53e516871977094B249C8f2ab89a4F4");

pub const APRIORI_API_URL: &str =
    "https://liquid-staking-backend-prod-b332fbe9ccfe.herokuapp.com/withdrawal_requests";

// Selectors for contracts without a published ABI.
pub const MAGMA_STAKE_SELECTOR: [u8; 4] = [0xd5, 0x57, 0x59, 0x82];
pub const MAGMA_UNSTAKE_SELECTOR: [u8; 4] = [0x6f, 0xed, 0x1e, 0xa7];
pub const KINTSU_WITHDRAW_SELECTOR: [u8; 4] = [0x30, 0xaf, 0x6b, 0x2e];
pub const APRIORI_CLAIM_SELECTOR: [u8; 4] = [0x49, 0x2e, 0x47, 0xd2];

// =============================================================================
// TOKENS
// =============================================================================

/// Swap-side token metadata: decimals drive amount conversion, the range bounds
/// the randomly sampled trade size in whole units.
#[derive(Debug, Clone, Copy)]
pub struct TokenInfo {
    pub symbol: &'static str,
    pub address: Address,
    pub decimals: u8,
    pub min_amount: f64,
    pub max_amount: f64,
}

pub const SWAP_TOKENS: [TokenInfo; 4] = [
    TokenInfo {
        symbol: "USDC",
        address: address!("62534E4bBD6D9ebAC0ac99aeaa0aa48E56372df0"),
        decimals: 6,
        min_amount: 0.01,
        max_amount: 1.0,
    },
    TokenInfo {
        symbol: "USDT",
        address: address!("88b8e2161dedc77ef4ab7585569d2415a1c1055d"),
        decimals: 6,
        min_amount: 0.01,
        max_amount: 1.0,
    },
    TokenInfo {
        symbol: "BEAN",
        address: address!("268E4E24E0051EC27b3D27A95977E71cE6875a05"),
        decimals: 6,
        min_amount: 0.01,
        max_amount: 1.0,
    },
    TokenInfo {
        symbol: "JAI",
        address: address!("70F893f65E3C1d7f82aad72f71615eb220b74D10"),
        decimals: 6,
        min_amount: 0.01,
        max_amount: 1.0,
    },
];
