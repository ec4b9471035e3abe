// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::Pacing;
use crate::common::units::AmountRange;
use crate::data::abi::{IERC20, IUniswapV2Router02};
use crate::domain::constants::{
    APPROVE_GAS_LIMIT, SWAP_DEADLINE_SECS, SWAP_GAS_LIMIT, SWAP_TOKENS, TokenInfo, V2_ROUTER, WMON,
};
use crate::services::account::AccountContext;
use crate::services::execution::builder::ActionDescriptor;
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{AmountSource, StepContext, Workflow, WorkflowStep};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::time::{SystemTime, UNIX_EPOCH};

fn deadline() -> U256 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    U256::from(now + SWAP_DEADLINE_SECS)
}

/// Native in, token out. Slippage is not bounded (`amountOutMin = 0`).
pub fn native_for_token(amount: U256, token: &TokenInfo, to: Address) -> ActionDescriptor {
    let call = IUniswapV2Router02::swapExactETHForTokensCall {
        amountOutMin: U256::ZERO,
        path: vec![WMON, token.address],
        to,
        deadline: deadline(),
    };
    ActionDescriptor::call(
        format!("swap MON -> {}", token.symbol),
        V2_ROUTER,
        call.abi_encode().into(),
        SWAP_GAS_LIMIT,
    )
    .with_value(amount)
}

pub fn approve_router(amount: U256, token: &TokenInfo) -> ActionDescriptor {
    let call = IERC20::approveCall {
        spender: V2_ROUTER,
        amount,
    };
    ActionDescriptor::call(
        format!("approve {}", token.symbol),
        token.address,
        call.abi_encode().into(),
        APPROVE_GAS_LIMIT,
    )
}

pub fn token_for_native(amount: U256, token: &TokenInfo, to: Address) -> ActionDescriptor {
    let call = IUniswapV2Router02::swapExactTokensForETHCall {
        amountIn: amount,
        amountOutMin: U256::ZERO,
        path: vec![token.address, WMON],
        to,
        deadline: deadline(),
    };
    ActionDescriptor::call(
        format!("swap {} -> MON", token.symbol),
        V2_ROUTER,
        call.abi_encode().into(),
        SWAP_GAS_LIMIT,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    NativeToToken,
    TokenToNative,
}

pub struct Swap {
    tokens: &'static [TokenInfo],
    native_amount: AmountRange,
    settle: Pacing,
}

impl Swap {
    pub fn new(settle: Pacing) -> Self {
        Self {
            tokens: &SWAP_TOKENS,
            native_amount: AmountRange::native(0.001, 0.01),
            settle,
        }
    }

    /// Fixed direction and token; `build` picks both at random.
    pub fn workflow(&self, direction: Direction, token: TokenInfo) -> Workflow {
        match direction {
            Direction::NativeToToken => Workflow::new(format!("swap MON -> {}", token.symbol)).step(
                WorkflowStep::call(
                    "swap",
                    AmountSource::Random(self.native_amount),
                    move |ctx: &StepContext<'_>| Ok(native_for_token(ctx.amount, &token, ctx.address())),
                ),
            ),
            Direction::TokenToNative => {
                let range = AmountRange {
                    min: token.min_amount,
                    max: token.max_amount,
                    precision: 4,
                    decimals: token.decimals,
                };
                Workflow::new(format!("swap {} -> MON", token.symbol))
                    .step(WorkflowStep::call(
                        "approve",
                        AmountSource::Random(range),
                        move |ctx: &StepContext<'_>| Ok(approve_router(ctx.amount, &token)),
                    ))
                    .step(WorkflowStep::wait("approval settle", self.settle))
                    .step(WorkflowStep::call(
                        "swap",
                        AmountSource::FromStep("approve".into()),
                        move |ctx: &StepContext<'_>| {
                            Ok(token_for_native(ctx.amount, &token, ctx.address()))
                        },
                    ))
            }
        }
    }
}

impl WorkflowFactory for Swap {
    fn name(&self) -> &str {
        "swap"
    }

    fn build(&self, _account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        let mut rng = rand::rng();
        let token = *self
            .tokens
            .choose(&mut rng)
            .ok_or_else(|| AppError::Config("swap token table is empty".into()))?;
        let direction = if rng.random_bool(0.5) {
            Direction::NativeToToken
        } else {
            Direction::TokenToNative
        };
        Ok(self.workflow(direction, token))
    }
}
