// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::Pacing;
use crate::common::units::AmountRange;
use crate::data::abi::{selector_call, selector_only};
use crate::domain::constants::{
    MAGMA_STAKE_SELECTOR, MAGMA_STAKING, MAGMA_UNSTAKE_SELECTOR, STAKE_GAS_LIMIT,
    UNSTAKE_GAS_LIMIT,
};
use crate::services::account::AccountContext;
use crate::services::execution::builder::ActionDescriptor;
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{AmountSource, StepContext, Workflow, WorkflowStep};
use alloy::primitives::U256;

pub fn stake(amount: U256) -> ActionDescriptor {
    ActionDescriptor::call(
        "magma stake",
        MAGMA_STAKING,
        selector_only(MAGMA_STAKE_SELECTOR),
        STAKE_GAS_LIMIT,
    )
    .with_value(amount)
}

/// Unstakes the gMON minted by [`stake`]; the amount must match exactly.
pub fn unstake(amount: U256) -> ActionDescriptor {
    ActionDescriptor::call(
        "magma unstake",
        MAGMA_STAKING,
        selector_call(MAGMA_UNSTAKE_SELECTOR, (amount,)),
        UNSTAKE_GAS_LIMIT,
    )
}

pub struct Magma {
    amount: AmountRange,
    settle: Pacing,
}

impl Magma {
    pub fn new(settle: Pacing) -> Self {
        Self {
            amount: AmountRange::native(0.01, 0.05),
            settle,
        }
    }
}

impl WorkflowFactory for Magma {
    fn name(&self) -> &str {
        "magma"
    }

    fn build(&self, _account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        Ok(Workflow::new("magma")
            .step(WorkflowStep::call(
                "stake",
                AmountSource::Random(self.amount),
                |ctx: &StepContext<'_>| Ok(stake(ctx.amount)),
            ))
            .step(WorkflowStep::wait("unstake delay", self.settle))
            .step(WorkflowStep::call(
                "unstake",
                AmountSource::FromStep("stake".into()),
                |ctx: &StepContext<'_>| Ok(unstake(ctx.amount)),
            )))
    }
}
