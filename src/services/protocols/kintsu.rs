// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::Pacing;
use crate::common::units::AmountRange;
use crate::data::abi::{IKintsuStaking, selector_call};
use crate::domain::constants::{KINTSU_STAKING, KINTSU_WITHDRAW_SELECTOR, STAKE_GAS_LIMIT};
use crate::services::account::AccountContext;
use crate::services::execution::builder::ActionDescriptor;
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{AmountSource, StepContext, Workflow, WorkflowStep};
use alloy::primitives::U256;
use alloy::sol_types::SolCall;

pub fn stake(amount: U256) -> ActionDescriptor {
    ActionDescriptor::call(
        "kintsu stake",
        KINTSU_STAKING,
        IKintsuStaking::stakeCall {}.abi_encode().into(),
        STAKE_GAS_LIMIT,
    )
    .with_value(amount)
}

pub fn withdraw(amount: U256) -> ActionDescriptor {
    ActionDescriptor::call(
        "kintsu withdraw",
        KINTSU_STAKING,
        selector_call(KINTSU_WITHDRAW_SELECTOR, (amount,)),
        STAKE_GAS_LIMIT,
    )
}

pub struct Kintsu {
    amount: AmountRange,
    settle: Pacing,
}

impl Kintsu {
    pub fn new(settle: Pacing) -> Self {
        Self {
            amount: AmountRange::native(0.01, 0.05),
            settle,
        }
    }
}

impl WorkflowFactory for Kintsu {
    fn name(&self) -> &str {
        "kintsu"
    }

    fn build(&self, _account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        Ok(Workflow::new("kintsu")
            .step(WorkflowStep::call(
                "stake",
                AmountSource::Random(self.amount),
                |ctx: &StepContext<'_>| Ok(stake(ctx.amount)),
            ))
            .step(WorkflowStep::wait("withdraw delay", self.settle))
            .step(WorkflowStep::call(
                "withdraw",
                AmountSource::FromStep("stake".into()),
                |ctx: &StepContext<'_>| Ok(withdraw(ctx.amount)),
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_uses_payable_stake_selector() {
        let d = stake(U256::from(1u64));
        assert_eq!(d.input.as_ref(), &[0x3a, 0x4b, 0x66, 0xf1]);
        assert_eq!(d.value, U256::from(1u64));
        assert_eq!(&withdraw(U256::from(1u64)).input[..4], &KINTSU_WITHDRAW_SELECTOR);
    }
}
