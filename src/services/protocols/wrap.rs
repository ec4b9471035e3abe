// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::Pacing;
use crate::common::units::AmountRange;
use crate::data::abi::IWrappedNative;
use crate::domain::constants::{STAKE_GAS_LIMIT, WMON};
use crate::services::account::AccountContext;
use crate::services::execution::builder::ActionDescriptor;
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{AmountSource, StepContext, Workflow, WorkflowStep};
use alloy::primitives::U256;
use alloy::sol_types::SolCall;

pub fn wrap(amount: U256) -> ActionDescriptor {
    ActionDescriptor::call(
        "wrap MON",
        WMON,
        IWrappedNative::depositCall {}.abi_encode().into(),
        STAKE_GAS_LIMIT,
    )
    .with_value(amount)
}

pub fn unwrap(amount: U256) -> ActionDescriptor {
    ActionDescriptor::call(
        "unwrap WMON",
        WMON,
        IWrappedNative::withdrawCall { amount }.abi_encode().into(),
        STAKE_GAS_LIMIT,
    )
}

pub struct Wrap {
    amount: AmountRange,
    settle: Pacing,
}

impl Wrap {
    pub fn new(settle: Pacing) -> Self {
        Self {
            amount: AmountRange::native(0.01, 0.05),
            settle,
        }
    }
}

impl WorkflowFactory for Wrap {
    fn name(&self) -> &str {
        "wrap"
    }

    fn build(&self, _account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        Ok(Workflow::new("wrap")
            .step(WorkflowStep::call(
                "wrap",
                AmountSource::Random(self.amount),
                |ctx: &StepContext<'_>| Ok(wrap(ctx.amount)),
            ))
            .step(WorkflowStep::wait("unwrap delay", self.settle))
            .step(WorkflowStep::call(
                "unwrap",
                AmountSource::FromStep("wrap".into()),
                |ctx: &StepContext<'_>| Ok(unwrap(ctx.amount)),
            )))
    }
}
