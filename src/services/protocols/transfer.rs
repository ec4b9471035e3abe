// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::Pacing;
use crate::common::parsing::short_address;
use crate::domain::constants::TRANSFER_GAS_LIMIT;
use crate::network::gas::FeeModel;
use crate::services::account::AccountContext;
use crate::services::execution::builder::ActionDescriptor;
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{AmountSource, StepContext, Workflow, WorkflowStep};
use alloy::primitives::{Address, Bytes, U256};
use rand::Rng;

/// 0.000001 MON.
pub const DEFAULT_TRANSFER_AMOUNT: U256 = U256::from_limbs([1_000_000_000_000, 0, 0, 0]);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// One fresh random address per cycle.
    #[default]
    Random,
    /// One transfer per listed address, in order.
    List(Vec<Address>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub amount: U256,
    pub mode: TransferMode,
}

impl Default for TransferPlan {
    fn default() -> Self {
        Self {
            amount: DEFAULT_TRANSFER_AMOUNT,
            mode: TransferMode::Random,
        }
    }
}

pub fn transfer(to: Address) -> ActionDescriptor {
    ActionDescriptor::call(
        format!("transfer to {}", short_address(&to)),
        to,
        Bytes::new(),
        TRANSFER_GAS_LIMIT,
    )
    .with_fee_model(FeeModel::Eip1559)
}

pub fn random_recipient() -> Address {
    Address::from(rand::rng().random::<[u8; 20]>())
}

/// One transfer per cycle. List mode walks the recipients in order, so each
/// listed address is its own cycle and a failed transfer skips only that one.
pub struct Transfer {
    plan: TransferPlan,
    between: Pacing,
}

impl Transfer {
    pub fn new(plan: TransferPlan, between: Pacing) -> Self {
        Self { plan, between }
    }

    fn recipient(&self, cycle: u32) -> Result<Address, AppError> {
        match &self.plan.mode {
            TransferMode::Random => Ok(random_recipient()),
            TransferMode::List(list) if list.is_empty() => {
                Err(AppError::validation("recipients", "no transfer recipients"))
            }
            TransferMode::List(list) => {
                let slot = cycle.saturating_sub(1) as usize % list.len();
                Ok(list[slot])
            }
        }
    }
}

impl WorkflowFactory for Transfer {
    fn name(&self) -> &str {
        "transfer"
    }

    fn build(&self, _account: &AccountContext, cycle: u32) -> Result<Workflow, AppError> {
        if self.plan.amount.is_zero() {
            return Err(AppError::validation("amount", "transfer amount must be positive"));
        }
        let to = self.recipient(cycle)?;
        Ok(Workflow::new("transfer").step(WorkflowStep::call(
            "transfer",
            AmountSource::Fixed(self.plan.amount),
            move |ctx: &StepContext<'_>| Ok(transfer(to).with_value(ctx.amount)),
        )))
    }

    /// List mode runs one cycle per recipient for every requested pass.
    fn cycles(&self, requested: u32) -> u32 {
        match &self.plan.mode {
            TransferMode::List(list) if !list.is_empty() => {
                let len = u32::try_from(list.len()).unwrap_or(u32::MAX);
                requested.saturating_mul(len)
            }
            _ => requested,
        }
    }

    fn cycle_pacing(&self) -> Option<Pacing> {
        Some(self.between)
    }
}
