// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::data::abi::{ILilChogstars, decode_uint};
use crate::domain::constants::{LIL_CHOGSTARS_NFT, MINT_GAS_LIMIT};
use crate::network::gas::FeeModel;
use crate::network::provider::{CallRequest, ChainClient};
use crate::services::account::AccountContext;
use crate::services::execution::builder::{ActionDescriptor, GasLimit};
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{
    AmountSource, Prepared, StepAction, StepContext, Workflow, WorkflowStep,
};
use alloy::primitives::{Address, TxKind, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;

pub fn mint_one() -> ActionDescriptor {
    ActionDescriptor::call(
        "mint Lil Chogstars",
        LIL_CHOGSTARS_NFT,
        ILilChogstars::mintCall {
            amount: U256::from(1u64),
        }
        .abi_encode()
        .into(),
        MINT_GAS_LIMIT,
    )
    .with_gas(GasLimit::Estimate {
        buffer_bps: 2_000,
        fallback: MINT_GAS_LIMIT,
    })
    .with_fee_model(FeeModel::Eip1559)
}

/// Reads how many tokens `owner` already minted. Unreadable counts as zero.
pub async fn minted_count(client: &dyn ChainClient, owner: Address) -> U256 {
    let request = CallRequest {
        from: owner,
        to: TxKind::Call(LIL_CHOGSTARS_NFT),
        value: U256::ZERO,
        input: ILilChogstars::mintedCountCall { user: owner }
            .abi_encode()
            .into(),
    };
    match client.call(&request).await {
        Ok(data) => decode_uint(&data).unwrap_or_default(),
        Err(e) => {
            tracing::warn!(target: "workflow", error = %e, "mintedCount lookup failed; assuming 0");
            U256::ZERO
        }
    }
}

/// Mints while the account holds fewer than a per-cycle random target.
struct MintBelowTarget {
    client: Arc<dyn ChainClient>,
    max_target: u64,
}

#[async_trait]
impl StepAction for MintBelowTarget {
    async fn prepare(&self, ctx: &StepContext<'_>) -> Result<Prepared, AppError> {
        let target = U256::from(rand::rng().random_range(1..=self.max_target.max(1)));
        let minted = minted_count(self.client.as_ref(), ctx.address()).await;
        if minted >= target {
            return Ok(Prepared::Skip(format!(
                "already minted {minted} (target {target})"
            )));
        }
        tracing::info!(target: "workflow", %minted, %target, "Minting");
        Ok(Prepared::Submit(mint_one()))
    }
}

pub struct Mint {
    client: Arc<dyn ChainClient>,
    max_target: u64,
}

impl Mint {
    pub fn new(client: Arc<dyn ChainClient>) -> Self {
        Self {
            client,
            max_target: 3,
        }
    }
}

impl WorkflowFactory for Mint {
    fn name(&self) -> &str {
        "mint"
    }

    fn build(&self, _account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        Ok(Workflow::new("mint").step(WorkflowStep::submit(
            "mint",
            AmountSource::None,
            MintBelowTarget {
                client: self.client.clone(),
                max_target: self.max_target,
            },
        )))
    }
}
