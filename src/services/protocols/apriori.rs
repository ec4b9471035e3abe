// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::pacing::Pacing;
use crate::common::retry::retry_async;
use crate::common::units::AmountRange;
use crate::data::abi::{IAsyncVault, selector_call};
use crate::domain::constants::{
    APRIORI_CLAIM_SELECTOR, APRIORI_STAKING, STAKE_GAS_LIMIT, UNSTAKE_GAS_LIMIT,
};
use crate::services::account::AccountContext;
use crate::services::execution::builder::ActionDescriptor;
use crate::services::execution::scheduler::WorkflowFactory;
use crate::services::execution::sequencer::{
    AmountSource, Prepared, StepAction, StepContext, Workflow, WorkflowStep,
};
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub fn deposit(amount: U256, receiver: Address) -> ActionDescriptor {
    ActionDescriptor::call(
        "apriori stake",
        APRIORI_STAKING,
        IAsyncVault::depositCall {
            assets: amount,
            receiver,
        }
        .abi_encode()
        .into(),
        STAKE_GAS_LIMIT,
    )
    .with_value(amount)
}

pub fn request_redeem(shares: U256, owner: Address) -> ActionDescriptor {
    ActionDescriptor::call(
        "apriori request unstake",
        APRIORI_STAKING,
        IAsyncVault::requestRedeemCall {
            shares,
            controller: owner,
            owner,
        }
        .abi_encode()
        .into(),
        UNSTAKE_GAS_LIMIT,
    )
}

pub fn claim(request_id: u64, receiver: Address) -> ActionDescriptor {
    ActionDescriptor::call(
        "apriori claim",
        APRIORI_STAKING,
        selector_call(
            APRIORI_CLAIM_SELECTOR,
            (vec![U256::from(request_id)], receiver),
        ),
        UNSTAKE_GAS_LIMIT,
    )
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalRequest {
    pub id: u64,
    #[serde(default)]
    pub claimed: bool,
    #[serde(default)]
    pub is_claimable: bool,
}

pub fn first_claimable(requests: &[WithdrawalRequest]) -> Option<u64> {
    requests
        .iter()
        .find(|r| !r.claimed && r.is_claimable)
        .map(|r| r.id)
}

/// Withdrawal-request backend. The contract exposes no enumeration of an
/// owner's requests, so the id comes from here.
#[derive(Clone)]
pub struct WithdrawalApi {
    client: Client,
    url: String,
}

impl WithdrawalApi {
    pub fn new(url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn claimable_request(&self, owner: Address) -> Result<Option<u64>, AppError> {
        let client = self.client.clone();
        let url = self.url.clone();
        let requests: Vec<WithdrawalRequest> = retry_async(
            move |_| {
                let client = client.clone();
                let url = url.clone();
                async move {
                    client
                        .get(&url)
                        .query(&[("address", format!("{owner:#x}"))])
                        .send()
                        .await?
                        .error_for_status()?
                        .json::<Vec<WithdrawalRequest>>()
                        .await
                }
            },
            3,
            Duration::from_secs(2),
        )
        .await
        .map_err(|e| AppError::NetworkUnavailable(format!("withdrawal lookup failed: {e}")))?;
        Ok(first_claimable(&requests))
    }
}

struct ClaimMatured {
    api: WithdrawalApi,
}

#[async_trait]
impl StepAction for ClaimMatured {
    async fn prepare(&self, ctx: &StepContext<'_>) -> Result<Prepared, AppError> {
        match self.api.claimable_request(ctx.address()).await {
            Ok(Some(id)) => {
                tracing::info!(target: "workflow", request_id = id, "Found claimable request");
                Ok(Prepared::Submit(claim(id, ctx.address())))
            }
            Ok(None) => Ok(Prepared::Skip("no claimable requests".into())),
            Err(e) => {
                tracing::warn!(target: "workflow", error = %e, "Claim check failed");
                Ok(Prepared::Skip(format!("claim check failed: {e}")))
            }
        }
    }
}

pub struct Apriori {
    amount: AmountRange,
    settle: Pacing,
    maturation: Pacing,
    api: WithdrawalApi,
}

impl Apriori {
    pub fn new(settle: Pacing, maturation: Pacing, api_url: &str) -> Result<Self, AppError> {
        Ok(Self {
            amount: AmountRange::native(0.01, 0.05),
            settle,
            maturation,
            api: WithdrawalApi::new(api_url)?,
        })
    }
}

impl WorkflowFactory for Apriori {
    fn name(&self) -> &str {
        "apriori"
    }

    fn build(&self, _account: &AccountContext, _cycle: u32) -> Result<Workflow, AppError> {
        Ok(Workflow::new("apriori")
            .step(WorkflowStep::call(
                "stake",
                AmountSource::Random(self.amount),
                |ctx: &StepContext<'_>| Ok(deposit(ctx.amount, ctx.address())),
            ))
            .step(WorkflowStep::wait("unstake delay", self.settle))
            .step(WorkflowStep::call(
                "request unstake",
                AmountSource::FromStep("stake".into()),
                |ctx: &StepContext<'_>| Ok(request_redeem(ctx.amount, ctx.address())),
            ))
            .step(WorkflowStep::wait("claim maturation", self.maturation))
            .step(WorkflowStep::submit(
                "claim",
                AmountSource::None,
                ClaimMatured {
                    api: self.api.clone(),
                },
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_first_unclaimed_claimable_request() {
        let body = r#"[
            {"id": 3, "claimed": true, "is_claimable": true},
            {"id": 5, "claimed": false, "is_claimable": false},
            {"id": 8, "claimed": false, "is_claimable": true, "assets": "100"}
        ]"#;
        let requests: Vec<WithdrawalRequest> = serde_json::from_str(body).unwrap();
        assert_eq!(first_claimable(&requests), Some(8));
        assert_eq!(first_claimable(&requests[..2]), None);
    }

    #[test]
    fn stake_and_redeem_target_the_vault() {
        let me = Address::repeat_byte(0x42);
        let amount = U256::from(7u64);
        let d = deposit(amount, me);
        assert_eq!(&d.input[..4], &IAsyncVault::depositCall::SELECTOR);
        assert_eq!(d.value, amount);

        let r = request_redeem(amount, me);
        let decoded = IAsyncVault::requestRedeemCall::abi_decode(&r.input).unwrap();
        assert_eq!(decoded.shares, amount);
        assert_eq!(decoded.owner, me);

        let c = claim(9, me);
        assert_eq!(&c.input[..4], &APRIORI_CLAIM_SELECTOR);
    }
}
