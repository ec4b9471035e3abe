// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! Per-protocol parameterizations: action descriptors, token tables and step
//! lists. Everything else is shared execution machinery.

pub mod apriori;
pub mod deploy;
pub mod kintsu;
pub mod magma;
pub mod mint;
pub mod swap;
pub mod transfer;
pub mod wrap;

use crate::common::error::AppError;
use crate::common::pacing::Pacing;
use crate::network::provider::ChainClient;
use crate::services::execution::scheduler::WorkflowFactory;
use alloy::primitives::Bytes;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use transfer::{TransferMode, TransferPlan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Magma,
    Kintsu,
    Apriori,
    Wrap,
    Swap,
    Deploy,
    Mint,
    Transfer,
}

impl Protocol {
    pub const ALL: [Protocol; 8] = [
        Protocol::Magma,
        Protocol::Kintsu,
        Protocol::Apriori,
        Protocol::Wrap,
        Protocol::Swap,
        Protocol::Deploy,
        Protocol::Mint,
        Protocol::Transfer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Protocol::Magma => "magma",
            Protocol::Kintsu => "kintsu",
            Protocol::Apriori => "apriori",
            Protocol::Wrap => "wrap",
            Protocol::Swap => "swap",
            Protocol::Deploy => "deploy",
            Protocol::Mint => "mint",
            Protocol::Transfer => "transfer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Protocol::Magma => "Stake MON on Magma, then unstake gMON",
            Protocol::Kintsu => "Stake MON on Kintsu, then withdraw",
            Protocol::Apriori => "Stake on aPriori, request redeem, claim when mature",
            Protocol::Wrap => "Wrap MON to WMON and unwrap it again",
            Protocol::Swap => "Random swap between MON and a listed token",
            Protocol::Deploy => "Deploy a small contract",
            Protocol::Mint => "Mint a Lil Chogstars NFT",
            Protocol::Transfer => "Send MON to random or listed addresses",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Protocol {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Protocol::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| {
                AppError::validation(
                    "protocol",
                    format!(
                        "unknown protocol '{s}' (expected one of: {})",
                        Protocol::ALL.map(|p| p.name()).join(", ")
                    ),
                )
            })
    }
}

/// Knobs shared by the protocol workflows.
#[derive(Debug, Clone)]
pub struct ProtocolSettings {
    /// Wait between dependent steps (stake -> unstake).
    pub step_delay: Pacing,
    /// aPriori redeem-request maturation.
    pub claim_delay: Pacing,
    pub transfer_delay: Pacing,
    pub apriori_api_url: String,
    /// Init code for the deploy workflow; `None` uses the built-in contract.
    pub deploy_bytecode: Option<Bytes>,
}

/// Everything a factory may need at construction time.
pub struct ProtocolContext {
    pub settings: ProtocolSettings,
    pub client: Arc<dyn ChainClient>,
    pub transfer: Option<TransferPlan>,
}

pub fn workflow_factory(
    protocol: Protocol,
    ctx: &ProtocolContext,
) -> Result<Box<dyn WorkflowFactory>, AppError> {
    let s = &ctx.settings;
    let factory: Box<dyn WorkflowFactory> = match protocol {
        Protocol::Magma => Box::new(magma::Magma::new(s.step_delay)),
        Protocol::Kintsu => Box::new(kintsu::Kintsu::new(s.step_delay)),
        Protocol::Apriori => Box::new(apriori::Apriori::new(
            s.step_delay,
            s.claim_delay,
            &s.apriori_api_url,
        )?),
        Protocol::Wrap => Box::new(wrap::Wrap::new(s.step_delay)),
        Protocol::Swap => Box::new(swap::Swap::new(s.step_delay)),
        Protocol::Deploy => Box::new(deploy::Deploy::new(s.deploy_bytecode.clone())),
        Protocol::Mint => Box::new(mint::Mint::new(ctx.client.clone())),
        Protocol::Transfer => Box::new(transfer::Transfer::new(
            ctx.transfer.clone().unwrap_or_default(),
            s.transfer_delay,
        )),
    };
    Ok(factory)
}
