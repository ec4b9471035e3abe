// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::network::provider::ChainClient;
use std::fmt;
use std::sync::Arc;

const GWEI: u128 = 1_000_000_000;

/// Which fee fields an action wants on its transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeModel {
    /// Single `gasPrice` field.
    Legacy,
    /// Base + priority pair; falls back to legacy when the chain has no base fee.
    Eip1559,
    /// EIP-1559 when the latest block carries a base fee.
    #[default]
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasParams {
    Legacy {
        gas_price: u128,
    },
    Eip1559 {
        max_fee_per_gas: u128,
        max_priority_fee_per_gas: u128,
    },
}

impl GasParams {
    /// Highest price per gas the transaction may pay.
    pub fn fee_cap(&self) -> u128 {
        match *self {
            GasParams::Legacy { gas_price } => gas_price,
            GasParams::Eip1559 {
                max_fee_per_gas, ..
            } => max_fee_per_gas,
        }
    }
}

impl fmt::Display for GasParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GasParams::Legacy { gas_price } => {
                write!(f, "legacy {:.2} gwei", gas_price as f64 / GWEI as f64)
            }
            GasParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => write!(
                f,
                "max {:.2} / tip {:.2} gwei",
                max_fee_per_gas as f64 / GWEI as f64,
                max_priority_fee_per_gas as f64 / GWEI as f64
            ),
        }
    }
}

/// Gas pricing provider. Every call hits the network; callers own retries.
#[derive(Clone)]
pub struct GasOracle {
    client: Arc<dyn ChainClient>,
    priority_fee_floor: u128,
}

impl GasOracle {
    pub fn new(client: Arc<dyn ChainClient>, priority_fee_floor_gwei: u64) -> Self {
        Self {
            client,
            priority_fee_floor: u128::from(priority_fee_floor_gwei) * GWEI,
        }
    }

    pub async fn get_gas_parameters(&self, model: FeeModel) -> Result<GasParams, AppError> {
        if model == FeeModel::Legacy {
            return self.legacy().await;
        }

        let Some(base) = self.client.latest_base_fee().await? else {
            if model == FeeModel::Eip1559 {
                tracing::debug!(target: "gas", "Latest block has no base fee; using legacy pricing");
            }
            return self.legacy().await;
        };

        // Tip suggestion is optional on some RPCs; the floor covers them.
        let suggested = match self.client.max_priority_fee().await {
            Ok(tip) => tip,
            Err(e) => {
                tracing::debug!(target: "gas", error = %e, "Priority fee unavailable; using floor");
                0
            }
        };
        let priority = suggested.max(self.priority_fee_floor);
        // 12.5% headroom covers one full block of base fee growth.
        let next_base = base.saturating_mul(1125) / 1000;

        Ok(GasParams::Eip1559 {
            max_fee_per_gas: next_base.saturating_add(priority),
            max_priority_fee_per_gas: priority,
        })
    }

    async fn legacy(&self) -> Result<GasParams, AppError> {
        let gas_price = self.client.gas_price().await?;
        Ok(GasParams::Legacy { gas_price })
    }
}
