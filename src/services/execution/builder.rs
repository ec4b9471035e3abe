// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::units::wei_to_native;
use crate::domain::constants::NATIVE_SYMBOL;
use crate::network::gas::{FeeModel, GasOracle, GasParams};
use crate::network::nonce::NonceReader;
use crate::network::provider::{CallRequest, ChainClient};
use alloy::primitives::{Address, Bytes, TxKind, U256};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasLimit {
    Fixed(u64),
    /// `eth_estimateGas` plus `buffer_bps` basis points; `fallback` when the
    /// node cannot estimate.
    Estimate { buffer_bps: u64, fallback: u64 },
}

/// What one on-chain action sends, minus anything read from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub label: String,
    pub target: TxKind,
    pub value: U256,
    pub input: Bytes,
    pub gas: GasLimit,
    pub fee_model: FeeModel,
}

impl ActionDescriptor {
    pub fn call(label: impl Into<String>, to: Address, input: Bytes, gas_limit: u64) -> Self {
        Self {
            label: label.into(),
            target: TxKind::Call(to),
            value: U256::ZERO,
            input,
            gas: GasLimit::Fixed(gas_limit),
            fee_model: FeeModel::Legacy,
        }
    }

    pub fn create(label: impl Into<String>, init_code: Bytes, gas: GasLimit) -> Self {
        Self {
            label: label.into(),
            target: TxKind::Create,
            value: U256::ZERO,
            input: init_code,
            gas,
            fee_model: FeeModel::Legacy,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_gas(mut self, gas: GasLimit) -> Self {
        self.gas = gas;
        self
    }

    pub fn with_fee_model(mut self, model: FeeModel) -> Self {
        self.fee_model = model;
        self
    }
}

/// Unsigned transaction with every field resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRequest {
    pub from: Address,
    pub target: TxKind,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub gas: GasParams,
    pub nonce: u64,
    pub chain_id: u64,
}

pub struct TransactionBuilder {
    client: Arc<dyn ChainClient>,
    nonces: NonceReader,
    gas: GasOracle,
    chain_id: u64,
}

impl TransactionBuilder {
    pub fn new(client: Arc<dyn ChainClient>, gas: GasOracle, chain_id: u64) -> Self {
        Self {
            nonces: NonceReader::new(client.clone()),
            client,
            gas,
            chain_id,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Resolve nonce, fees and gas limit against the current network state.
    /// Nothing is reused from earlier builds.
    pub async fn build(
        &self,
        action: &ActionDescriptor,
        from: Address,
    ) -> Result<TxRequest, AppError> {
        let nonce = self.nonces.next_nonce(from).await?;
        let gas = self.gas.get_gas_parameters(action.fee_model).await?;
        let gas_limit = self.resolve_gas_limit(action, from).await;
        if !action.value.is_zero() {
            self.ensure_funds(action, from, gas_limit, &gas).await?;
        }

        tracing::debug!(
            target: "builder",
            action = %action.label,
            nonce,
            gas_limit,
            fees = %gas,
            "Built transaction request"
        );

        Ok(TxRequest {
            from,
            target: action.target,
            value: action.value,
            input: action.input.clone(),
            gas_limit,
            gas,
            nonce,
            chain_id: self.chain_id,
        })
    }

    /// Fresh balance read; value plus worst-case fee must be covered.
    async fn ensure_funds(
        &self,
        action: &ActionDescriptor,
        from: Address,
        gas_limit: u64,
        gas: &GasParams,
    ) -> Result<(), AppError> {
        let balance = self.client.balance(from).await?;
        let required = action
            .value
            .saturating_add(U256::from(gas_limit).saturating_mul(U256::from(gas.fee_cap())));
        if balance < required {
            tracing::warn!(
                target: "builder",
                action = %action.label,
                balance = %wei_to_native(balance),
                required = %wei_to_native(required),
                "Insufficient balance"
            );
            return Err(AppError::validation(
                "balance",
                format!(
                    "insufficient balance: {} {NATIVE_SYMBOL} < {} {NATIVE_SYMBOL}",
                    wei_to_native(balance),
                    wei_to_native(required)
                ),
            ));
        }
        Ok(())
    }

    async fn resolve_gas_limit(&self, action: &ActionDescriptor, from: Address) -> u64 {
        match action.gas {
            GasLimit::Fixed(limit) => limit,
            GasLimit::Estimate {
                buffer_bps,
                fallback,
            } => {
                let estimate_req = CallRequest {
                    from,
                    to: action.target,
                    value: action.value,
                    input: action.input.clone(),
                };
                match self.client.estimate_gas(&estimate_req).await {
                    Ok(estimate) => {
                        let buffered = u128::from(estimate) * u128::from(10_000 + buffer_bps) / 10_000;
                        u64::try_from(buffered).unwrap_or(u64::MAX)
                    }
                    Err(e) => {
                        tracing::warn!(
                            target: "builder",
                            action = %action.label,
                            fallback,
                            error = %e,
                            "Gas estimation failed; using fallback limit"
                        );
                        fallback
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::simulated::SimulatedChain;

    fn builder(chain: &Arc<SimulatedChain>) -> TransactionBuilder {
        let client: Arc<dyn ChainClient> = chain.clone();
        TransactionBuilder::new(client.clone(), GasOracle::new(client, 2), 10143)
    }

    #[tokio::test]
    async fn every_build_reads_nonce_and_gas_fresh() {
        let chain = Arc::new(SimulatedChain::default());
        chain.set_gas_price_step(1_000);
        let b = builder(&chain);
        let action = ActionDescriptor::call("noop", Address::repeat_byte(1), Bytes::new(), 50_000);

        let first = b.build(&action, Address::repeat_byte(9)).await.unwrap();
        let second = b.build(&action, Address::repeat_byte(9)).await.unwrap();
        assert_eq!(chain.nonce_queries(), 2);
        assert_eq!(chain.gas_queries(), 2);
        assert_ne!(first.gas, second.gas);
        assert_eq!(first.gas_limit, 50_000);
    }

    #[tokio::test]
    async fn estimated_limit_gets_buffer_or_fallback() {
        let chain = Arc::new(SimulatedChain::default());
        chain.set_gas_estimate(Some(100_000));
        let b = builder(&chain);
        let action = ActionDescriptor::create(
            "deploy",
            Bytes::from_static(&[0x60, 0x00]),
            GasLimit::Estimate {
                buffer_bps: 2_000,
                fallback: 2_000_000,
            },
        );

        let req = b.build(&action, Address::repeat_byte(3)).await.unwrap();
        assert_eq!(req.gas_limit, 120_000);
        assert_eq!(req.target, TxKind::Create);

        chain.set_gas_estimate(None);
        let req = b.build(&action, Address::repeat_byte(3)).await.unwrap();
        assert_eq!(req.gas_limit, 2_000_000);
    }

    #[tokio::test]
    async fn value_transfer_checks_balance_before_signing() {
        let chain = Arc::new(SimulatedChain::default());
        let b = builder(&chain);
        let from = Address::repeat_byte(4);
        let action = ActionDescriptor::call("stake", Address::repeat_byte(1), Bytes::new(), 21_000)
            .with_value(U256::from(1_000_000_000_000_000u64));

        let err = b.build(&action, from).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "balance"));
        assert!(!err.is_transient());

        // value alone is not enough; the fee has to fit too
        chain.fund(from, action.value);
        assert!(b.build(&action, from).await.is_err());

        chain.fund(from, action.value * U256::from(2u64));
        assert!(b.build(&action, from).await.is_ok());

        let free = ActionDescriptor::call("ping", Address::repeat_byte(1), Bytes::new(), 21_000);
        assert!(b.build(&free, Address::repeat_byte(5)).await.is_ok());
    }
}
