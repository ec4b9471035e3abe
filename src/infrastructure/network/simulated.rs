// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

//! In-memory chain used by `--dry-run` and the test suite.
//!
//! Raw transactions are decoded and signer-recovered exactly as a node would,
//! nonces are enforced, and receipts appear on the first poll unless a queued
//! [`Fault`] says otherwise.

use crate::common::error::AppError;
use crate::domain::constants::CHAIN_MONAD_TESTNET;
use crate::network::provider::{CallRequest, ChainClient, ReceiptSummary};
use alloy::consensus::transaction::SignerRecoverable;
use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

/// Scripted misbehaviour, consumed one per broadcast in FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Broadcast fails at the transport level; nothing reaches the pool.
    BroadcastUnavailable,
    /// Broadcast answered with HTTP 429.
    RateLimited,
    /// Node refuses the transaction with an error response.
    Rejected,
    /// Transaction is mined with a failed status.
    Revert,
    /// Receipt only becomes visible after this many receipt queries.
    DelayedReceipt(u32),
    /// Accepted, then silently dropped: no receipt, nonce unchanged.
    NeverMined,
}

/// A broadcast as the simulated node decoded it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTx {
    pub hash: B256,
    pub from: Address,
    pub nonce: u64,
    pub to: TxKind,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    /// Legacy gas price or EIP-1559 max fee.
    pub fee_cap: u128,
    pub priority_fee: Option<u128>,
    pub accepted: bool,
}

impl RecordedTx {
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.input.get(..4).and_then(|s| s.try_into().ok())
    }
}

#[derive(Debug)]
struct PendingReceipt {
    summary: ReceiptSummary,
    polls_remaining: u32,
}

#[derive(Debug, Default)]
struct SimState {
    chain_id: u64,
    block_number: u64,
    nonces: HashMap<Address, u64>,
    balances: HashMap<Address, U256>,
    gas_price: u128,
    gas_price_step: u128,
    base_fee: Option<u128>,
    priority_fee: u128,
    gas_estimate: Option<u64>,
    faults: VecDeque<Fault>,
    receipt_errors: u32,
    receipts: HashMap<B256, PendingReceipt>,
    call_responses: HashMap<(Address, [u8; 4]), Bytes>,
    broadcasts: Vec<RecordedTx>,
    nonce_queries: u64,
    gas_queries: u64,
}

#[derive(Debug)]
pub struct SimulatedChain {
    state: Mutex<SimState>,
}

impl Default for SimulatedChain {
    fn default() -> Self {
        Self::new(CHAIN_MONAD_TESTNET)
    }
}

impl SimulatedChain {
    pub fn new(chain_id: u64) -> Self {
        Self {
            state: Mutex::new(SimState {
                chain_id,
                block_number: 1,
                gas_price: 50_000_000_000,
                priority_fee: 2_000_000_000,
                base_fee: Some(50_000_000_000),
                gas_estimate: Some(120_000),
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fund(&self, address: Address, amount: U256) {
        *self.state().balances.entry(address).or_default() += amount;
    }

    pub fn push_fault(&self, fault: Fault) {
        self.state().faults.push_back(fault);
    }

    /// Next `count` receipt queries fail at the transport level.
    pub fn fail_receipt_queries(&self, count: u32) {
        self.state().receipt_errors = count;
    }

    /// Every gas-price read returns `step` more than the previous one.
    pub fn set_gas_price_step(&self, step: u128) {
        self.state().gas_price_step = step;
    }

    pub fn set_base_fee(&self, base_fee: Option<u128>) {
        self.state().base_fee = base_fee;
    }

    pub fn set_gas_estimate(&self, estimate: Option<u64>) {
        self.state().gas_estimate = estimate;
    }

    pub fn set_call_response(&self, to: Address, selector: [u8; 4], response: Bytes) {
        self.state().call_responses.insert((to, selector), response);
    }

    pub fn broadcasts(&self) -> Vec<RecordedTx> {
        self.state().broadcasts.clone()
    }

    /// Broadcasts the node accepted into its pool.
    pub fn accepted(&self) -> Vec<RecordedTx> {
        self.state()
            .broadcasts
            .iter()
            .filter(|tx| tx.accepted)
            .cloned()
            .collect()
    }

    pub fn nonce_of(&self, address: Address) -> u64 {
        self.state().nonces.get(&address).copied().unwrap_or(0)
    }

    pub fn nonce_queries(&self) -> u64 {
        self.state().nonce_queries
    }

    pub fn gas_queries(&self) -> u64 {
        self.state().gas_queries
    }
}

fn record(envelope: &TxEnvelope, from: Address, accepted: bool) -> RecordedTx {
    RecordedTx {
        hash: *envelope.tx_hash(),
        from,
        nonce: envelope.nonce(),
        to: envelope.kind(),
        value: envelope.value(),
        input: envelope.input().clone(),
        gas_limit: envelope.gas_limit(),
        fee_cap: envelope.max_fee_per_gas(),
        priority_fee: envelope.max_priority_fee_per_gas(),
        accepted,
    }
}

#[async_trait]
impl ChainClient for SimulatedChain {
    async fn chain_id(&self) -> Result<u64, AppError> {
        Ok(self.state().chain_id)
    }

    async fn balance(&self, address: Address) -> Result<U256, AppError> {
        Ok(self
            .state()
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, AppError> {
        let mut state = self.state();
        state.nonce_queries += 1;
        Ok(state.nonces.get(&address).copied().unwrap_or(0))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        let mut state = self.state();
        state.gas_queries += 1;
        let price = state.gas_price;
        state.gas_price = price.saturating_add(state.gas_price_step);
        Ok(price)
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>, AppError> {
        let mut state = self.state();
        state.gas_queries += 1;
        let base = state.base_fee;
        if let Some(current) = state.base_fee {
            state.base_fee = Some(current.saturating_add(state.gas_price_step));
        }
        Ok(base)
    }

    async fn max_priority_fee(&self) -> Result<u128, AppError> {
        Ok(self.state().priority_fee)
    }

    async fn estimate_gas(&self, _request: &CallRequest) -> Result<u64, AppError> {
        self.state()
            .gas_estimate
            .ok_or_else(|| AppError::Rejected("execution reverted".into()))
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, AppError> {
        let TxKind::Call(to) = request.to else {
            return Err(AppError::Rejected("eth_call without target".into()));
        };
        let selector: [u8; 4] = request
            .input
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .unwrap_or_default();
        self.state()
            .call_responses
            .get(&(to, selector))
            .cloned()
            .ok_or_else(|| AppError::Rejected("execution reverted".into()))
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError> {
        let envelope = TxEnvelope::decode_2718(&mut &raw[..])
            .map_err(|e| AppError::Rejected(format!("invalid raw transaction: {e}")))?;
        let from = envelope
            .recover_signer()
            .map_err(|e| AppError::Rejected(format!("invalid signature: {e}")))?;

        let mut state = self.state();
        if envelope.chain_id() != Some(state.chain_id) {
            return Err(AppError::Rejected("invalid chain id".into()));
        }
        let fault = state.faults.pop_front();
        match fault {
            Some(Fault::BroadcastUnavailable) => {
                state.broadcasts.push(record(&envelope, from, false));
                return Err(AppError::NetworkUnavailable(
                    "eth_sendRawTransaction: connection reset".into(),
                ));
            }
            Some(Fault::RateLimited) => {
                state.broadcasts.push(record(&envelope, from, false));
                return Err(AppError::NetworkUnavailable(
                    "eth_sendRawTransaction: HTTP 429 Too Many Requests".into(),
                ));
            }
            Some(Fault::Rejected) => {
                state.broadcasts.push(record(&envelope, from, false));
                return Err(AppError::Rejected("replacement transaction underpriced".into()));
            }
            _ => {}
        }

        let expected = state.nonces.get(&from).copied().unwrap_or(0);
        if envelope.nonce() != expected {
            state.broadcasts.push(record(&envelope, from, false));
            return Err(AppError::Rejected(format!(
                "nonce mismatch: expected {expected}, got {}",
                envelope.nonce()
            )));
        }

        let hash = *envelope.tx_hash();
        state.broadcasts.push(record(&envelope, from, true));
        if fault == Some(Fault::NeverMined) {
            return Ok(hash);
        }

        state.nonces.insert(from, expected + 1);
        state.block_number += 1;
        let success = fault != Some(Fault::Revert);
        if success {
            let value = envelope.value();
            let sender = state.balances.entry(from).or_default();
            *sender = sender.saturating_sub(value);
            if let TxKind::Call(to) = envelope.kind() {
                *state.balances.entry(to).or_default() += value;
            }
        }
        let contract_address = match (success, envelope.kind()) {
            (true, TxKind::Create) => Some(from.create(expected)),
            _ => None,
        };
        let polls_remaining = match fault {
            Some(Fault::DelayedReceipt(n)) => n,
            _ => 0,
        };
        let summary = ReceiptSummary {
            success,
            gas_used: envelope.gas_limit().min(21_000 + envelope.input().len() as u64 * 16),
            block_number: Some(state.block_number),
            contract_address,
        };
        state.receipts.insert(
            hash,
            PendingReceipt {
                summary,
                polls_remaining,
            },
        );
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        let mut state = self.state();
        if state.receipt_errors > 0 {
            state.receipt_errors -= 1;
            return Err(AppError::NetworkUnavailable(
                "eth_getTransactionReceipt: timed out".into(),
            ));
        }
        match state.receipts.get_mut(&hash) {
            Some(pending) if pending.polls_remaining > 0 => {
                pending.polls_remaining -= 1;
                Ok(None)
            }
            Some(pending) => Ok(Some(pending.summary.clone())),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::consensus::{SignableTransaction, TxLegacy};
    use alloy::eips::eip2718::Encodable2718;
    use alloy::network::TxSignerSync;
    use alloy::signers::local::PrivateKeySigner;

    fn signed_transfer(signer: &PrivateKeySigner, nonce: u64, chain_id: u64) -> Vec<u8> {
        let mut tx = TxLegacy {
            chain_id: Some(chain_id),
            nonce,
            gas_price: 1,
            gas_limit: 21_000,
            to: TxKind::Call(Address::repeat_byte(9)),
            value: U256::from(5u64),
            input: Bytes::new(),
        };
        let sig = signer.sign_transaction_sync(&mut tx).unwrap();
        TxEnvelope::from(tx.into_signed(sig)).encoded_2718()
    }

    #[tokio::test]
    async fn enforces_nonces_and_records_sender() {
        let chain = SimulatedChain::default();
        let signer = PrivateKeySigner::random();
        chain.fund(signer.address(), U256::from(100u64));

        let hash = chain
            .send_raw_transaction(&signed_transfer(&signer, 0, CHAIN_MONAD_TESTNET))
            .await
            .unwrap();
        let receipt = chain.transaction_receipt(hash).await.unwrap().unwrap();
        assert!(receipt.success);
        assert_eq!(chain.nonce_of(signer.address()), 1);

        let stale = chain
            .send_raw_transaction(&signed_transfer(&signer, 0, CHAIN_MONAD_TESTNET))
            .await;
        assert!(matches!(stale, Err(AppError::Rejected(_))));

        let recorded = chain.accepted();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].from, signer.address());
        assert_eq!(
            chain.balance(Address::repeat_byte(9)).await.unwrap(),
            U256::from(5u64)
        );
    }

    #[tokio::test]
    async fn rejects_foreign_chain_id() {
        let chain = SimulatedChain::default();
        let signer = PrivateKeySigner::random();
        let res = chain
            .send_raw_transaction(&signed_transfer(&signer, 0, 1))
            .await;
        assert!(matches!(res, Err(AppError::Rejected(_))));
    }

    #[tokio::test]
    async fn faults_apply_in_order() {
        let chain = SimulatedChain::default();
        let signer = PrivateKeySigner::random();
        chain.push_fault(Fault::RateLimited);
        chain.push_fault(Fault::DelayedReceipt(2));

        let first = chain
            .send_raw_transaction(&signed_transfer(&signer, 0, CHAIN_MONAD_TESTNET))
            .await;
        assert!(first.unwrap_err().is_rate_limited());

        let hash = chain
            .send_raw_transaction(&signed_transfer(&signer, 0, CHAIN_MONAD_TESTNET))
            .await
            .unwrap();
        assert_eq!(chain.transaction_receipt(hash).await.unwrap(), None);
        assert_eq!(chain.transaction_receipt(hash).await.unwrap(), None);
        assert!(chain.transaction_receipt(hash).await.unwrap().is_some());
    }
}
