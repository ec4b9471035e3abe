// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::{Ethereum, ReceiptResponse as _};
use alloy::primitives::{Address, B256, Bytes, TxKind, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{BlockNumberOrTag, TransactionInput, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;

        let provider = RootProvider::new_http(url);
        Ok(provider)
    }
}

/// Read-only call or gas-estimation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Address,
    pub to: TxKind,
    pub value: U256,
    pub input: Bytes,
}

impl From<&CallRequest> for TransactionRequest {
    fn from(req: &CallRequest) -> Self {
        TransactionRequest {
            from: Some(req.from),
            to: Some(req.to),
            value: Some(req.value),
            input: TransactionInput::new(req.input.clone()),
            ..Default::default()
        }
    }
}

/// The fields of a receipt the engine classifies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub success: bool,
    pub gas_used: u64,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
}

/// Network boundary. Every call may fail transiently; none of them retry.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, AppError>;
    async fn balance(&self, address: Address) -> Result<U256, AppError>;
    /// Next nonce including transactions still in the mempool.
    async fn transaction_count(&self, address: Address) -> Result<u64, AppError>;
    async fn gas_price(&self) -> Result<u128, AppError>;
    /// Base fee of the latest block; `None` on chains without EIP-1559.
    async fn latest_base_fee(&self) -> Result<Option<u128>, AppError>;
    async fn max_priority_fee(&self) -> Result<u128, AppError>;
    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, AppError>;
    async fn call(&self, request: &CallRequest) -> Result<Bytes, AppError>;
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError>;
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError>;
}

fn unavailable(context: &str, err: RpcError<TransportErrorKind>) -> AppError {
    AppError::NetworkUnavailable(format!("{context}: {err}"))
}

/// JSON-RPC implementation over an alloy HTTP provider.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: HttpProvider,
}

impl RpcChainClient {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }

    pub fn connect(rpc_url: &str) -> Result<Self, AppError> {
        ConnectionFactory::http(rpc_url).map(Self::new)
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn chain_id(&self) -> Result<u64, AppError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| unavailable("eth_chainId", e))
    }

    async fn balance(&self, address: Address) -> Result<U256, AppError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| unavailable("eth_getBalance", e))
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, AppError> {
        self.provider
            .get_transaction_count(address)
            .pending()
            .await
            .map_err(|e| unavailable("eth_getTransactionCount", e))
    }

    async fn gas_price(&self) -> Result<u128, AppError> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| unavailable("eth_gasPrice", e))
    }

    async fn latest_base_fee(&self) -> Result<Option<u128>, AppError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await
            .map_err(|e| unavailable("eth_getBlockByNumber", e))?;
        Ok(block.and_then(|b| b.header.base_fee_per_gas).map(u128::from))
    }

    async fn max_priority_fee(&self) -> Result<u128, AppError> {
        self.provider
            .get_max_priority_fee_per_gas()
            .await
            .map_err(|e| unavailable("eth_maxPriorityFeePerGas", e))
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, AppError> {
        self.provider
            .estimate_gas(request.into())
            .await
            .map_err(|e| match e {
                RpcError::ErrorResp(payload) => AppError::Rejected(payload.to_string()),
                other => unavailable("eth_estimateGas", other),
            })
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, AppError> {
        self.provider
            .call(request.into())
            .await
            .map_err(|e| match e {
                RpcError::ErrorResp(payload) => AppError::Rejected(payload.to_string()),
                other => unavailable("eth_call", other),
            })
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<B256, AppError> {
        match self.provider.send_raw_transaction(raw).await {
            Ok(pending) => Ok(*pending.tx_hash()),
            // The node parsed the transaction and refused it.
            Err(RpcError::ErrorResp(payload)) => Err(AppError::Rejected(payload.to_string())),
            Err(e) => Err(unavailable("eth_sendRawTransaction", e)),
        }
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<ReceiptSummary>, AppError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| unavailable("eth_getTransactionReceipt", e))?;
        Ok(receipt.map(|r| ReceiptSummary {
            success: r.status(),
            gas_used: r.gas_used,
            block_number: r.block_number,
            contract_address: r.contract_address,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_rpc_url() {
        assert!(matches!(
            ConnectionFactory::http("not a url"),
            Err(AppError::Config(_))
        ));
        assert!(RpcChainClient::connect("https://testnet-rpc.monad.xyz/").is_ok());
    }

    #[test]
    fn create_requests_carry_no_recipient() {
        let req = CallRequest {
            from: Address::repeat_byte(1),
            to: TxKind::Create,
            value: U256::ZERO,
            input: Bytes::from_static(&[0x60, 0x0a]),
        };
        let rpc: TransactionRequest = (&req).into();
        assert_eq!(rpc.to, Some(TxKind::Create));
        assert_eq!(rpc.input.input().map(|b| b.len()), Some(2));
    }
}
