// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::{short_address, strip_0x};
use crate::common::units::wei_to_native;
use crate::domain::constants::NATIVE_SYMBOL;
use crate::network::gas::GasParams;
use crate::network::provider::ChainClient;
use crate::services::execution::builder::TxRequest;
use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope, TxLegacy};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use std::str::FromStr;

/// Signing identity derived from one private key.
#[derive(Clone)]
pub struct Identity {
    signer: PrivateKeySigner,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Raw EIP-2718 bytes ready for `eth_sendRawTransaction`.
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub raw: Bytes,
    pub hash: B256,
}

impl Identity {
    pub fn from_private_key(raw: &str) -> Result<Self, AppError> {
        let signer = PrivateKeySigner::from_str(strip_0x(raw.trim()))
            .map_err(|e| AppError::Config(format!("Invalid private key: {e}")))?;
        Ok(Self { signer })
    }

    pub fn random() -> Self {
        Self {
            signer: PrivateKeySigner::random(),
        }
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn short(&self) -> String {
        short_address(&self.address())
    }

    /// Sign a fully built request. Malformed requests fail here and are never
    /// worth retrying.
    pub fn sign(&self, request: &TxRequest) -> Result<SignedTx, AppError> {
        if request.chain_id == 0 {
            return Err(AppError::Signing("chain id must be non-zero".into()));
        }
        if request.gas_limit == 0 {
            return Err(AppError::Signing("gas limit must be non-zero".into()));
        }
        if request.from != self.address() {
            return Err(AppError::Signing(format!(
                "request built for {} but signer is {}",
                request.from,
                self.address()
            )));
        }

        let envelope: TxEnvelope = match request.gas {
            GasParams::Legacy { gas_price } => {
                let mut tx = TxLegacy {
                    chain_id: Some(request.chain_id),
                    nonce: request.nonce,
                    gas_price,
                    gas_limit: request.gas_limit,
                    to: request.target,
                    value: request.value,
                    input: request.input.clone(),
                };
                let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
                    .map_err(|e| AppError::Signing(format!("Sign tx failed: {e}")))?;
                tx.into_signed(sig).into()
            }
            GasParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
            } => {
                if max_priority_fee_per_gas > max_fee_per_gas {
                    return Err(AppError::Signing(
                        "priority fee exceeds max fee per gas".into(),
                    ));
                }
                let mut tx = TxEip1559 {
                    chain_id: request.chain_id,
                    nonce: request.nonce,
                    max_priority_fee_per_gas,
                    max_fee_per_gas,
                    gas_limit: request.gas_limit,
                    to: request.target,
                    value: request.value,
                    access_list: Default::default(),
                    input: request.input.clone(),
                };
                let sig = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
                    .map_err(|e| AppError::Signing(format!("Sign tx failed: {e}")))?;
                tx.into_signed(sig).into()
            }
        };

        Ok(SignedTx {
            raw: Bytes::from(envelope.encoded_2718()),
            hash: *envelope.tx_hash(),
        })
    }
}

/// One configured account and what we last observed about it.
///
/// The cached nonce is informational; transaction building always reads the
/// pending nonce from the node.
#[derive(Debug)]
pub struct AccountContext {
    pub index: usize,
    identity: Identity,
    balance: Option<U256>,
    last_nonce: Option<u64>,
}

impl AccountContext {
    pub fn new(index: usize, identity: Identity) -> Self {
        Self {
            index,
            identity,
            balance: None,
            last_nonce: None,
        }
    }

    /// Build contexts for every key, numbered from 1.
    pub fn load_all(keys: &[String]) -> Result<Vec<Self>, AppError> {
        keys.iter()
            .enumerate()
            .map(|(idx, key)| Identity::from_private_key(key).map(|id| Self::new(idx + 1, id)))
            .collect()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn address(&self) -> Address {
        self.identity.address()
    }

    pub fn balance(&self) -> Option<U256> {
        self.balance
    }

    pub fn last_nonce(&self) -> Option<u64> {
        self.last_nonce
    }

    pub fn record_nonce(&mut self, nonce: u64) {
        self.last_nonce = Some(nonce);
    }

    pub async fn refresh_balance(&mut self, client: &dyn ChainClient) -> Result<U256, AppError> {
        let balance = client.balance(self.address()).await?;
        self.balance = Some(balance);
        tracing::info!(
            target: "account",
            account = self.index,
            address = %self.identity.short(),
            balance = %format!("{} {NATIVE_SYMBOL}", wei_to_native(balance)),
            "Balance"
        );
        Ok(balance)
    }
}
