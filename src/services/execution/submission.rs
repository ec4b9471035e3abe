// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::retry::{Attempt, RetryPolicy, retry_classified};
use crate::domain::constants::DEFAULT_EXPLORER_URL;
use crate::network::provider::{ChainClient, ReceiptSummary};
use crate::services::account::Identity;
use crate::services::execution::builder::{ActionDescriptor, TransactionBuilder, TxRequest};
use alloy::primitives::{Address, B256};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{Instant, sleep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Reverted,
    TimedOut,
    Rejected,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TxStatus::Pending => "pending",
            TxStatus::Confirmed => "confirmed",
            TxStatus::Reverted => "reverted",
            TxStatus::TimedOut => "timed-out",
            TxStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// Terminal classification of one `submit` call.
#[derive(Debug, Clone)]
pub struct SubmissionResult {
    pub action: String,
    pub hash: B256,
    pub status: TxStatus,
    pub gas_used: Option<u64>,
    pub block_number: Option<u64>,
    pub contract_address: Option<Address>,
    /// The request that produced `hash`.
    pub request: TxRequest,
    /// Attempts consumed, including the one that produced this result.
    pub attempts: u32,
}

impl SubmissionResult {
    pub fn is_confirmed(&self) -> bool {
        self.status == TxStatus::Confirmed
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    pub receipt_timeout: Duration,
    pub explorer_url: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(2),
            receipt_timeout: Duration::from_secs(180),
            explorer_url: DEFAULT_EXPLORER_URL.to_string(),
        }
    }
}

/// A broadcast that never produced a receipt inside the wait window.
#[derive(Debug, Clone)]
struct Unresolved {
    hash: B256,
    request: TxRequest,
}

pub struct SubmissionEngine {
    client: Arc<dyn ChainClient>,
    builder: TransactionBuilder,
    config: SubmissionConfig,
}

impl SubmissionEngine {
    pub fn new(
        client: Arc<dyn ChainClient>,
        builder: TransactionBuilder,
        config: SubmissionConfig,
    ) -> Self {
        Self {
            client,
            builder,
            config,
        }
    }

    pub fn client(&self) -> &Arc<dyn ChainClient> {
        &self.client
    }

    pub fn explorer_link(&self, hash: &B256) -> String {
        format!("{}{:#x}", self.config.explorer_url, hash)
    }

    /// Build, sign, broadcast and confirm `action` for `identity`.
    ///
    /// Every attempt rebuilds the request from scratch. Included transactions
    /// are terminal: `Confirmed` and `Reverted` both return `Ok`. Only failures
    /// before inclusion (transport errors, node rejections, receipt timeouts)
    /// consume the retry budget.
    pub async fn submit(
        &self,
        identity: &Identity,
        action: &ActionDescriptor,
    ) -> Result<SubmissionResult, AppError> {
        let unresolved: Mutex<Vec<Unresolved>> = Mutex::new(Vec::new());
        let unresolved = &unresolved;
        retry_classified(&self.config.retry, &action.label, move |attempt| {
            self.attempt(identity, action, attempt, unresolved)
        })
        .await
    }

    async fn attempt(
        &self,
        identity: &Identity,
        action: &ActionDescriptor,
        attempt: u32,
        unresolved: &Mutex<Vec<Unresolved>>,
    ) -> Attempt<SubmissionResult> {
        if let Some(landed) = self.reconcile(action, attempt, unresolved).await {
            return Attempt::Done(landed);
        }

        let request = match self.builder.build(action, identity.address()).await {
            Ok(req) => req,
            Err(e) if e.is_transient() => return Attempt::Retry(e),
            Err(e) => return Attempt::Fatal(e),
        };

        let signed = match identity.sign(&request) {
            Ok(signed) => signed,
            Err(e) => {
                tracing::error!(target: "submit", action = %action.label, error = %e, "Signing failed");
                return Attempt::Fatal(e);
            }
        };

        let hash = match self.client.send_raw_transaction(&signed.raw).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(
                    target: "submit",
                    action = %action.label,
                    status = %TxStatus::Rejected,
                    nonce = request.nonce,
                    error = %e,
                    "Broadcast failed"
                );
                return if e.is_transient() {
                    Attempt::Retry(e)
                } else {
                    Attempt::Fatal(e)
                };
            }
        };
        if hash != signed.hash {
            tracing::debug!(target: "submit", local = %signed.hash, remote = %hash, "Node returned a different hash");
        }

        tracing::info!(
            target: "submit",
            action = %action.label,
            status = %TxStatus::Pending,
            nonce = request.nonce,
            tx = %self.explorer_link(&hash),
            "Transaction sent"
        );

        match self.wait_for_receipt(hash).await {
            Some(receipt) => Attempt::Done(self.classify(action, hash, request, receipt, attempt)),
            None => {
                let waited_ms = self.config.receipt_timeout.as_millis() as u64;
                tracing::warn!(
                    target: "submit",
                    action = %action.label,
                    status = %TxStatus::TimedOut,
                    tx = %self.explorer_link(&hash),
                    waited_ms,
                    "No receipt within timeout"
                );
                if let Ok(mut list) = unresolved.lock() {
                    list.push(Unresolved { hash, request });
                }
                Attempt::Retry(AppError::ReceiptTimeout {
                    hash: format!("{hash:#x}"),
                    waited_ms,
                })
            }
        }
    }

    /// Re-check earlier timed-out hashes before sending a replacement. A late
    /// receipt is the outcome of this submit; nothing new is broadcast.
    async fn reconcile(
        &self,
        action: &ActionDescriptor,
        attempt: u32,
        unresolved: &Mutex<Vec<Unresolved>>,
    ) -> Option<SubmissionResult> {
        let earlier: Vec<Unresolved> = unresolved.lock().map(|l| l.clone()).unwrap_or_default();
        if earlier.is_empty() {
            return None;
        }
        for prior in earlier.iter() {
            match self.client.transaction_receipt(prior.hash).await {
                Ok(Some(receipt)) => {
                    tracing::info!(
                        target: "submit",
                        action = %action.label,
                        tx = %self.explorer_link(&prior.hash),
                        "Earlier timed-out transaction landed; not resubmitting"
                    );
                    return Some(self.classify(
                        action,
                        prior.hash,
                        prior.request.clone(),
                        receipt,
                        attempt,
                    ));
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "submit", tx = %prior.hash, error = %e, "Receipt re-check failed")
                }
            }
        }
        tracing::warn!(
            target: "submit",
            action = %action.label,
            unresolved = earlier.len(),
            "Resubmitting while earlier transaction is unresolved; a late inclusion can duplicate the effect"
        );
        None
    }

    async fn wait_for_receipt(&self, hash: B256) -> Option<ReceiptSummary> {
        let deadline = Instant::now() + self.config.receipt_timeout;
        loop {
            match self.client.transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Some(receipt),
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(target: "submit", tx = %hash, error = %e, "Receipt poll failed")
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(self.config.poll_interval).await;
        }
    }

    fn classify(
        &self,
        action: &ActionDescriptor,
        hash: B256,
        request: TxRequest,
        receipt: ReceiptSummary,
        attempts: u32,
    ) -> SubmissionResult {
        let status = if receipt.success {
            TxStatus::Confirmed
        } else {
            TxStatus::Reverted
        };
        let link = self.explorer_link(&hash);
        if receipt.success {
            tracing::info!(
                target: "submit",
                action = %action.label,
                %status,
                block = receipt.block_number,
                gas_used = receipt.gas_used,
                tx = %link,
                "Transaction confirmed"
            );
        } else {
            tracing::error!(
                target: "submit",
                action = %action.label,
                %status,
                block = receipt.block_number,
                tx = %link,
                "Transaction reverted"
            );
        }
        SubmissionResult {
            action: action.label.clone(),
            hash,
            status,
            gas_used: Some(receipt.gas_used),
            block_number: receipt.block_number,
            contract_address: receipt.contract_address,
            request,
            attempts,
        }
    }
}
