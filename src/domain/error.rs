// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Required input missing at {path}: {reason}")]
    ConfigurationMissing { path: String, reason: String },

    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Transaction rejected by node: {0}")]
    Rejected(String),

    #[error("No receipt for {hash} after {waited_ms}ms")]
    ReceiptTimeout { hash: String, waited_ms: u64 },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("{action} gave up after {attempts} attempts: {last}")]
    SubmissionExhausted {
        action: String,
        attempts: u32,
        last: Box<AppError>,
    },

    #[error("{action} reverted on-chain: {link}")]
    ContractReverted {
        action: String,
        hash: String,
        link: String,
    },

    #[error("Address {0} is invalid")]
    InvalidAddress(String),

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Transient errors mean the transaction never made it into a block and a
    /// rebuilt request may be sent. Insufficient-funds rejections are excluded.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Rejected(_) => !self.is_insufficient_funds(),
            AppError::NetworkUnavailable(_) | AppError::ReceiptTimeout { .. } => true,
            _ => false,
        }
    }

    pub fn is_insufficient_funds(&self) -> bool {
        match self {
            AppError::Rejected(msg) => msg.to_ascii_lowercase().contains("insufficient funds"),
            AppError::Validation { field, .. } => field == "balance",
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        match self {
            AppError::NetworkUnavailable(msg) | AppError::Rejected(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("429") || msg.contains("rate limit") || msg.contains("too many")
            }
            _ => false,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pre_inclusion_failures_are_transient() {
        assert!(AppError::NetworkUnavailable("eof".into()).is_transient());
        assert!(AppError::Rejected("nonce too low".into()).is_transient());
        assert!(
            AppError::ReceiptTimeout {
                hash: "0x01".into(),
                waited_ms: 10
            }
            .is_transient()
        );
        assert!(!AppError::Signing("bad".into()).is_transient());
        assert!(
            !AppError::ContractReverted {
                action: "stake".into(),
                hash: "0x01".into(),
                link: "x".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn insufficient_funds_rejection_is_not_retried() {
        let err = AppError::Rejected("Insufficient funds for gas * price + value".into());
        assert!(err.is_insufficient_funds());
        assert!(!err.is_transient());
        assert!(AppError::validation("balance", "short").is_insufficient_funds());
        assert!(!AppError::Rejected("replacement underpriced".into()).is_insufficient_funds());
    }

    #[test]
    fn rate_limit_detection_reads_status_text() {
        assert!(AppError::NetworkUnavailable("HTTP 429 Too Many Requests".into()).is_rate_limited());
        assert!(!AppError::NetworkUnavailable("connection reset".into()).is_rate_limited());
    }
}
