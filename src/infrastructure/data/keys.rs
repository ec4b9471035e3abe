// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::error::AppError;
use crate::common::parsing::{looks_like_private_key, parse_address_hex};
use alloy::primitives::Address;
use std::fs;
use std::path::Path;

fn read_entries(path: &Path) -> Result<Vec<String>, AppError> {
    let body = fs::read_to_string(path).map_err(|e| AppError::ConfigurationMissing {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let entries: Vec<String> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();
    if entries.is_empty() {
        return Err(AppError::ConfigurationMissing {
            path: path.display().to_string(),
            reason: "file has no entries".into(),
        });
    }
    Ok(entries)
}

/// Newline-delimited private keys. Lines that are not 32-byte hex are skipped
/// with a warning that names only the line number.
pub fn load_private_keys(path: &Path) -> Result<Vec<String>, AppError> {
    let mut keys = Vec::new();
    for (idx, entry) in read_entries(path)?.into_iter().enumerate() {
        if looks_like_private_key(&entry) {
            keys.push(entry);
        } else {
            tracing::warn!(target: "config", file = %path.display(), entry = idx + 1, "Skipping malformed private key");
        }
    }
    if keys.is_empty() {
        return Err(AppError::ConfigurationMissing {
            path: path.display().to_string(),
            reason: "no valid private keys".into(),
        });
    }
    tracing::info!(target: "config", count = keys.len(), "Loaded private keys");
    Ok(keys)
}

pub fn load_recipients(path: &Path) -> Result<Vec<Address>, AppError> {
    let mut recipients = Vec::new();
    for entry in read_entries(path)? {
        match parse_address_hex(&entry) {
            Some(addr) => recipients.push(addr),
            None => {
                tracing::warn!(target: "config", entry = %entry, "Skipping invalid recipient address")
            }
        }
    }
    if recipients.is_empty() {
        return Err(AppError::ConfigurationMissing {
            path: path.display().to_string(),
            reason: "no valid recipient addresses".into(),
        });
    }
    tracing::info!(target: "config", count = recipients.len(), "Loaded recipient addresses");
    Ok(recipients)
}
