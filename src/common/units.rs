// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::constants::NATIVE_DECIMALS;
use crate::domain::error::AppError;
use alloy::primitives::U256;
use alloy::primitives::utils::{format_units, parse_units};
use rand::Rng;

/// Convert a decimal amount string into the token's smallest unit.
///
/// Rejects signs, exponents, and any fractional digit the token cannot
/// represent, so the conversion never silently truncates.
pub fn to_smallest_unit(amount: &str, decimals: u8) -> Result<U256, AppError> {
    let raw = amount.trim();
    if raw.is_empty() {
        return Err(AppError::validation("amount", "empty amount"));
    }
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    let well_formed = whole.chars().all(|c| c.is_ascii_digit())
        && frac.chars().all(|c| c.is_ascii_digit())
        && !(whole.is_empty() && frac.is_empty());
    if !well_formed {
        return Err(AppError::validation(
            "amount",
            format!("'{raw}' is not a non-negative decimal number"),
        ));
    }
    let significant_frac = frac.trim_end_matches('0');
    if significant_frac.len() > decimals as usize {
        return Err(AppError::validation(
            "amount",
            format!("'{raw}' has more than {decimals} fractional digits"),
        ));
    }
    let normalized = match (whole.is_empty(), significant_frac.is_empty()) {
        (_, true) if whole.is_empty() => "0".to_string(),
        (_, true) => whole.to_string(),
        (true, false) => format!("0.{significant_frac}"),
        (false, false) => format!("{whole}.{significant_frac}"),
    };
    parse_units(&normalized, decimals)
        .map(|parsed| parsed.get_absolute())
        .map_err(|e| AppError::validation("amount", format!("'{raw}': {e}")))
}

pub fn native_to_wei(amount: &str) -> Result<U256, AppError> {
    to_smallest_unit(amount, NATIVE_DECIMALS)
}

/// Render a smallest-unit value as a trimmed decimal string (`1.5`, `0`).
pub fn from_smallest_unit(value: U256, decimals: u8) -> String {
    match format_units(value, decimals) {
        Ok(s) if s.contains('.') => {
            let trimmed = s.trim_end_matches('0').trim_end_matches('.');
            if trimmed.is_empty() {
                "0".to_string()
            } else {
                trimmed.to_string()
            }
        }
        Ok(s) => s,
        Err(_) => value.to_string(),
    }
}

pub fn wei_to_native(value: U256) -> String {
    from_smallest_unit(value, NATIVE_DECIMALS)
}

/// Uniform random amount in whole units, rounded to `precision` places before
/// conversion so the sampled value is exactly representable.
#[derive(Debug, Clone, Copy)]
pub struct AmountRange {
    pub min: f64,
    pub max: f64,
    pub precision: usize,
    pub decimals: u8,
}

impl AmountRange {
    pub fn native(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            precision: 4,
            decimals: NATIVE_DECIMALS,
        }
    }

    pub fn sample(&self) -> Result<U256, AppError> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min < 0.0 || self.min > self.max
        {
            return Err(AppError::validation(
                "amount_range",
                format!("invalid range {}..={}", self.min, self.max),
            ));
        }
        let value = if self.min == self.max {
            self.min
        } else {
            rand::rng().random_range(self.min..=self.max)
        };
        let precision = self.precision.min(self.decimals as usize);
        to_smallest_unit(&format!("{value:.precision$}"), self.decimals)
    }
}
