// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::{Address, Bytes};
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(s.trim())).ok()
}

pub fn parse_hex_payload(s: &str) -> Option<Bytes> {
    let compact: String = s.split_whitespace().collect();
    parse_hex_bytes(&compact).map(Bytes::from)
}

pub fn parse_address_hex(s: &str) -> Option<Address> {
    Address::from_str(strip_0x(s.trim())).ok()
}

/// A private key is 32 bytes of hex, with or without the `0x` prefix.
pub fn looks_like_private_key(s: &str) -> bool {
    let body = strip_0x(s.trim());
    body.len() == 64 && body.chars().all(|c| c.is_ascii_hexdigit())
}

/// `0x1234ab...` style short form used in progress lines.
pub fn short_address(address: &Address) -> String {
    let full = format!("{address:#x}");
    format!("{}...", &full[..8])
}
