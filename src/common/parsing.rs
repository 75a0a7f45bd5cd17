// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use alloy::primitives::{Address, Bytes};
use std::collections::HashMap;
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(s.trim())).ok()
}

/// `0x`-prefixed hex payload as returned by JSON-RPC style APIs.
pub fn parse_prefixed_calldata(s: &str) -> Option<Bytes> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))?;
    hex::decode(body).ok().map(Bytes::from)
}

pub fn parse_address_hex(s: &str) -> Option<Address> {
    let raw = strip_0x(s.trim());
    if raw.len() != 40 {
        return None;
    }
    Address::from_str(raw).ok()
}

pub fn parse_address(field: &str, s: &str) -> Result<Address, AppError> {
    parse_address_hex(s).ok_or_else(|| AppError::Validation {
        field: field.to_string(),
        message: format!("'{}' is not a 20-byte hex address", s.trim()),
    })
}

/// Parses an `address -> address` table such as a price-feed override map.
pub fn parse_address_map(
    raw: &HashMap<String, String>,
) -> Result<HashMap<Address, Address>, AppError> {
    let mut out = HashMap::with_capacity(raw.len());
    for (key, value) in raw {
        let k = parse_address_hex(key).ok_or_else(|| AppError::InvalidAddress(key.clone()))?;
        let v = parse_address_hex(value).ok_or_else(|| AppError::InvalidAddress(value.clone()))?;
        out.insert(k, v);
    }
    Ok(out)
}
