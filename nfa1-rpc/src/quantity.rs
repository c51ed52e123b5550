//! Hex quantity and data helpers for the JSON-RPC wire format.

use nfa1_core::ChainError;

/// `0x`-prefixed quantity, as used for block numbers in requests.
pub fn format_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

pub fn parse_hex_u64(method: &str, value: &str) -> Result<u64, ChainError> {
    let digits = strip_prefix(value);
    if digits.is_empty() {
        return Err(invalid(method, format!("empty quantity {:?}", value)));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| invalid(method, format!("bad quantity {:?}: {}", value, e)))
}

pub fn parse_hex_bytes(method: &str, value: &str) -> Result<Vec<u8>, ChainError> {
    hex::decode(strip_prefix(value))
        .map_err(|e| invalid(method, format!("bad hex data: {}", e)))
}

fn strip_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn invalid(method: &str, reason: String) -> ChainError {
    ChainError::InvalidResponse {
        method: method.to_string(),
        reason,
    }
}
