// src/domain/logic.rs

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Anything that is not an ASCII digit or a decimal point.
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.]").expect("valid regex"));

/// Strips currency symbols and thousands separators, then parses.
///
/// `"R1,200.50"` and `"$1,200.50"` both give `1200.5`; a plain `"700"`
/// comes back as `700.0`. Returns `None` when nothing parseable is left.
pub fn clean_price(raw: &str) -> Option<f64> {
    let cleaned = NON_NUMERIC.replace_all(raw, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// Integer coercion that also accepts whole floats such as `"42.0"`.
pub fn parse_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(i) = raw.parse::<i64>() {
        return Some(i);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Some(f as i64),
        _ => None,
    }
}

pub fn parse_real(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Host identifier derived from a host display name.
///
/// Numeric names are used as-is. Anything else maps to a stable,
/// non-negative integer taken from the SHA-256 of the trimmed name.
pub fn host_surrogate_id(host_name: &str) -> i64 {
    let name = host_name.trim();
    if let Some(id) = parse_integer(name) {
        return id;
    }
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) & i64::MAX as u64) as i64
}
