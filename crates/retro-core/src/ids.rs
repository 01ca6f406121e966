//! Record identifiers.
//!
//! Teams, members and users are addressed by 24-character hexadecimal ids
//! (12 bytes: a 4-byte big-endian creation timestamp followed by 8 random
//! bytes). Ids coming from clients are validated before any lookup.

use crate::error::{Result, RetroError};
use chrono::Utc;
use regex::Regex;
use std::sync::OnceLock;

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{24}$").unwrap())
}

/// True when `value` is a well-formed record id.
pub fn is_valid_id(value: &str) -> bool {
    id_re().is_match(value)
}

/// Validate `value` as an id of the given `kind` ("team id", "user id", ...).
pub fn validate_id(kind: &'static str, value: &str) -> Result<()> {
    if !is_valid_id(value) {
        return Err(RetroError::InvalidId {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Generate a fresh id.
pub fn new_id() -> String {
    let secs = Utc::now().timestamp().max(0) as u32;
    let random = uuid::Uuid::new_v4();
    let mut bytes = [0u8; 12];
    bytes[..4].copy_from_slice(&secs.to_be_bytes());
    bytes[4..].copy_from_slice(&random.as_bytes()[..8]);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
