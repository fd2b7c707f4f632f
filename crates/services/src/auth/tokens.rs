//! Session token generation and hashing.
//!
//! Tokens are handed to the client once; only their SHA-256 hash is stored.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Prefix carried by every first-party session token.
pub const SESSION_TOKEN_PREFIX: &str = "sess_";

/// `sess_` followed by a simple (hyphen-less) UUID.
pub const SESSION_TOKEN_LEN: usize = 37;

/// Generate a new session token.
pub fn generate_session_token() -> String {
    format!("{}{}", SESSION_TOKEN_PREFIX, Uuid::new_v4().simple())
}

/// Hash a session token for storage and lookup.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn is_well_formed_session_token(token: &str) -> bool {
    token.starts_with(SESSION_TOKEN_PREFIX) && token.len() == SESSION_TOKEN_LEN
}
