//! Session identifier minting
//!
//! **[APX-SESS-010]** Session ids must stay unique under concurrent
//! submissions. A bare timestamp collides at sub-millisecond request
//! rates, so ids combine a millisecond UTC timestamp with a random
//! 32-bit hex suffix. Directory creation remains the authoritative
//! collision check (see the session allocator); the suffix only makes
//! retries rare.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session identifier
///
/// Format: `<unix-millis>-<8 hex chars>`, e.g. `1756120533123-9f3a01cc`.
/// The id doubles as the session's directory name and URL path segment,
/// so it contains only `[0-9a-z-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Mint a fresh session id
    pub fn mint() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let suffix: u32 = rand::random();
        SessionId(format!("{}-{:08x}", millis, suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_shape() {
        let id = SessionId::mint();
        let (millis, suffix) = id.as_str().split_once('-').expect("separator present");
        assert!(millis.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_ids_are_url_safe() {
        let id = SessionId::mint();
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-'));
    }

    #[test]
    fn test_mint_does_not_repeat() {
        let ids: Vec<SessionId> = (0..16).map(|_| SessionId::mint()).collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
