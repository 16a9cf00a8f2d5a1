//! Continuation tokens of searches spanning several storages.
//!
//! The token is opaque to callers: URL-safe base64 of a small JSON object
//! naming the storage to resume and that storage's own token.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dg_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Position of an aggregated search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateToken {
    /// Index of the storage to resume, in tenant order.
    #[serde(rename = "s")]
    pub storage: usize,
    /// Token of that storage, if it was mid-way.
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<String>,
}

impl AggregateToken {
    /// Creates a token.
    #[must_use]
    pub const fn new(storage: usize, inner: Option<String>) -> Self {
        Self { storage, inner }
    }

    /// Encodes the token.
    #[must_use]
    pub fn encode(&self) -> String {
        // serializing two plain fields cannot fail
        let json = serde_json::to_vec(self).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodes a token; no token means the start.
    ///
    /// ## Errors
    ///
    /// Returns `Error::InvalidPageToken` if the token is malformed.
    pub fn decode(token: Option<&str>) -> Result<Self> {
        let Some(token) = token else {
            return Ok(Self::default());
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| Error::InvalidPageToken(token.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|_| Error::InvalidPageToken(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_opaque_and_reversible() {
        let token = AggregateToken::new(1, Some("42".into()));
        let encoded = token.encode();
        assert!(!encoded.contains('{'));
        assert_eq!(AggregateToken::decode(Some(&encoded)).unwrap(), token);
    }

    #[test]
    fn absent_token_is_the_start() {
        assert_eq!(AggregateToken::decode(None).unwrap(), AggregateToken::default());
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(matches!(
            AggregateToken::decode(Some("%%%")),
            Err(Error::InvalidPageToken(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"nope");
        assert!(matches!(
            AggregateToken::decode(Some(&not_json)),
            Err(Error::InvalidPageToken(_))
        ));
    }
}
