//! Postal addresses.
//!
//! An address is stored as a separate child entry whose identifier is
//! derived from its content: the same lines always yield the same id, so
//! writing an address twice reuses the existing entry.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of address lines.
pub const MAX_LINES: usize = 7;

/// A multi-line postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    /// Content-derived identifier, set when read from a store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Address lines, top to bottom.
    pub lines: Vec<String>,
}

impl PostalAddress {
    /// Creates an address from its lines.
    ///
    /// Lines beyond [`MAX_LINES`] are dropped.
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            lines: lines.into_iter().map(Into::into).take(MAX_LINES).collect(),
        }
    }

    /// Returns the identifier derived from the lines.
    #[must_use]
    pub fn content_id(&self) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_OID, self.lines.join("\n").as_bytes()).to_string()
    }

    /// Returns a copy with the identifier filled from the content.
    #[must_use]
    pub fn identified(mut self) -> Self {
        self.id = Some(self.content_id());
        self
    }

    /// Checks whether every line is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_id() {
        let a = PostalAddress::new(["1 rue de la Paix", "75002 Paris"]);
        let b = PostalAddress::new(vec!["1 rue de la Paix".to_string(), "75002 Paris".to_string()]);
        assert_eq!(a.content_id(), b.content_id());
    }

    #[test]
    fn line_order_matters() {
        let a = PostalAddress::new(["x", "y"]);
        let b = PostalAddress::new(["y", "x"]);
        assert_ne!(a.content_id(), b.content_id());
    }

    #[test]
    fn caps_line_count() {
        let address = PostalAddress::new((0..10).map(|i| i.to_string()));
        assert_eq!(address.lines.len(), MAX_LINES);
    }

    #[test]
    fn blank_detection() {
        assert!(PostalAddress::new(["  ", ""]).is_blank());
        assert!(!PostalAddress::new(["", "x"]).is_blank());
        assert!(PostalAddress::default().is_blank());
    }
}
