//! Attribute modifications sent on update.

use crate::entry::AttributeSet;

/// One attribute operation of a modify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    /// Add values to an attribute.
    Add {
        /// Attribute name.
        attribute: String,
        /// Values to add.
        values: Vec<String>,
    },
    /// Remove values; no values removes the whole attribute.
    Delete {
        /// Attribute name.
        attribute: String,
        /// Values to remove.
        values: Vec<String>,
    },
    /// Replace all values of an attribute.
    Replace {
        /// Attribute name.
        attribute: String,
        /// New values.
        values: Vec<String>,
    },
}

impl Modification {
    /// Creates an add operation.
    #[must_use]
    pub fn add(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self::Add {
            attribute: attribute.into(),
            values,
        }
    }

    /// Creates a delete of the whole attribute.
    #[must_use]
    pub fn delete_all(attribute: impl Into<String>) -> Self {
        Self::Delete {
            attribute: attribute.into(),
            values: Vec::new(),
        }
    }

    /// Creates a delete of specific values.
    #[must_use]
    pub fn delete(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self::Delete {
            attribute: attribute.into(),
            values,
        }
    }

    /// Creates a replace operation.
    #[must_use]
    pub fn replace(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self::Replace {
            attribute: attribute.into(),
            values,
        }
    }

    /// Returns the attribute this operation targets.
    #[must_use]
    pub fn attribute(&self) -> &str {
        match self {
            Self::Add { attribute, .. }
            | Self::Delete { attribute, .. }
            | Self::Replace { attribute, .. } => attribute,
        }
    }

    /// Applies the operation to an attribute set.
    pub fn apply(&self, attributes: &mut AttributeSet) {
        match self {
            Self::Add { attribute, values } => attributes.add(attribute, values.iter().cloned()),
            Self::Delete { attribute, values } => {
                attributes.remove_values(attribute, values);
            }
            Self::Replace { attribute, values } => attributes.replace(attribute, values.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_sequence() {
        let mut attrs = AttributeSet::new().with("mail", ["old@x.y"]).with("member", ["a", "b"]);

        Modification::replace("mail", vec!["new@x.y".to_string()]).apply(&mut attrs);
        Modification::delete("member", vec!["a".to_string()]).apply(&mut attrs);
        Modification::add("description", vec!["hello".to_string()]).apply(&mut attrs);

        assert_eq!(attrs.first("mail"), Some("new@x.y"));
        assert_eq!(attrs.get("member").unwrap(), ["b"]);
        assert_eq!(attrs.first("description"), Some("hello"));

        Modification::delete_all("member").apply(&mut attrs);
        assert!(!attrs.contains("member"));
    }

    #[test]
    fn attribute_accessor() {
        assert_eq!(Modification::delete_all("cn").attribute(), "cn");
    }
}
