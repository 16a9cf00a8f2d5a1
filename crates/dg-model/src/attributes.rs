//! Extension attributes.
//!
//! Every entity carries an open map of extension attributes next to its
//! typed fields. Values are restricted to a closed set of shapes so the
//! mapping engine can always encode and decode them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A value in the open attribute map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// A boolean flag.
    Bool(bool),
    /// A single text value.
    Text(String),
    /// An ordered list of text values.
    List(Vec<String>),
    /// A nested map.
    Map(Attributes),
}

impl AttrValue {
    /// Returns the text value, if this is a scalar text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a flag.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the values as a list; a scalar becomes a one-element list.
    #[must_use]
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::Text(s) => vec![s.clone()],
            Self::Bool(b) => vec![b.to_string()],
            Self::List(values) => values.clone(),
            Self::Map(_) => Vec::new(),
        }
    }

    /// Checks whether the value carries nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Bool(_) => false,
            Self::List(values) => values.is_empty(),
            Self::Map(map) => map.is_empty(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for AttrValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

/// Open map of extension attributes, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Gets a top-level value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    /// Gets a top-level text value.
    #[must_use]
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_text)
    }

    /// Inserts a top-level value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Removes a top-level value.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.0.remove(key)
    }

    /// Checks whether a top-level key is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterates over top-level entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Gets a value by path through nested maps.
    #[must_use]
    pub fn get_path(&self, path: &[&str]) -> Option<&AttrValue> {
        let (last, parents) = path.split_last()?;
        let mut map = self;
        for key in parents {
            match map.get(key)? {
                AttrValue::Map(nested) => map = nested,
                _ => return None,
            }
        }
        map.get(last)
    }

    /// Sets a value by path, creating intermediate maps as needed.
    ///
    /// A non-map value found on the way is replaced by a map.
    pub fn set_path(&mut self, path: &[&str], value: AttrValue) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut map = self;
        for key in parents {
            let slot = map
                .0
                .entry((*key).to_string())
                .or_insert_with(|| AttrValue::Map(Attributes::new()));
            if !matches!(slot, AttrValue::Map(_)) {
                *slot = AttrValue::Map(Attributes::new());
            }
            map = match slot {
                AttrValue::Map(nested) => nested,
                _ => return,
            };
        }
        map.insert(*last, value);
    }

    /// Removes a value by path. Emptied intermediate maps are pruned.
    pub fn remove_path(&mut self, path: &[&str]) -> Option<AttrValue> {
        match path {
            [] => None,
            [key] => self.remove(key),
            [key, rest @ ..] => {
                let AttrValue::Map(nested) = self.0.get_mut(*key)? else {
                    return None;
                };
                let removed = nested.remove_path(rest);
                if nested.is_empty() {
                    self.0.remove(*key);
                }
                removed
            }
        }
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = (&'a String, &'a AttrValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, AttrValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_paths_create_containers() {
        let mut attrs = Attributes::new();
        attrs.set_path(&["contact", "phone", "work"], AttrValue::from("+33 1"));

        assert_eq!(
            attrs.get_path(&["contact", "phone", "work"]),
            Some(&AttrValue::from("+33 1"))
        );
        assert!(matches!(attrs.get("contact"), Some(AttrValue::Map(_))));
    }

    #[test]
    fn set_path_replaces_scalar_parent() {
        let mut attrs = Attributes::new().with("contact", "inline");
        attrs.set_path(&["contact", "mail"], AttrValue::from("a@b.c"));
        assert_eq!(attrs.get_path(&["contact", "mail"]), Some(&AttrValue::from("a@b.c")));
    }

    #[test]
    fn remove_path_prunes_empty_maps() {
        let mut attrs = Attributes::new();
        attrs.set_path(&["a", "b"], AttrValue::from("x"));
        assert_eq!(attrs.remove_path(&["a", "b"]), Some(AttrValue::from("x")));
        assert!(attrs.is_empty());
        assert_eq!(attrs.remove_path(&["a", "b"]), None);
    }

    #[test]
    fn json_shape_is_untagged() {
        let attrs = Attributes::new()
            .with("room", "B12")
            .with("badges", vec!["a".to_string(), "b".to_string()])
            .with("external", true);
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json["room"], "B12");
        assert_eq!(json["badges"][1], "b");
        assert_eq!(json["external"], true);

        let back: Attributes = serde_json::from_value(json).unwrap();
        assert_eq!(back, attrs);
    }
}
