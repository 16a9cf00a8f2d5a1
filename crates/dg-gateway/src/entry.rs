//! Raw directory entries.
//!
//! Attribute names are case-insensitive, as in LDAP. An [`AttributeSet`]
//! keeps the spelling used on first insertion and looks names up
//! regardless of case.

use std::collections::BTreeMap;

/// A named multi-valued attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name as first written.
    pub name: String,
    /// Values, in backend order.
    pub values: Vec<String>,
}

/// Case-insensitive multi-valued attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    entries: BTreeMap<String, Attribute>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl AttributeSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds values, builder style.
    #[must_use]
    pub fn with<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add(name, values);
        self
    }

    /// Appends values to an attribute, creating it if needed.
    /// Values already present are not duplicated.
    pub fn add<I, S>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let attribute = self.entries.entry(key(name)).or_insert_with(|| Attribute {
            name: name.to_string(),
            values: Vec::new(),
        });
        for value in values {
            let value = value.into();
            if !attribute.values.contains(&value) {
                attribute.values.push(value);
            }
        }
    }

    /// Replaces all values of an attribute. Empty values remove it.
    pub fn replace(&mut self, name: &str, values: Vec<String>) {
        if values.is_empty() {
            self.entries.remove(&key(name));
            return;
        }
        let entry = self.entries.entry(key(name)).or_insert_with(|| Attribute {
            name: name.to_string(),
            values: Vec::new(),
        });
        entry.values = values;
    }

    /// Removes some values; empty `values` removes the attribute.
    ///
    /// Returns `false` if nothing was removed.
    pub fn remove_values(&mut self, name: &str, values: &[String]) -> bool {
        let k = key(name);
        if values.is_empty() {
            return self.entries.remove(&k).is_some();
        }
        let Some(attribute) = self.entries.get_mut(&k) else {
            return false;
        };
        let before = attribute.values.len();
        attribute.values.retain(|v| !values.contains(v));
        let removed = attribute.values.len() != before;
        if attribute.values.is_empty() {
            self.entries.remove(&k);
        }
        removed
    }

    /// Removes an attribute entirely.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        self.entries.remove(&key(name)).map(|a| a.values)
    }

    /// Gets all values of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries.get(&key(name)).map(|a| a.values.as_slice())
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.first()).map(String::as_str)
    }

    /// Checks whether an attribute has at least one value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Checks whether an attribute holds a value, ignoring ASCII case.
    #[must_use]
    pub fn has_value(&self, name: &str, value: &str) -> bool {
        self.get(name)
            .is_some_and(|values| values.iter().any(|v| v.eq_ignore_ascii_case(value)))
    }

    /// Iterates over attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.values()
    }

    /// Returns attribute names as first written.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|a| a.name.as_str())
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keeps only the named attributes. An empty selection keeps everything.
    #[must_use]
    pub fn select(mut self, names: &[String]) -> Self {
        if names.is_empty() || names.iter().any(|n| n == "*") {
            return self;
        }
        let wanted: Vec<String> = names.iter().map(|n| key(n)).collect();
        self.entries.retain(|k, _| wanted.contains(k));
        self
    }
}

impl FromIterator<(String, Vec<String>)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (name, values) in iter {
            set.add(&name, values);
        }
        set
    }
}

/// A directory entry: distinguished name plus attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// Distinguished name.
    pub dn: String,
    /// Attributes.
    pub attributes: AttributeSet,
}

impl RawEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(dn: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            dn: dn.into(),
            attributes,
        }
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attributes.first(name)
    }
}
