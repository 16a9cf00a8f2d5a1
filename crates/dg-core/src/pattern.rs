//! Placeholder pattern templates.
//!
//! Operators configure permission and naming rules as regex templates with
//! `$(name)` placeholders, e.g. `DIR_$(tenant)_$(storage)_READER`. A template
//! is instantiated against a set of [`Placeholders`]; substituted values are
//! regex-escaped so a tenant called `a.b` only ever matches literally.
//!
//! A template referring to a placeholder with no value is *not applicable*
//! to that target and instantiates to `None`.

use std::collections::BTreeMap;
use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::error::{Error, Result};

const OPEN: &str = "$(";

/// Values available for substitution, keyed by lowercase placeholder name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    values: BTreeMap<String, String>,
}

impl Placeholders {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds a value when present.
    #[must_use]
    pub fn with_opt(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.set(name, value);
        }
        self
    }

    /// Sets a value in place.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Adds every entry of a property map that is not already set.
    #[must_use]
    pub fn with_defaults<'a>(mut self, properties: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        for (name, value) in properties {
            self.values
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| value.clone());
        }
        self
    }

    /// Looks up a value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed `$(placeholder)` regex template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PatternTemplate {
    /// Parses a template.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` on an unterminated or empty placeholder.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = raw;

        while let Some(start) = rest.find(OPEN) {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + OPEN.len()..];
            let end = after
                .find(')')
                .ok_or_else(|| Error::config(format!("unterminated placeholder in pattern '{raw}'")))?;
            let name = after[..end].trim();
            if name.is_empty() {
                return Err(Error::config(format!("empty placeholder in pattern '{raw}'")));
            }
            segments.push(Segment::Placeholder(name.to_ascii_lowercase()));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Parses a template and checks it compiles once instantiated.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if the template or the resulting
    /// regex is malformed.
    pub fn parse_checked(raw: &str) -> Result<Self> {
        let template = Self::parse(raw)?;
        let probe = template.placeholders().fold(Placeholders::new(), |acc, name| acc.with(name, "x"));
        if let Some(instantiated) = template.instantiate(&probe) {
            compile_anchored(&instantiated)?;
        }
        Ok(template)
    }

    /// Returns the template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Iterates over placeholder names.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Checks whether the template uses a placeholder.
    #[must_use]
    pub fn uses(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.placeholders().any(|p| p == name)
    }

    /// Substitutes placeholders, escaping the values.
    ///
    /// Returns `None` when a placeholder has no value.
    #[must_use]
    pub fn instantiate(&self, values: &Placeholders) -> Option<String> {
        let mut out = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => out.push_str(&regex::escape(values.get(name)?)),
            }
        }
        Some(out)
    }

    /// Instantiates and compiles in one step.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if the instantiated regex is invalid.
    pub fn compile(&self, values: &Placeholders) -> Result<Option<Regex>> {
        self.instantiate(values)
            .map(|pattern| compile_anchored(&pattern))
            .transpose()
    }
}

impl fmt::Display for PatternTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compiles a pattern anchored on both ends, case-insensitive.
///
/// ## Errors
///
/// Returns `Error::Configuration` if the pattern is not a valid regex.
pub fn compile_anchored(pattern: &str) -> Result<Regex> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(true)
        .build()
        .map_err(|e| Error::config(format!("invalid pattern '{pattern}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_literals_and_placeholders() {
        let template = PatternTemplate::parse("DIR_$(tenant)_$(Storage)_READER").unwrap();
        let names: Vec<&str> = template.placeholders().collect();
        assert_eq!(names, vec!["tenant", "storage"]);
        assert!(template.uses("STORAGE"));
        assert!(!template.uses("application"));
    }

    #[test]
    fn rejects_unterminated_placeholder() {
        assert!(PatternTemplate::parse("DIR_$(tenant_READER").is_err());
        assert!(PatternTemplate::parse("DIR_$()_READER").is_err());
    }

    #[test]
    fn missing_value_is_not_applicable() {
        let template = PatternTemplate::parse("DIR_$(tenant)_$(storage)_READER").unwrap();
        let values = Placeholders::new().with("tenant", "acme");
        assert_eq!(template.instantiate(&values), None);
    }

    #[test]
    fn values_are_escaped() {
        let template = PatternTemplate::parse("DIR_$(tenant)_READER").unwrap();
        let values = Placeholders::new().with("tenant", "a.b");
        let regex = template.compile(&values).unwrap().unwrap();
        assert!(regex.is_match("DIR_A.B_READER"));
        assert!(!regex.is_match("DIR_AXB_READER"));
    }

    #[test]
    fn compiled_patterns_are_anchored() {
        let regex = compile_anchored("DIR_ADMIN").unwrap();
        assert!(regex.is_match("dir_admin"));
        assert!(!regex.is_match("XDIR_ADMIN"));
        assert!(!regex.is_match("DIR_ADMIN_X"));
    }

    #[test]
    fn parse_checked_rejects_bad_regex() {
        assert!(PatternTemplate::parse_checked("DIR_($(tenant)").is_err());
        assert!(PatternTemplate::parse_checked("DIR_.*_$(tenant)").is_ok());
    }

    #[test]
    fn properties_fill_missing_values_only() {
        let mut props = BTreeMap::new();
        props.insert("tenant".to_string(), "ignored".to_string());
        props.insert("Suffix".to_string(), "ops".to_string());
        let values = Placeholders::new().with("tenant", "acme").with_defaults(&props);
        assert_eq!(values.get("tenant"), Some("acme"));
        assert_eq!(values.get("suffix"), Some("ops"));
    }
}
