//! Search filters.
//!
//! A [`Filter`] is a backend-neutral predicate tree. Gateways render it
//! for their protocol; [`Filter::matches`] evaluates it in process.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::entry::AttributeSet;

/// Wildcard character in substring patterns.
pub const WILDCARD: char = '*';

/// A search predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// All sub-filters match. An empty conjunction matches everything.
    And(Vec<Filter>),
    /// At least one sub-filter matches. An empty disjunction matches nothing.
    Or(Vec<Filter>),
    /// The sub-filter does not match.
    Not(Box<Filter>),
    /// The attribute holds the value (case-insensitive).
    Equals {
        /// Attribute name.
        attribute: String,
        /// Expected value.
        value: String,
    },
    /// The attribute holds a value matching a `*` wildcard pattern.
    Substring {
        /// Attribute name.
        attribute: String,
        /// Pattern, `*` matching any run of characters.
        pattern: String,
    },
    /// The attribute has at least one value.
    Present(String),
}

impl Filter {
    /// Matches every entry.
    #[must_use]
    pub const fn all() -> Self {
        Self::And(Vec::new())
    }

    /// Creates an equality filter.
    #[must_use]
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates a substring filter.
    #[must_use]
    pub fn substring(attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Substring {
            attribute: attribute.into(),
            pattern: pattern.into(),
        }
    }

    /// Creates a presence filter.
    #[must_use]
    pub fn present(attribute: impl Into<String>) -> Self {
        Self::Present(attribute.into())
    }

    /// Negates a filter.
    #[must_use]
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Conjunction, collapsing single-element lists.
    #[must_use]
    pub fn and(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Self::And(filters)
    }

    /// Disjunction, collapsing single-element lists.
    #[must_use]
    pub fn or(mut filters: Vec<Filter>) -> Self {
        if filters.len() == 1 {
            return filters.remove(0);
        }
        Self::Or(filters)
    }

    /// Checks whether this filter matches everything.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        matches!(self, Self::And(filters) if filters.is_empty())
    }

    /// Evaluates the filter against an attribute set.
    ///
    /// Equality ignores case. Substring patterns additionally ignore
    /// diacritics.
    #[must_use]
    pub fn matches(&self, attributes: &AttributeSet) -> bool {
        match self {
            Self::And(filters) => filters.iter().all(|f| f.matches(attributes)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(attributes)),
            Self::Not(filter) => !filter.matches(attributes),
            Self::Equals { attribute, value } => {
                let expected = value.to_lowercase();
                attributes
                    .get(attribute)
                    .is_some_and(|values| values.iter().any(|v| v.to_lowercase() == expected))
            }
            Self::Substring { attribute, pattern } => {
                let pattern = fold(pattern);
                attributes
                    .get(attribute)
                    .is_some_and(|values| values.iter().any(|v| wildcard_match(&pattern, &fold(v))))
            }
            Self::Present(attribute) => attributes.contains(attribute),
        }
    }
}

/// Lowercases and strips diacritics.
#[must_use]
pub fn fold(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Matches `text` against a `*` wildcard pattern.
#[must_use]
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split(WILDCARD).collect();
    let Some((first, rest)) = parts.split_first() else {
        return text.is_empty();
    };
    let Some(remaining) = text.strip_prefix(first) else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return remaining.is_empty();
    };

    let mut cursor = remaining;
    for part in middle {
        match cursor.find(part) {
            Some(pos) => cursor = &cursor[pos + part.len()..],
            None => return false,
        }
    }
    cursor.len() >= last.len() && cursor.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> AttributeSet {
        AttributeSet::new()
            .with("uid", ["jdoe"])
            .with("sn", ["Dupré"])
            .with("givenName", ["Jean-Luc"])
            .with("mail", ["JDoe@Example.com"])
    }

    #[test]
    fn equality_ignores_case() {
        assert!(Filter::equals("mail", "jdoe@example.com").matches(&person()));
        assert!(!Filter::equals("mail", "other@example.com").matches(&person()));
        assert!(!Filter::equals("missing", "x").matches(&person()));
    }

    #[test]
    fn substring_folds_diacritics() {
        assert!(Filter::substring("sn", "dupre").matches(&person()));
        assert!(Filter::substring("sn", "*PR*").matches(&person()));
        assert!(Filter::substring("givenName", "jean*luc").matches(&person()));
        assert!(!Filter::substring("givenName", "luc*jean").matches(&person()));
    }

    #[test]
    fn boolean_combinators() {
        let filter = Filter::and(vec![
            Filter::present("uid"),
            Filter::or(vec![Filter::equals("uid", "nobody"), Filter::substring("sn", "dup*")]),
            Filter::not(Filter::present("userPassword")),
        ]);
        assert!(filter.matches(&person()));
        assert!(Filter::all().matches(&person()));
        assert!(!Filter::Or(Vec::new()).matches(&person()));
    }

    #[test]
    fn single_element_lists_collapse() {
        assert_eq!(Filter::and(vec![Filter::present("uid")]), Filter::present("uid"));
        assert!(Filter::and(Vec::new()).is_match_all());
    }

    #[test]
    fn wildcard_edges() {
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("a*a", "aa"));
        assert!(!wildcard_match("a*a", "a"));
        assert!(wildcard_match("*b*", "abc"));
        assert!(wildcard_match("abc", "abc"));
        assert!(!wildcard_match("abc", "abcd"));
    }

    #[test]
    fn fold_strips_marks() {
        assert_eq!(fold("Élodie Müller"), "elodie muller");
    }
}
