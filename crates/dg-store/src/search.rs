//! Search model: probe entities turned into gateway filters.
//!
//! A search takes an entity whose set fields are the constraints. Unset
//! fields, the identifier left empty, read-only derived fields and
//! booleans left `false` constrain nothing.

use dg_gateway::filter::fold;
use dg_gateway::Filter;
use dg_mapping::{AttributeCodec, MappingType, Mapped};
use dg_model::EntityKind;

/// Wildcard in search values.
pub const WILDCARD: char = '*';

/// Punctuation collapsed to a wildcard by fuzzy search.
const FUZZY_SEPARATORS: &[char] = &['-', '\'', '\u{2019}', '.', ','];

/// Model paths compared fuzzily, per kind.
#[must_use]
pub fn fuzzy_paths(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::User => &[
            "lastName",
            "firstName",
            "attributes.common_name",
            "attributes.display_name",
        ],
        EntityKind::Organization => &["attributes.name", "attributes.description"],
        EntityKind::Group | EntityKind::Application => &[],
    }
}

/// How probe constraints combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// Every constraint must hold.
    #[default]
    All,
    /// Any constraint may hold.
    Any,
}

/// Page size and continuation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum results; the storage default when absent.
    pub size: Option<usize>,
    /// Token returned with the previous page.
    pub token: Option<String>,
}

/// A search request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    /// Paging.
    pub page: PageRequest,
    /// Constraint combination.
    pub matching: MatchMode,
    /// Normalize name-like fields.
    pub fuzzy: bool,
}

impl SearchQuery {
    /// Creates a query matching all constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_size(mut self, size: usize) -> Self {
        self.page.size = Some(size);
        self
    }

    /// Continues from a previous page.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.page.token = token;
        self
    }

    /// Matches any constraint.
    #[must_use]
    pub const fn any(mut self) -> Self {
        self.matching = MatchMode::Any;
        self
    }

    /// Enables fuzzy comparison of name-like fields.
    #[must_use]
    pub const fn fuzzy(mut self) -> Self {
        self.fuzzy = true;
        self
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Results of this page.
    pub results: Vec<T>,
    /// Token for the next page; `None` when exhausted.
    pub next_token: Option<String>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            results: Vec::new(),
            next_token: None,
        }
    }
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(results: Vec<T>, next_token: Option<String>) -> Self {
        Self { results, next_token }
    }

    /// Checks whether more pages follow.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.next_token.is_some()
    }

    /// Number of results on this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Checks whether this page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Normalizes a value for fuzzy comparison.
///
/// Case and diacritics are folded; punctuation and whitespace runs become
/// a single wildcard, and the result is wrapped in wildcards.
#[must_use]
pub fn fuzzy_pattern(value: &str) -> String {
    let mut out = String::from(WILDCARD);
    for c in fold(value).chars() {
        if c.is_whitespace() || FUZZY_SEPARATORS.contains(&c) {
            if !out.ends_with(WILDCARD) {
                out.push(WILDCARD);
            }
        } else {
            out.push(c);
        }
    }
    if !out.ends_with(WILDCARD) {
        out.push(WILDCARD);
    }
    out
}

/// Builds the gateway filter of a probe entity.
#[must_use]
pub fn probe_filter<T: Mapped>(codec: &AttributeCodec, probe: &T, query: &SearchQuery) -> Filter {
    let fuzzy = if query.fuzzy { fuzzy_paths(T::KIND) } else { &[] };
    let mut terms = Vec::new();

    for mapping in codec.catalog().for_kind(T::KIND) {
        if matches!(mapping.mapping_type, MappingType::Exists | MappingType::Timestamp) {
            continue;
        }
        let (values, _) = codec.encode_field(probe, mapping);
        let path = mapping.path.to_string();
        for value in values {
            if mapping.mapping_type == MappingType::Boolean && !value.eq_ignore_ascii_case("TRUE") {
                continue;
            }
            let term = if fuzzy.contains(&path.as_str()) {
                Filter::substring(&mapping.attribute, fuzzy_pattern(&value))
            } else if value.contains(WILDCARD) {
                Filter::substring(&mapping.attribute, value)
            } else {
                Filter::equals(&mapping.attribute, value)
            };
            terms.push(term);
        }
    }

    let kind = codec.kind_filter(T::KIND);
    if terms.is_empty() {
        return kind;
    }
    let constraints = match query.matching {
        MatchMode::All => Filter::and(terms),
        MatchMode::Any => Filter::or(terms),
    };
    Filter::and(vec![kind, constraints])
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dg_core::config::StorageConfig;
    use dg_gateway::AttributeSet;
    use dg_mapping::{Catalog, DirectoryLayout};
    use dg_model::{Application, Organization, User};

    use super::*;

    fn codec() -> AttributeCodec {
        let storage: StorageConfig = toml::from_str(
            r#"
name = "main"
backend = { type = "memory" }
users_dn = "ou=people,o=acme"
organizations_dn = "ou=orgs,o=acme"
applications_dn = "ou=applications,o=acme"
"#,
        )
        .unwrap();
        AttributeCodec::new(
            Arc::new(Catalog::builtin().unwrap()),
            DirectoryLayout::from_storage(&storage),
        )
    }

    fn person(attrs: &[(&str, &str)]) -> AttributeSet {
        attrs
            .iter()
            .fold(AttributeSet::new().with("objectClass", ["inetOrgPerson"]), |set, (name, value)| {
                set.with(name, [*value])
            })
    }

    #[test]
    fn fuzzy_patterns_fold_and_collapse() {
        assert_eq!(fuzzy_pattern("Dupré"), "*dupre*");
        assert_eq!(fuzzy_pattern("Jean-Luc"), "*jean*luc*");
        assert_eq!(fuzzy_pattern("O’Neil  Jr."), "*o*neil*jr*");
        assert_eq!(fuzzy_pattern(""), "*");
    }

    #[test]
    fn empty_probe_selects_the_kind() {
        let filter = probe_filter(&codec(), &User::new(""), &SearchQuery::new());
        assert!(filter.matches(&person(&[("uid", "jdoe")])));
        assert!(!filter.matches(&AttributeSet::new().with("objectClass", ["organization"])));
    }

    #[test]
    fn all_requires_every_constraint() {
        let probe = User::new("").with_mail("jdoe@acme.org").with_last_name("Doe");
        let filter = probe_filter(&codec(), &probe, &SearchQuery::new());

        assert!(filter.matches(&person(&[("mail", "JDOE@acme.org"), ("sn", "Doe")])));
        assert!(!filter.matches(&person(&[("mail", "jdoe@acme.org"), ("sn", "Smith")])));
    }

    #[test]
    fn any_accepts_one_constraint() {
        let probe = User::new("").with_mail("jdoe@acme.org").with_last_name("Doe");
        let filter = probe_filter(&codec(), &probe, &SearchQuery::new().any());

        assert!(filter.matches(&person(&[("mail", "jdoe@acme.org"), ("sn", "Smith")])));
        assert!(!filter.matches(&person(&[("mail", "other@acme.org"), ("sn", "Smith")])));
    }

    #[test]
    fn fuzzy_applies_to_name_fields_only() {
        let probe = User::new("").with_last_name("dupre").with_mail("j@acme.org");
        let filter = probe_filter(&codec(), &probe, &SearchQuery::new().fuzzy());

        assert!(filter.matches(&person(&[("sn", "Dupré-Martin"), ("mail", "j@acme.org")])));
        assert!(!filter.matches(&person(&[("sn", "Dupré"), ("mail", "xj@acme.org")])));
    }

    #[test]
    fn explicit_wildcards_become_substrings() {
        let probe = User::new("").with_mail("*@acme.org");
        let filter = probe_filter(&codec(), &probe, &SearchQuery::new());
        assert!(filter.matches(&person(&[("mail", "anyone@acme.org")])));
        assert!(!filter.matches(&person(&[("mail", "anyone@other.org")])));
    }

    #[test]
    fn references_constrain_by_dn() {
        let probe = User::new("").with_organization(Organization::new("acme"));
        let filter = probe_filter(&codec(), &probe, &SearchQuery::new());
        assert!(filter.matches(&person(&[("organizationRef", "uid=acme,ou=orgs,o=acme")])));
        assert!(!filter.matches(&person(&[("organizationRef", "uid=other,ou=orgs,o=acme")])));
    }

    #[test]
    fn false_flags_do_not_constrain() {
        let codec = codec();
        let app = |flag: &str| {
            AttributeSet::new()
                .with("objectClass", ["organizationalUnit"])
                .with("selfManagedGroups", [flag])
        };

        let unconstrained = probe_filter(&codec, &Application::new(""), &SearchQuery::new());
        assert!(unconstrained.matches(&app("FALSE")));

        let mut probe = Application::new("");
        probe.self_managed_groups = true;
        let constrained = probe_filter(&codec, &probe, &SearchQuery::new());
        assert!(constrained.matches(&app("TRUE")));
        assert!(!constrained.matches(&app("FALSE")));
    }
}
