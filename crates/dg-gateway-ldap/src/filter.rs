//! Rendering of search filters to RFC 4515 strings.

use dg_gateway::filter::WILDCARD;
use dg_gateway::Filter;

/// Characters RFC 4515 requires escaped in assertion values.
const ESCAPED: [char; 5] = ['\\', '*', '(', ')', '\0'];

/// Escapes an assertion value as `\xx` hex pairs.
#[must_use]
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if ESCAPED.contains(&c) {
            out.push_str(&format!("\\{:02x}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Renders a filter as an LDAP filter string.
///
/// An empty conjunction becomes `(objectClass=*)` and an empty disjunction
/// its negation, since not every server accepts `(&)` and `(|)`.
#[must_use]
pub fn render(filter: &Filter) -> String {
    match filter {
        Filter::And(filters) if filters.is_empty() => "(objectClass=*)".to_string(),
        Filter::Or(filters) if filters.is_empty() => "(!(objectClass=*))".to_string(),
        Filter::And(filters) => format!("(&{})", render_all(filters)),
        Filter::Or(filters) => format!("(|{})", render_all(filters)),
        Filter::Not(inner) => format!("(!{})", render(inner)),
        Filter::Equals { attribute, value } => format!("({attribute}={})", escape_value(value)),
        Filter::Substring { attribute, pattern } => {
            let parts: Vec<String> = pattern.split(WILDCARD).map(escape_value).collect();
            format!("({attribute}={})", parts.join("*"))
        }
        Filter::Present(attribute) => format!("({attribute}=*)"),
    }
}

fn render_all(filters: &[Filter]) -> String {
    filters.iter().map(render).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_nested_filters() {
        let filter = Filter::and(vec![
            Filter::equals("objectClass", "inetOrgPerson"),
            Filter::or(vec![
                Filter::substring("sn", "*dup*"),
                Filter::not(Filter::present("mail")),
            ]),
        ]);
        assert_eq!(
            render(&filter),
            "(&(objectClass=inetOrgPerson)(|(sn=*dup*)(!(mail=*))))"
        );
    }

    #[test]
    fn escapes_values_but_keeps_wildcards() {
        assert_eq!(render(&Filter::equals("cn", "a*(b)")), "(cn=a\\2a\\28b\\29)");
        assert_eq!(render(&Filter::substring("cn", "a(*")), "(cn=a\\28*)");
    }

    #[test]
    fn escapes_reserved_characters() {
        assert_eq!(escape_value("user\\name"), "user\\5cname");
        assert_eq!(escape_value("nul\0"), "nul\\00");
        assert_eq!(escape_value("plain"), "plain");
    }

    #[test]
    fn empty_lists() {
        assert_eq!(render(&Filter::all()), "(objectClass=*)");
        assert_eq!(render(&Filter::Or(Vec::new())), "(!(objectClass=*))");
    }
}
