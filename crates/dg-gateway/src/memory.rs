//! In-process Entry Gateway.
//!
//! Entries live in a sorted map keyed by normalized DN. Search pages are
//! cut from the sorted result list; the cookie is the offset of the next
//! page. Credentials set through [`EntryGateway::set_credential`] are kept
//! verbatim in `userPassword` and checked by exact comparison.
//!
//! Reads carry a computed `memberOf` attribute listing the groups whose
//! `uniqueMember` or `member` values name the entry, the way a directory
//! server with a member-of overlay reports it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use dg_core::{GatewayError, GatewayResult};
use parking_lot::RwLock;

use crate::dn;
use crate::entry::RawEntry;
use crate::gateway::{EntryGateway, SearchPage, SearchRequest, SearchScope};
use crate::modification::Modification;
use crate::{MEMBER_OF, USER_PASSWORD};

const MEMBER_ATTRIBUTES: [&str; 2] = ["uniqueMember", "member"];

/// Entry Gateway backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    entries: RwLock<BTreeMap<String, RawEntry>>,
}

impl MemoryGateway {
    /// Creates an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a gateway seeded with entries.
    #[must_use]
    pub fn with_entries(entries: impl IntoIterator<Item = RawEntry>) -> Self {
        let gateway = Self::new();
        for entry in entries {
            gateway.insert(entry);
        }
        gateway
    }

    /// Inserts or replaces an entry without checks.
    pub fn insert(&self, entry: RawEntry) {
        self.entries.write().insert(dn::normalize(&entry.dn), entry);
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Checks whether no entry is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn in_scope(entry_key: &str, base: &str, scope: SearchScope) -> bool {
        match scope {
            SearchScope::Base => entry_key == base,
            SearchScope::OneLevel => dn::is_child_of(entry_key, base),
            SearchScope::Subtree => dn::is_within(entry_key, base),
        }
    }
}

/// Copies an entry and adds its computed `memberOf` values.
fn with_member_of(entries: &BTreeMap<String, RawEntry>, key: &str, entry: &RawEntry) -> RawEntry {
    let groups: Vec<String> = entries
        .values()
        .filter(|candidate| {
            MEMBER_ATTRIBUTES.iter().any(|attribute| {
                candidate
                    .attributes
                    .get(attribute)
                    .is_some_and(|members| members.iter().any(|m| dn::normalize(m) == key))
            })
        })
        .map(|group| group.dn.clone())
        .collect();

    let mut entry = entry.clone();
    if !groups.is_empty() {
        entry.attributes.replace(MEMBER_OF, groups);
    }
    entry
}

fn parse_cookie(cookie: Option<&str>) -> GatewayResult<usize> {
    cookie.map_or(Ok(0), |c| {
        c.parse()
            .map_err(|_| GatewayError::InvalidRequest(format!("malformed paging cookie '{c}'")))
    })
}

#[async_trait]
impl EntryGateway for MemoryGateway {
    fn backend_type(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, dn: &str) -> GatewayResult<Option<RawEntry>> {
        let key = dn::normalize(dn);
        let entries = self.entries.read();
        Ok(entries.get(&key).map(|entry| with_member_of(&entries, &key, entry)))
    }

    async fn search(&self, request: &SearchRequest) -> GatewayResult<SearchPage> {
        let offset = parse_cookie(request.cookie.as_deref())?;
        let page_size = request.page_size.max(1);
        let base = dn::normalize(&request.base);

        let entries = self.entries.read();
        let mut matching = entries
            .iter()
            .filter(|(key, _)| Self::in_scope(key, &base, request.scope))
            .map(|(key, entry)| with_member_of(&entries, key, entry))
            .filter(|entry| request.filter.matches(&entry.attributes))
            .skip(offset);

        let page: Vec<RawEntry> = matching
            .by_ref()
            .take(page_size)
            .map(|entry| RawEntry::new(entry.dn, entry.attributes.select(&request.attributes)))
            .collect();
        let has_more = matching.next().is_some();

        Ok(SearchPage {
            cookie: has_more.then(|| (offset + page.len()).to_string()),
            entries: page,
        })
    }

    async fn add(&self, entry: RawEntry) -> GatewayResult<()> {
        let key = dn::normalize(&entry.dn);
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(GatewayError::AlreadyExists(entry.dn));
        }
        tracing::debug!(dn = %entry.dn, "memory add");
        entries.insert(key, entry);
        Ok(())
    }

    async fn modify(&self, dn: &str, modifications: &[Modification]) -> GatewayResult<()> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&dn::normalize(dn))
            .ok_or_else(|| GatewayError::NoSuchEntry(dn.to_string()))?;
        for modification in modifications {
            modification.apply(&mut entry.attributes);
        }
        tracing::debug!(dn, operations = modifications.len(), "memory modify");
        Ok(())
    }

    async fn delete(&self, dn: &str) -> GatewayResult<()> {
        let key = dn::normalize(dn);
        let mut entries = self.entries.write();
        if !entries.contains_key(&key) {
            return Err(GatewayError::NoSuchEntry(dn.to_string()));
        }
        if entries.keys().any(|k| dn::is_child_of(k, &key)) {
            return Err(GatewayError::protocol(format!("entry has children: {dn}")));
        }
        entries.remove(&key);
        tracing::debug!(dn, "memory delete");
        Ok(())
    }

    async fn check_credential(&self, dn: &str, credential: &str) -> GatewayResult<bool> {
        let entries = self.entries.read();
        Ok(entries
            .get(&dn::normalize(dn))
            .and_then(|entry| entry.attributes.get(USER_PASSWORD))
            .is_some_and(|stored| stored.iter().any(|s| s == credential)))
    }

    async fn set_credential(&self, dn: &str, credential: &str) -> GatewayResult<()> {
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&dn::normalize(dn))
            .ok_or_else(|| GatewayError::NoSuchEntry(dn.to_string()))?;
        entry
            .attributes
            .replace(USER_PASSWORD, vec![credential.to_string()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::AttributeSet;
    use crate::filter::Filter;

    fn person(uid: &str) -> RawEntry {
        RawEntry::new(
            format!("uid={uid},ou=people,o=acme"),
            AttributeSet::new()
                .with("objectClass", ["inetOrgPerson"])
                .with("uid", [uid])
                .with("sn", [uid.to_uppercase()]),
        )
    }

    fn seeded(count: usize) -> MemoryGateway {
        let gateway = MemoryGateway::with_entries((0..count).map(|i| person(&format!("user{i:02}"))));
        gateway.insert(RawEntry::new("ou=people,o=acme", AttributeSet::new().with("ou", ["people"])));
        gateway
    }

    #[tokio::test]
    async fn add_then_get() {
        let gateway = MemoryGateway::new();
        gateway.add(person("jdoe")).await.unwrap();

        let entry = gateway.get("UID=jdoe,ou=People,o=acme").await.unwrap().unwrap();
        assert_eq!(entry.first("uid"), Some("jdoe"));
        assert!(matches!(
            gateway.add(person("jdoe")).await,
            Err(GatewayError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn paging_walks_all_entries() {
        let gateway = seeded(25);
        let request = SearchRequest::new("ou=people,o=acme", Filter::present("uid")).with_page_size(10);

        let first = gateway.search(&request).await.unwrap();
        assert_eq!(first.entries.len(), 10);
        assert_eq!(first.cookie.as_deref(), Some("10"));

        let all = gateway.search_all(&request).await.unwrap();
        assert_eq!(all.len(), 25);
    }

    #[tokio::test]
    async fn exact_page_has_no_cookie() {
        let gateway = seeded(10);
        let request = SearchRequest::new("ou=people,o=acme", Filter::all()).with_page_size(10);
        let page = gateway.search(&request).await.unwrap();
        assert_eq!(page.entries.len(), 10);
        assert_eq!(page.cookie, None);
    }

    #[tokio::test]
    async fn scope_is_respected() {
        let gateway = seeded(2);
        let base = SearchRequest::new("ou=people,o=acme", Filter::all()).with_scope(SearchScope::Base);
        assert_eq!(gateway.search(&base).await.unwrap().entries.len(), 1);

        let subtree = SearchRequest::new("o=acme", Filter::all()).with_scope(SearchScope::Subtree);
        assert_eq!(gateway.search(&subtree).await.unwrap().entries.len(), 3);
    }

    #[tokio::test]
    async fn malformed_cookie_is_rejected() {
        let gateway = seeded(1);
        let request = SearchRequest::new("ou=people,o=acme", Filter::all()).with_cookie(Some("abc".into()));
        assert!(matches!(
            gateway.search(&request).await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn modify_and_delete_unknown_entries() {
        let gateway = MemoryGateway::new();
        assert!(gateway.modify("uid=x,o=acme", &[]).await.unwrap_err().is_no_such_entry());
        assert!(gateway.delete("uid=x,o=acme").await.unwrap_err().is_no_such_entry());
    }

    #[tokio::test]
    async fn refuses_to_delete_non_leaf() {
        let gateway = seeded(1);
        assert!(gateway.delete("ou=people,o=acme").await.is_err());
        gateway.delete("uid=user00,ou=people,o=acme").await.unwrap();
        gateway.delete("ou=people,o=acme").await.unwrap();
        assert!(gateway.is_empty());
    }

    #[tokio::test]
    async fn member_of_is_computed_on_read() {
        let gateway = seeded(2);
        gateway.insert(RawEntry::new(
            "cn=app_readers,ou=app,o=acme",
            AttributeSet::new()
                .with("cn", ["app_readers"])
                .with("uniqueMember", ["UID=user00,ou=people,o=acme"]),
        ));

        let member = gateway.get("uid=user00,ou=people,o=acme").await.unwrap().unwrap();
        assert_eq!(
            member.attributes.get(MEMBER_OF),
            Some(&["cn=app_readers,ou=app,o=acme".to_string()][..])
        );
        let other = gateway.get("uid=user01,ou=people,o=acme").await.unwrap().unwrap();
        assert!(!other.attributes.contains(MEMBER_OF));

        let request = SearchRequest::new("ou=people,o=acme", Filter::present(MEMBER_OF));
        assert_eq!(gateway.search(&request).await.unwrap().entries.len(), 1);
    }

    #[tokio::test]
    async fn credentials_are_compared_verbatim() {
        let gateway = seeded(1);
        let dn = "uid=user00,ou=people,o=acme";

        assert!(!gateway.check_credential(dn, "secret").await.unwrap());
        gateway.set_credential(dn, "secret").await.unwrap();
        assert!(gateway.check_credential(dn, "secret").await.unwrap());
        assert!(!gateway.check_credential(dn, "Secret").await.unwrap());
        assert!(!gateway.check_credential("uid=ghost,o=acme", "secret").await.unwrap());
    }
}
