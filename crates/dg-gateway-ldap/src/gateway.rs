//! Entry Gateway over LDAPS.
//!
//! ## Security Requirements
//!
//! - All connections use LDAPS (TLS from connection start)
//! - Passwords are never logged

use std::collections::HashSet;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use dg_core::{GatewayError, GatewayResult};
use dg_gateway::{EntryGateway, Modification, RawEntry, SearchPage, SearchRequest, SearchScope};
use dg_gateway::entry::AttributeSet;
use ldap3::controls::{Control, ControlType, PagedResults};
use ldap3::exop::PasswordModify;
use ldap3::{Mod, Scope, SearchEntry, SearchResult};

use crate::config::LdapConfig;
use crate::connection::LdapConnectionPool;
use crate::error::{LdapError, LdapResult, RC_NO_SUCH_OBJECT};
use crate::filter::render;

/// Entry Gateway backed by an LDAPS directory.
pub struct LdapGateway {
    pool: LdapConnectionPool,
}

impl LdapGateway {
    /// Creates a gateway. The configuration is validated again.
    ///
    /// ## Errors
    ///
    /// Returns an error if the connection URL does not use LDAPS or the
    /// configuration is incomplete.
    pub fn new(config: LdapConfig) -> LdapResult<Self> {
        config.validate()?;
        Ok(Self {
            pool: LdapConnectionPool::new(config),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        self.pool.config()
    }
}

fn to_scope(scope: SearchScope) -> Scope {
    match scope {
        SearchScope::Base => Scope::Base,
        SearchScope::OneLevel => Scope::OneLevel,
        SearchScope::Subtree => Scope::Subtree,
    }
}

fn to_entry(entry: SearchEntry) -> RawEntry {
    let attributes: AttributeSet = entry.attrs.into_iter().collect();
    RawEntry::new(entry.dn, attributes)
}

fn value_set(values: &[String]) -> HashSet<&str> {
    values.iter().map(String::as_str).collect()
}

fn to_mod(modification: &Modification) -> Mod<&str> {
    match modification {
        Modification::Add { attribute, values } => Mod::Add(attribute.as_str(), value_set(values)),
        Modification::Delete { attribute, values } => Mod::Delete(attribute.as_str(), value_set(values)),
        Modification::Replace { attribute, values } => Mod::Replace(attribute.as_str(), value_set(values)),
    }
}

fn check(dn: &str, result: ldap3::LdapResult) -> LdapResult<()> {
    if result.rc == 0 {
        Ok(())
    } else {
        Err(LdapError::Operation {
            dn: dn.to_string(),
            code: result.rc,
            message: result.text,
        })
    }
}

fn decode_cookie(cookie: Option<&str>) -> GatewayResult<Vec<u8>> {
    cookie.map_or(Ok(Vec::new()), |c| {
        URL_SAFE_NO_PAD
            .decode(c)
            .map_err(|_| GatewayError::InvalidRequest(format!("malformed paging cookie '{c}'")))
    })
}

#[async_trait]
impl EntryGateway for LdapGateway {
    fn backend_type(&self) -> &'static str {
        "ldap"
    }

    async fn get(&self, dn: &str) -> GatewayResult<Option<RawEntry>> {
        let mut conn = self.pool.get().await?;
        let result = self
            .pool
            .timed(async {
                let SearchResult(entries, result) = conn
                    .ldap_mut()
                    .search(dn, Scope::Base, "(objectClass=*)", vec!["*", "+"])
                    .await?;
                Ok::<_, LdapError>((entries, result))
            })
            .await?;

        let (entries, status) = result;
        if status.rc == RC_NO_SUCH_OBJECT {
            return Ok(None);
        }
        check(dn, status)?;
        Ok(entries.into_iter().next().map(SearchEntry::construct).map(to_entry))
    }

    async fn search(&self, request: &SearchRequest) -> GatewayResult<SearchPage> {
        let filter = render(&request.filter);
        let cookie = decode_cookie(request.cookie.as_deref())?;
        let size = i32::try_from(request.page_size.max(1)).unwrap_or(i32::MAX);
        let attributes: Vec<&str> = if request.attributes.is_empty() {
            vec!["*", "+"]
        } else {
            request.attributes.iter().map(String::as_str).collect()
        };

        tracing::debug!(base = %request.base, filter = %filter, size, "LDAP search");

        let mut conn = self.pool.get().await?;
        let (entries, status) = self
            .pool
            .timed(async {
                let SearchResult(entries, result) = conn
                    .ldap_mut()
                    .with_controls(PagedResults { size, cookie })
                    .search(&request.base, to_scope(request.scope), &filter, attributes)
                    .await?;
                Ok::<_, LdapError>((entries, result))
            })
            .await?;

        if status.rc == RC_NO_SUCH_OBJECT {
            return Ok(SearchPage::default());
        }

        let next = status.ctrls.iter().find_map(|ctrl| match ctrl {
            Control(Some(ControlType::PagedResults), raw) => {
                let paged: PagedResults = raw.parse();
                (!paged.cookie.is_empty()).then(|| URL_SAFE_NO_PAD.encode(&paged.cookie))
            }
            _ => None,
        });
        check(&request.base, status)?;

        Ok(SearchPage {
            entries: entries
                .into_iter()
                .map(SearchEntry::construct)
                .map(to_entry)
                .collect(),
            cookie: next,
        })
    }

    async fn add(&self, entry: RawEntry) -> GatewayResult<()> {
        let attributes: Vec<(&str, HashSet<&str>)> = entry
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), value_set(&a.values)))
            .collect();

        let mut conn = self.pool.get().await?;
        let status = self
            .pool
            .timed(async { Ok::<_, LdapError>(conn.ldap_mut().add(&entry.dn, attributes).await?) })
            .await?;
        check(&entry.dn, status)?;
        tracing::debug!(dn = %entry.dn, "LDAP add");
        Ok(())
    }

    async fn modify(&self, dn: &str, modifications: &[Modification]) -> GatewayResult<()> {
        if modifications.is_empty() {
            return Ok(());
        }
        let mods: Vec<Mod<&str>> = modifications.iter().map(to_mod).collect();

        let mut conn = self.pool.get().await?;
        let status = self
            .pool
            .timed(async { Ok::<_, LdapError>(conn.ldap_mut().modify(dn, mods).await?) })
            .await?;
        check(dn, status)?;
        tracing::debug!(dn, operations = modifications.len(), "LDAP modify");
        Ok(())
    }

    async fn delete(&self, dn: &str) -> GatewayResult<()> {
        let mut conn = self.pool.get().await?;
        let status = self
            .pool
            .timed(async { Ok::<_, LdapError>(conn.ldap_mut().delete(dn).await?) })
            .await?;
        check(dn, status)?;
        tracing::debug!(dn, "LDAP delete");
        Ok(())
    }

    async fn check_credential(&self, dn: &str, credential: &str) -> GatewayResult<bool> {
        Ok(self.pool.authenticate(dn, credential).await?)
    }

    async fn set_credential(&self, dn: &str, credential: &str) -> GatewayResult<()> {
        let exop = PasswordModify {
            user_id: Some(dn),
            old_pass: None,
            new_pass: Some(credential),
        };

        let mut conn = self.pool.get().await?;
        let status = self
            .pool
            .timed(async { Ok::<_, LdapError>(conn.ldap_mut().extended(exop).await?) })
            .await?;
        check(dn, status.1)?;
        tracing::debug!(dn, "LDAP password modified");
        Ok(())
    }

    async fn test_connection(&self) -> GatewayResult<()> {
        Ok(self.pool.test_connection().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LdapConfig {
        LdapConfig::builder()
            .connection_url("ldaps://ldap.example.com:636")
            .bind_dn("cn=svc,o=acme")
            .bind_credential("secret")
            .build()
            .unwrap()
    }

    #[test]
    fn gateway_reports_backend_type() {
        let gateway = LdapGateway::new(config()).unwrap();
        assert_eq!(gateway.backend_type(), "ldap");
        assert_eq!(gateway.config().bind_dn, "cn=svc,o=acme");
    }

    #[test]
    fn cookies_are_opaque_base64() {
        let raw = vec![0_u8, 1, 2, 250];
        let encoded = URL_SAFE_NO_PAD.encode(&raw);
        assert_eq!(decode_cookie(Some(&encoded)).unwrap(), raw);
        assert!(decode_cookie(None).unwrap().is_empty());
        assert!(matches!(
            decode_cookie(Some("not base64!")),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn modifications_translate() {
        let replace = Modification::replace("mail", vec!["a@b.c".to_string()]);
        assert!(matches!(to_mod(&replace), Mod::Replace("mail", values) if values.contains("a@b.c")));

        let delete = Modification::delete_all("description");
        assert!(matches!(to_mod(&delete), Mod::Delete("description", values) if values.is_empty()));
    }
}
