//! LDAP connection pool management.
//!
//! ## Security Requirements
//!
//! All connections use LDAPS (TLS from connection start).
//! STARTTLS is NOT supported to prevent downgrade attacks.

use std::future::Future;
use std::sync::Arc;

use ldap3::{Ldap, LdapConnAsync, LdapConnSettings};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::config::LdapConfig;
use crate::error::{LdapError, LdapResult, RC_INVALID_CREDENTIALS};

/// Connection pool for LDAP connections.
///
/// One service-bound connection is shared: an `ldap3` handle multiplexes
/// operations, so callers get a clone of it. The semaphore bounds the
/// number of operations in flight. A connection-level failure drops the
/// cached handle and the next caller reconnects.
pub struct LdapConnectionPool {
    config: Arc<LdapConfig>,
    semaphore: Arc<Semaphore>,
    connection: Mutex<Option<Ldap>>,
}

impl LdapConnectionPool {
    /// Creates a new connection pool. No connection is opened yet.
    #[must_use]
    pub fn new(config: LdapConfig) -> Self {
        let max_size = config.pool_max_size;
        Self {
            config: Arc::new(config),
            semaphore: Arc::new(Semaphore::new(max_size)),
            connection: Mutex::new(None),
        }
    }

    /// Gets a service-bound connection from the pool.
    ///
    /// The permit is released when the returned handle is dropped.
    pub async fn get(&self) -> LdapResult<LdapConnection> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LdapError::PoolExhausted)?;

        let mut guard = self.connection.lock().await;
        let ldap = match guard.as_ref() {
            Some(ldap) => ldap.clone(),
            None => {
                let ldap = self.create_connection(true).await?;
                *guard = Some(ldap.clone());
                ldap
            }
        };

        Ok(LdapConnection {
            ldap,
            _permit: permit,
        })
    }

    /// Drops the cached connection after a connection-level failure.
    pub async fn invalidate(&self) {
        if self.connection.lock().await.take().is_some() {
            tracing::warn!(url = %self.config.connection_url, "LDAP connection invalidated");
        }
    }

    /// Runs an operation with the configured read timeout.
    ///
    /// Connection-level failures invalidate the cached handle.
    pub async fn timed<T, F>(&self, operation: F) -> LdapResult<T>
    where
        F: Future<Output = LdapResult<T>>,
    {
        let result = match tokio::time::timeout(self.config.read_timeout, operation).await {
            Ok(result) => result,
            Err(_) => Err(LdapError::Timeout),
        };
        if matches!(&result, Err(e) if e.is_connection_error()) {
            self.invalidate().await;
        }
        result
    }

    /// Opens a new LDAPS connection, bound as the service account if asked.
    async fn create_connection(&self, service_bind: bool) -> LdapResult<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection_timeout)
            .set_no_tls_verify(!self.config.validate_certificates);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.connection_url)
            .await
            .map_err(|e| LdapError::Connection(e.to_string()))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection driver error: {}", e);
            }
        });

        if service_bind {
            let result = ldap
                .simple_bind(&self.config.bind_dn, &self.config.bind_credential)
                .await
                .map_err(|e| LdapError::Bind(e.to_string()))?;
            if result.rc != 0 {
                return Err(LdapError::Bind(format!("service bind returned code {}", result.rc)));
            }
        }

        tracing::debug!(url = %self.config.connection_url, "LDAP connection established");
        Ok(ldap)
    }

    /// Validates a credential by binding as `user_dn` on a dedicated
    /// connection, closed afterwards.
    ///
    /// ## Security
    ///
    /// The password is never logged. Wrong credentials yield `Ok(false)`.
    pub async fn authenticate(&self, user_dn: &str, password: &str) -> LdapResult<bool> {
        // An empty password would be an unauthenticated bind, which succeeds.
        if password.is_empty() {
            return Ok(false);
        }

        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| LdapError::PoolExhausted)?;

        let mut ldap = self.create_connection(false).await?;
        let outcome = match tokio::time::timeout(self.config.read_timeout, ldap.simple_bind(user_dn, password)).await {
            Err(_) => Err(LdapError::Timeout),
            Ok(Err(e)) => Err(LdapError::Bind(e.to_string())),
            Ok(Ok(result)) if result.rc == 0 => Ok(true),
            Ok(Ok(result)) if result.rc == RC_INVALID_CREDENTIALS => Ok(false),
            Ok(Ok(result)) => Err(LdapError::Operation {
                dn: user_dn.to_string(),
                code: result.rc,
                message: result.text,
            }),
        };
        let _ = ldap.unbind().await;
        outcome
    }

    /// Tests the connection to the LDAP server.
    pub async fn test_connection(&self) -> LdapResult<()> {
        let mut conn = self.get().await?;
        self.timed(async {
            conn.ldap_mut()
                .search("", ldap3::Scope::Base, "(objectClass=*)", vec!["1.1"])
                .await?
                .success()?;
            Ok::<(), LdapError>(())
        })
        .await
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &LdapConfig {
        &self.config
    }
}

/// A connection handle from the pool.
pub struct LdapConnection {
    ldap: Ldap,
    _permit: OwnedSemaphorePermit,
}

impl LdapConnection {
    /// Returns a mutable reference to the LDAP handle.
    #[must_use]
    pub fn ldap_mut(&mut self) -> &mut Ldap {
        &mut self.ldap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_creation() {
        let config = LdapConfig::builder()
            .connection_url("ldaps://ldap.example.com:636")
            .bind_dn("cn=admin,dc=example,dc=com")
            .bind_credential("password")
            .pool_max_size(5)
            .build()
            .unwrap();

        let pool = LdapConnectionPool::new(config);
        assert_eq!(pool.config().pool_max_size, 5);
        assert_eq!(pool.semaphore.available_permits(), 5);
    }

    #[tokio::test]
    async fn empty_password_never_binds() {
        let config = LdapConfig::builder()
            .connection_url("ldaps://ldap.invalid:636")
            .bind_dn("cn=admin,dc=example,dc=com")
            .bind_credential("password")
            .build()
            .unwrap();

        let pool = LdapConnectionPool::new(config);
        assert!(!pool.authenticate("uid=jdoe,dc=example,dc=com", "").await.unwrap());
    }
}
