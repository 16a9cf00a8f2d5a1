//! Credential hashing and verification.
//!
//! New credentials are hashed with Argon2id and stored as PHC strings.
//! Verification also accepts the RFC 2307 style schemes older directories
//! carry: `{SSHA256}`, `{SSHA512}`, `{SHA256}` and `{SHA512}`.
//!
//! ## Security Note
//!
//! Candidates and hashes are never logged. Digest comparison runs in
//! constant time.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dg_core::{Error, Result};
use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

/// Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashPolicy {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    /// Time cost (iterations).
    pub time_cost: u32,
    /// Parallelism factor.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: u32,
}

impl Default for HashPolicy {
    fn default() -> Self {
        // OWASP recommended settings for Argon2id
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
            hash_length: 32,
        }
    }
}

impl HashPolicy {
    fn build_params(&self) -> std::result::Result<Params, argon2::Error> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(self.hash_length as usize),
        )
    }
}

/// Hashes and verifies stored credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    policy: HashPolicy,
}

impl CredentialHasher {
    /// Creates a hasher with the given cost parameters.
    #[must_use]
    pub const fn new(policy: HashPolicy) -> Self {
        Self { policy }
    }

    /// Hashes a credential into a PHC string.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if the cost parameters are invalid.
    pub fn hash(&self, credential: &str) -> Result<String> {
        let mut salt = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut salt);
        let salt = SaltString::encode_b64(&salt).map_err(|e| Error::config(e.to_string()))?;

        let params = self
            .policy
            .build_params()
            .map_err(|e| Error::config(format!("invalid hash parameters: {e}")))?;

        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(credential.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| Error::config(format!("hashing failed: {e}")))
    }

    /// Checks a candidate against a stored value.
    ///
    /// Unknown schemes and malformed values never match.
    #[must_use]
    pub fn verify(&self, candidate: &str, stored: &str) -> bool {
        if stored.starts_with("$argon2") {
            return PasswordHash::new(stored).is_ok_and(|parsed| {
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
            });
        }

        let Some((scheme, encoded)) = stored.strip_prefix('{').and_then(|rest| rest.split_once('}')) else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };

        match scheme.to_ascii_uppercase().as_str() {
            "SSHA256" => salted::<Sha256>(candidate, &decoded),
            "SSHA512" => salted::<Sha512>(candidate, &decoded),
            "SHA256" => constant_time_eq(&Sha256::digest(candidate.as_bytes()), &decoded),
            "SHA512" => constant_time_eq(&Sha512::digest(candidate.as_bytes()), &decoded),
            _ => false,
        }
    }

    /// Checks whether a stored value uses the current format.
    #[must_use]
    pub fn is_current(stored: &str) -> bool {
        stored.starts_with("$argon2id$")
    }
}

/// `digest || salt` with `digest = H(candidate || salt)`.
fn salted<D: Digest>(candidate: &str, decoded: &[u8]) -> bool {
    let size = <D as Digest>::output_size();
    if decoded.len() <= size {
        return false;
    }
    let (expected, salt) = decoded.split_at(size);
    let mut hasher = D::new();
    hasher.update(candidate.as_bytes());
    hasher.update(salt);
    constant_time_eq(&hasher.finalize(), expected)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0_u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> CredentialHasher {
        CredentialHasher::new(HashPolicy {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            hash_length: 32,
        })
    }

    #[test]
    fn hash_and_verify() {
        let hasher = fast();
        let hash = hasher.hash("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(CredentialHasher::is_current(&hash));
        assert!(hasher.verify("correct horse battery staple", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn same_credential_gets_different_salts() {
        let hasher = fast();
        assert_ne!(hasher.hash("password1").unwrap(), hasher.hash("password1").unwrap());
    }

    #[test]
    fn legacy_salted_sha() {
        let salt = b"pepper!!";
        let mut digest = Sha256::new();
        digest.update(b"secret");
        digest.update(salt);
        let mut raw = digest.finalize().to_vec();
        raw.extend_from_slice(salt);
        let stored = format!("{{SSHA256}}{}", STANDARD.encode(&raw));

        let hasher = fast();
        assert!(hasher.verify("secret", &stored));
        assert!(!hasher.verify("Secret", &stored));
        assert!(!CredentialHasher::is_current(&stored));
    }

    #[test]
    fn legacy_unsalted_sha512() {
        let stored = format!("{{sha512}}{}", STANDARD.encode(Sha512::digest(b"secret")));
        assert!(fast().verify("secret", &stored));
        assert!(!fast().verify("secrets", &stored));
    }

    #[test]
    fn unknown_or_malformed_values_never_match() {
        let hasher = fast();
        assert!(!hasher.verify("secret", "secret"));
        assert!(!hasher.verify("secret", "{MD5}Xr4ilOzQ4PCOq3aQ0qbuaQ=="));
        assert!(!hasher.verify("secret", "{SSHA256}not-base64"));
        assert!(!hasher.verify("secret", "{SSHA256}AAAA"));
        assert!(!hasher.verify("secret", "$argon2id$garbage"));
    }
}
