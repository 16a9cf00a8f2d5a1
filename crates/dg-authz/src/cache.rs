//! Concurrent cache of compiled permission patterns.

use dashmap::DashMap;
use dg_core::pattern::compile_anchored;
use dg_core::Result;
use regex::Regex;

/// Default number of compiled patterns kept.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Compiled regexes keyed by the instantiated pattern string.
///
/// Instantiated patterns depend on the target, so the key space grows with
/// the number of tenants, storages, applications and groups seen. The cache
/// is cleared once it reaches its capacity.
#[derive(Debug)]
pub struct PatternCache {
    entries: DashMap<String, Regex>,
    capacity: usize,
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl PatternCache {
    /// Creates a cache holding at most `capacity` patterns.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns the compiled regex for an instantiated pattern.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if the pattern does not compile.
    pub fn get(&self, pattern: &str) -> Result<Regex> {
        if let Some(regex) = self.entries.get(pattern) {
            return Ok(regex.clone());
        }

        let regex = compile_anchored(pattern)?;
        if self.entries.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "pattern cache full, clearing");
            self.entries.clear();
        }
        self.entries.insert(pattern.to_string(), regex.clone());
        Ok(regex)
    }

    /// Number of cached patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_patterns_are_anchored_and_reused() {
        let cache = PatternCache::default();
        let regex = cache.get("DIR_ACME_READER").unwrap();
        assert!(regex.is_match("dir_acme_reader"));
        assert!(!regex.is_match("XDIR_ACME_READER"));
        cache.get("DIR_ACME_READER").unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clears_when_full() {
        let cache = PatternCache::with_capacity(2);
        cache.get("A").unwrap();
        cache.get("B").unwrap();
        cache.get("C").unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("(").is_err());
    }
}
