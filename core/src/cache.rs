//! In-memory cache of compiled syntax strings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::compiler::{CompiledCommand, compile};
use crate::error::CompileError;
use crate::types::DeclaredArgument;

/// Cache key: the same syntax compiles differently under each prefix.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub prefix: String,
    pub syntax: String,
}

type Entry = Result<Arc<CompiledCommand>, CompileError>;

/// Process-lifetime cache of compiled syntax strings keyed by
/// `(prefix, syntax)`.
///
/// Entries are never evicted. Compile failures are cached too, so a broken
/// definition is not re-parsed on every invocation. The lock is not held
/// while compiling; two threads racing on the same key both compile and the
/// last insert wins, which is harmless because the artifact depends only on
/// the key and the arguments declared with it.
///
/// # Examples
///
/// ```
/// use command_syntax_core::{DeclaredArgument, PatternCache};
///
/// let cache = PatternCache::default();
/// let args = [DeclaredArgument::required("name", "Name")];
///
/// let first = cache.get_or_compile("%", &args, "<prefix>hi $1").unwrap();
/// let again = cache.get_or_compile("%", &args, "<prefix>hi $1").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&first, &again));
/// assert_eq!((cache.hits(), cache.misses()), (1, 1));
///
/// cache.get_or_compile("!", &args, "<prefix>hi $1").unwrap();
/// assert_eq!(cache.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached artifact for `(prefix, syntax)`, compiling it on first use.
    pub fn get_or_compile(
        &self,
        prefix: &str,
        arguments: &[DeclaredArgument],
        syntax: &str,
    ) -> Entry {
        let key = CacheKey {
            prefix: prefix.to_string(),
            syntax: syntax.to_string(),
        };

        if let Some(entry) = self.lookup(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return entry;
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(prefix = %prefix, syntax = %syntax, "Pattern cache miss");
        let entry = compile(prefix, arguments, syntax).map(Arc::new);

        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry.clone());
        entry
    }

    /// Returns a cached entry without compiling.
    pub fn get(&self, prefix: &str, syntax: &str) -> Option<Entry> {
        self.lookup(&CacheKey {
            prefix: prefix.to_string(),
            syntax: syntax.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    fn lookup(&self, key: &CacheKey) -> Option<Entry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_are_cached() {
        let cache = PatternCache::new();
        let args = [DeclaredArgument::required("a", "A")];

        assert!(cache.get_or_compile("%", &args, "broken $1").is_err());
        assert!(cache.get_or_compile("%", &args, "broken $1").is_err());
        assert_eq!(cache.misses(), 1);
        assert_eq!(cache.hits(), 1);
        assert!(matches!(cache.get("%", "broken $1"), Some(Err(_))));
    }

    #[test]
    fn test_prefixes_do_not_share_entries() {
        let cache = PatternCache::new();
        let args = [DeclaredArgument::required("a", "A")];

        let bang = cache.get_or_compile("!", &args, "<prefix>go $1").unwrap();
        let percent = cache.get_or_compile("%", &args, "<prefix>go $1").unwrap();

        assert!(bang.pattern().is_match("!go x"));
        assert!(!bang.pattern().is_match("%go x"));
        assert!(percent.pattern().is_match("%go x"));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("?", "<prefix>go $1").is_none());
    }

    #[test]
    fn test_cache_is_shareable_across_threads() {
        let cache = Arc::new(PatternCache::new());
        let args = vec![DeclaredArgument::required("a", "A")];

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let args = args.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_compile("%", &args, "<prefix>go $1")
                        .map(|c| c.pattern().is_match("%go x"))
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Ok(true));
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits() + cache.misses(), 4);
    }
}
