//! Rotating API key pool

use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info};

use crate::credentials::KeyProvider;
use crate::{InsightsError, Result};

/// Ordered, immutable list of API keys with a monotonically increasing cursor.
///
/// The selected key is always `keys[cursor % len]`. The cursor is advanced
/// only by a caller that observed a rate limit on the key that is still
/// selected, so concurrent reports about the same key advance it once.
#[derive(Debug)]
pub struct CredentialPool {
    keys: Box<[String]>,
    cursor: AtomicUsize,
}

/// A key together with the cursor value it was selected at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySnapshot<'a> {
    pub cursor: usize,
    pub key: &'a str,
}

impl CredentialPool {
    /// Build a pool from an already fetched key list.
    pub fn new(keys: Vec<String>) -> Result<Self> {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(InsightsError::Credentials(
                "key provider returned no API keys".to_string(),
            ));
        }

        info!(keys = keys.len(), "Constructed credential pool");

        Ok(Self {
            keys: keys.into_boxed_slice(),
            cursor: AtomicUsize::new(0),
        })
    }

    /// Fetch the key list once from `provider` and freeze it.
    pub fn from_provider(provider: &dyn KeyProvider) -> Result<Self> {
        debug!("Fetching key list from provider");
        Self::new(provider.fetch_keys()?)
    }

    /// The currently selected key. Never blocks.
    pub fn current_key(&self) -> &str {
        self.snapshot().key
    }

    /// The currently selected key and the cursor it was read at.
    pub fn snapshot(&self) -> KeySnapshot<'_> {
        let cursor = self.cursor.load(Ordering::Acquire);
        KeySnapshot {
            cursor,
            key: &self.keys[cursor % self.keys.len()],
        }
    }

    /// Report a rate limit on `observed_key`.
    ///
    /// Advances the cursor by one if `observed_key` is still the selected key
    /// and nobody advanced in between. Returns whether this call advanced.
    pub fn rotate(&self, observed_key: &str) -> bool {
        let current = self.snapshot();
        if current.key != observed_key {
            debug!("Reported key already rotated out");
            return false;
        }
        self.advance_from(current.cursor)
    }

    /// Report a rate limit on the key selected at `snapshot`.
    ///
    /// Unlike [`rotate`](Self::rotate) this compares cursors rather than key
    /// strings, so duplicate keys in the list (or a single-key pool) cannot
    /// cause a second advance for the same observation.
    pub fn rotate_from(&self, snapshot: KeySnapshot<'_>) -> bool {
        self.advance_from(snapshot.cursor)
    }

    fn advance_from(&self, cursor: usize) -> bool {
        let advanced = self
            .cursor
            .compare_exchange(cursor, cursor + 1, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();

        if advanced {
            info!(
                cursor = cursor + 1,
                key = %mask_key(self.current_key()),
                "Rotated to next API key"
            );
        }
        advanced
    }

    /// Number of keys in the pool.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: construction rejects empty key lists.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Raw cursor value (total successful rotations).
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Acquire)
    }
}

/// Mask an API key for logs and status output.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn pool(keys: &[&str]) -> CredentialPool {
        CredentialPool::new(keys.iter().map(|k| k.to_string()).collect()).unwrap()
    }

    #[test]
    fn empty_key_list_is_rejected() {
        let err = CredentialPool::new(vec![" ".to_string()]).unwrap_err();
        assert!(matches!(err, InsightsError::Credentials(_)));
    }

    #[test]
    fn sequential_confirmed_rotations_advance_once_each() {
        for n in 1..=5 {
            let keys: Vec<String> = (0..n).map(|i| format!("key-{i}")).collect();
            let pool = CredentialPool::new(keys).unwrap();

            for _ in 0..n {
                let current = pool.current_key().to_string();
                assert!(pool.rotate(&current));
            }

            assert_eq!(pool.cursor(), n);
            assert_eq!(pool.current_key(), "key-0");
        }
    }

    #[test]
    fn rotating_a_key_that_is_not_selected_is_a_noop() {
        let pool = pool(&["a", "b", "c"]);
        assert!(!pool.rotate("b"));
        assert!(!pool.rotate("unknown"));
        assert_eq!(pool.cursor(), 0);
        assert_eq!(pool.current_key(), "a");
    }

    #[test]
    fn cursor_wraps_through_keys_without_decreasing() {
        let pool = pool(&["a", "b"]);
        let mut seen = Vec::new();
        for _ in 0..5 {
            let key = pool.current_key().to_string();
            seen.push(key.clone());
            pool.rotate(&key);
        }
        assert_eq!(seen, ["a", "b", "a", "b", "a"]);
        assert_eq!(pool.cursor(), 5);
    }

    #[test]
    fn concurrent_reports_of_same_key_advance_once() {
        let pool = Arc::new(pool(&["a", "b", "c"]));
        let callers = 32;
        let barrier = Arc::new(Barrier::new(callers));

        let handles: Vec<_> = (0..callers)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    pool.rotate("a")
                })
            })
            .collect();

        let advanced = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|advanced| *advanced)
            .count();

        assert_eq!(advanced, 1);
        assert_eq!(pool.cursor(), 1);
        assert_eq!(pool.current_key(), "b");
    }

    #[test]
    fn snapshot_rotation_handles_single_key_pool() {
        let pool = pool(&["only"]);
        let observed = pool.snapshot();

        assert!(pool.rotate_from(observed));
        assert!(!pool.rotate_from(observed));
        assert_eq!(pool.cursor(), 1);
        assert_eq!(pool.current_key(), "only");
    }

    #[test]
    fn mask_key_hides_middle() {
        assert_eq!(mask_key("AIzaSyExampleKeywxyz"), "AIza…wxyz");
        assert_eq!(mask_key("short"), "*****");
    }
}
