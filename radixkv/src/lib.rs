//! # RadixKV - Thread-Safe Prefix-Indexed Key-Value Store
//!
//! A concurrent wrapper around [`radix_rs::RadixTree`] for byte-string keys.
//!
//! ## Features
//!
//! - **Point lookups**: O(key_length) lookups
//! - **Prefix scans**: Find or delete all keys with a given prefix
//! - **Longest-prefix match**: Routing-table style lookups
//! - **Arena compaction**: Reclaim slots left behind by heavy deletion
//!
//! ## Example
//!
//! ```rust
//! use radixkv::RadixKV;
//!
//! let kv = RadixKV::new();
//! kv.insert(b"user:1001", 42u64);
//! kv.insert(b"user:1002", 43u64);
//!
//! assert_eq!(kv.get(b"user:1001"), Some(42));
//!
//! // Prefix scan
//! for (key, value) in kv.prefix(b"user:") {
//!     println!("{:?} -> {}", key, value);
//! }
//!
//! assert_eq!(kv.remove_prefix(b"user:"), 2);
//! assert!(kv.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use parking_lot::RwLock;
use radix_rs::RadixTree;
use tracing::debug;

pub use radix_rs::IntegrityError;

/// Memory usage statistics for the store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    /// Number of keys stored
    pub num_keys: usize,
    /// Live tree nodes, root included
    pub node_count: usize,
    /// Vacated node slots awaiting reuse or compaction
    pub free_slots: usize,
    /// Approximate heap bytes held by the tree
    pub total_bytes: usize,
    /// Bytes per key (calculated)
    pub bytes_per_key: f64,
}

/// Configuration for the RadixKV store.
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial capacity hint for number of tree nodes
    pub initial_capacity: usize,
    /// Free slot count that triggers compaction after a removal
    pub compaction_threshold: usize,
    /// Compact automatically once `compaction_threshold` is reached
    pub auto_compact: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_capacity: 1024,
            compaction_threshold: 65_536,
            auto_compact: false,
        }
    }
}

/// A thread-safe key-value store indexed by a compressed prefix tree.
///
/// Reads share a lock; writes take it exclusively. Reads take the lock
/// recursively so a walk callback can query the store it is walking.
pub struct RadixKV<V> {
    inner: RwLock<RadixTree<V>>,
    config: Config,
}

impl<V> RadixKV<V> {
    /// Create a new empty store with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new store with the given configuration.
    pub fn with_config(config: Config) -> Self {
        debug!(?config, "creating store");
        Self {
            inner: RwLock::new(RadixTree::with_capacity(config.initial_capacity)),
            config,
        }
    }

    /// Build a store from key-value pairs. Later duplicates win.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = (K, V)>,
    {
        let kv = Self::new();
        kv.inner.write().extend(entries);
        kv
    }

    /// The configuration this store was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Insert a key-value pair into the store.
    ///
    /// Returns the previous value if the key already existed.
    pub fn insert(&self, key: impl AsRef<[u8]>, value: V) -> Option<V> {
        self.inner.write().insert(key.as_ref(), value)
    }

    /// Check if a key exists in the store.
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        self.inner.read_recursive().contains_key(key.as_ref())
    }

    /// Remove a key from the store.
    ///
    /// Returns the value if the key existed.
    pub fn remove(&self, key: impl AsRef<[u8]>) -> Option<V> {
        let mut inner = self.inner.write();
        let old = inner.delete(key.as_ref());
        if old.is_some() {
            self.maybe_compact(&mut inner);
        }
        old
    }

    /// Remove every key starting with `prefix`.
    ///
    /// Returns the number of keys removed.
    pub fn remove_prefix(&self, prefix: impl AsRef<[u8]>) -> usize {
        let mut inner = self.inner.write();
        let removed = inner.delete_prefix(prefix.as_ref());
        if removed > 0 {
            self.maybe_compact(&mut inner);
        }
        removed
    }

    /// Keep only the entries for which `keep` returns true.
    ///
    /// `keep` may also update the value in place. Returns the number of keys removed.
    ///
    /// The store is write-locked while `keep` runs, so `keep` must not call
    /// back into the same store; doing so deadlocks.
    pub fn retain(&self, mut keep: impl FnMut(&[u8], &mut V) -> bool) -> usize {
        let mut inner = self.inner.write();
        let mut removed = 0;
        inner.walk_mut(|mut entry| {
            let key = entry.key().to_vec();
            if !keep(&key, entry.value_mut()) {
                entry.delete();
                removed += 1;
            }
            false
        });
        if removed > 0 {
            self.maybe_compact(&mut inner);
        }
        removed
    }

    /// Visit entries in ascending key order. Returning `true` stops the walk.
    ///
    /// The store is read-locked for the duration of the walk. The callback may
    /// issue further reads on the same store, but any write from inside it
    /// (`insert`, `remove`, `retain`, ...) deadlocks.
    pub fn walk(&self, f: impl FnMut(&[u8], &V) -> bool) {
        self.inner.read_recursive().walk(f);
    }

    /// Visit entries whose key starts with `prefix`. Returning `true` stops the walk.
    ///
    /// Locking is the same as for [`walk`](Self::walk): nested reads are
    /// allowed, nested writes deadlock.
    pub fn walk_prefix(&self, prefix: impl AsRef<[u8]>, f: impl FnMut(&[u8], &V) -> bool) {
        self.inner.read_recursive().walk_prefix(prefix.as_ref(), f);
    }

    /// Get the number of keys in the store.
    pub fn len(&self) -> usize {
        self.inner.read_recursive().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get memory usage statistics.
    pub fn memory_usage(&self) -> MemoryStats {
        let inner = self.inner.read_recursive();
        let num_keys = inner.len();
        let total_bytes = inner.memory_usage();
        MemoryStats {
            num_keys,
            node_count: inner.node_count(),
            free_slots: inner.free_slots(),
            total_bytes,
            bytes_per_key: if num_keys > 0 {
                total_bytes as f64 / num_keys as f64
            } else {
                0.0
            },
        }
    }

    /// Force compaction of the node arena.
    ///
    /// Returns the number of slots reclaimed.
    pub fn compact(&self) -> usize {
        self.inner.write().compact()
    }

    /// Check the structural invariants of the underlying tree.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        self.inner.read_recursive().validate()
    }

    fn maybe_compact(&self, tree: &mut RadixTree<V>) {
        if self.config.auto_compact && tree.free_slots() >= self.config.compaction_threshold {
            let reclaimed = tree.compact();
            debug!(
                reclaimed,
                threshold = self.config.compaction_threshold,
                "auto-compacted store"
            );
        }
    }
}

impl<V: Clone> RadixKV<V> {
    /// Get a copy of the value for a key.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<V> {
        self.inner.read_recursive().get(key.as_ref()).cloned()
    }

    /// Find the longest stored key that is a prefix of `key`.
    pub fn longest_prefix(&self, key: impl AsRef<[u8]>) -> Option<(Vec<u8>, V)> {
        self.inner
            .read_recursive()
            .longest_prefix(key.as_ref())
            .map(|(k, v)| (k.to_vec(), v.clone()))
    }

    /// Collect all keys with a given prefix, in ascending order.
    pub fn prefix(&self, prefix: impl AsRef<[u8]>) -> Vec<(Vec<u8>, V)> {
        let mut out = Vec::new();
        self.inner.read_recursive().walk_prefix(prefix.as_ref(), |k, v| {
            out.push((k.to_vec(), v.clone()));
            false
        });
        out
    }

    /// Collect every stored key that is a prefix of `path`, shortest first.
    pub fn ancestors(&self, path: impl AsRef<[u8]>) -> Vec<(Vec<u8>, V)> {
        let mut out = Vec::new();
        self.inner.read_recursive().walk_path(path.as_ref(), |k, v| {
            out.push((k.to_vec(), v.clone()));
            false
        });
        out
    }

    /// Get the smallest and largest entries.
    pub fn bounds(&self) -> Option<((Vec<u8>, V), (Vec<u8>, V))> {
        let inner = self.inner.read_recursive();
        let (min_k, min_v) = inner.minimum()?;
        let (max_k, max_v) = inner.maximum()?;
        Some((
            (min_k.to_vec(), min_v.clone()),
            (max_k.to_vec(), max_v.clone()),
        ))
    }

    /// Copy all entries into an ordered map.
    pub fn to_map(&self) -> std::collections::BTreeMap<Vec<u8>, V> {
        self.inner.read_recursive().to_map()
    }
}

impl<V> Default for RadixKV<V> {
    fn default() -> Self {
        Self::new()
    }
}
