//! # radix-rs
//!
//! A compressed prefix tree (radix tree) keyed by byte strings.
//!
//! Chains of single-child nodes are collapsed so every edge carries a
//! multi-byte segment. Inserts split a segment when a new key diverges inside
//! it; deletes merge a leafless node back into its only child.
//!
//! ## Example
//!
//! ```rust
//! use radix_rs::RadixTree;
//!
//! let mut tree: RadixTree<u64> = RadixTree::new();
//! tree.insert(b"foo", 1);
//! tree.insert(b"foobar", 2);
//! tree.insert(b"zip", 3);
//!
//! assert_eq!(tree.get(b"foo"), Some(&1));
//! assert_eq!(tree.longest_prefix(b"foobarbaz"), Some((&b"foobar"[..], &2)));
//!
//! let mut under_foo = Vec::new();
//! tree.walk_prefix(b"foo", |key, _| {
//!     under_foo.push(key.to_vec());
//!     false
//! });
//! assert_eq!(under_foo, vec![b"foo".to_vec(), b"foobar".to_vec()]);
//!
//! assert_eq!(tree.delete_prefix(b"foo"), 2);
//! assert_eq!(tree.len(), 1);
//! ```
//!
//! The tree is a plain single-threaded container. Callers that share it
//! between threads wrap it in their own lock.

mod debug;
pub mod error;
mod node;
mod validate;
mod walk;

pub use error::IntegrityError;
pub use node::NodeId;
pub use walk::{Iter, WalkEntry};

use std::collections::BTreeMap;

use node::{Edge, Leaf, Node, NodeArena};
use tracing::{debug, trace};

/// The node a descent ended on, and the edge that leads to it.
///
/// `parent` is `None` only for the root.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Position {
    pub(crate) node: NodeId,
    pub(crate) parent: Option<(NodeId, u8)>,
}

impl Position {
    const ROOT: Position = Position {
        node: NodeId::ROOT,
        parent: None,
    };
}

#[inline]
fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// A compressed prefix tree mapping byte strings to values of type `V`.
///
/// Nodes are stored in an index-addressed arena. The root is always present
/// and holds the value for the empty key, if any.
#[derive(Clone)]
pub struct RadixTree<V> {
    nodes: NodeArena<V>,
    size: usize,
}

impl<V> RadixTree<V> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty tree with room for `nodes` nodes before the arena grows.
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            nodes: NodeArena::with_capacity(nodes),
            size: 0,
        }
    }

    /// Builds a tree by inserting every entry. Later duplicates win.
    pub fn from_map<K, I>(entries: I) -> Self
    where
        K: AsRef<[u8]>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut tree = Self::new();
        tree.extend(entries);
        tree
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub fn clear(&mut self) {
        self.nodes = NodeArena::with_capacity(0);
        self.size = 0;
    }

    /// Number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.live()
    }

    /// Vacated arena slots waiting for reuse.
    pub fn free_slots(&self) -> usize {
        self.nodes.free_slots()
    }

    /// Approximate heap bytes held by the tree (excluding heap owned by values).
    pub fn memory_usage(&self) -> usize {
        self.nodes.memory_usage()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Re-packs the node arena in key order, dropping vacated slots.
    ///
    /// Returns the number of slots reclaimed. Contents are unchanged.
    pub fn compact(&mut self) -> usize {
        let reclaimed = self.nodes.compact();
        debug!(reclaimed, nodes = self.nodes.live(), "compacted node arena");
        reclaimed
    }

    /// Follows `key` exactly, returning the node it ends on.
    pub(crate) fn find(&self, key: &[u8]) -> Option<Position> {
        let mut pos = Position::ROOT;
        let mut search = key;
        while let Some(&label) = search.first() {
            let child = self.nodes.get(pos.node).get_edge(label)?;
            let prefix = self.nodes.get(child).prefix.as_slice();
            if !search.starts_with(prefix) {
                return None;
            }
            search = &search[prefix.len()..];
            pos = Position {
                node: child,
                parent: Some((pos.node, label)),
            };
        }
        Some(pos)
    }

    /// Finds the node whose subtree holds exactly the keys starting with `prefix`.
    ///
    /// The prefix may end inside a node's compressed segment; that node is
    /// returned when its segment extends what is left of the prefix.
    pub(crate) fn seek_prefix(&self, prefix: &[u8]) -> Option<Position> {
        let mut pos = Position::ROOT;
        let mut search = prefix;
        while let Some(&label) = search.first() {
            let child = self.nodes.get(pos.node).get_edge(label)?;
            let child_prefix = self.nodes.get(child).prefix.as_slice();
            let consumed = if search.starts_with(child_prefix) {
                child_prefix.len()
            } else if child_prefix.starts_with(search) {
                search.len()
            } else {
                return None;
            };
            search = &search[consumed..];
            pos = Position {
                node: child,
                parent: Some((pos.node, label)),
            };
        }
        Some(pos)
    }

    /// Inserts `value` under `key`, returning the previous value if the key existed.
    pub fn insert(&mut self, key: &[u8], value: V) -> Option<V> {
        let mut n = NodeId::ROOT;
        let mut search = key;
        loop {
            let Some(&label) = search.first() else {
                let node = self.nodes.get_mut(n);
                if let Some(leaf) = node.leaf.as_mut() {
                    return Some(std::mem::replace(&mut leaf.value, value));
                }
                node.leaf = Some(Leaf {
                    key: key.into(),
                    value,
                });
                self.size += 1;
                return None;
            };

            let Some(child) = self.nodes.get(n).get_edge(label) else {
                let leaf_node = self.nodes.alloc(Node::with_leaf(search, key, value));
                self.nodes.get_mut(n).add_edge(Edge {
                    label,
                    node: leaf_node,
                });
                self.size += 1;
                return None;
            };

            let (common, child_len) = {
                let child_prefix = self.nodes.get(child).prefix.as_slice();
                (common_prefix_len(search, child_prefix), child_prefix.len())
            };
            if common == child_len {
                search = &search[common..];
                n = child;
                continue;
            }

            // The key diverges inside the child's segment: split it at `common`.
            let split = self.nodes.alloc(Node::new(&search[..common]));
            self.nodes.get_mut(n).update_edge(label, split);
            let child_label = {
                let child_node = self.nodes.get_mut(child);
                child_node.prefix.drain(..common);
                child_node.prefix[0]
            };
            self.nodes.get_mut(split).add_edge(Edge {
                label: child_label,
                node: child,
            });

            search = &search[common..];
            match search.first() {
                None => {
                    self.nodes.get_mut(split).leaf = Some(Leaf {
                        key: key.into(),
                        value,
                    });
                }
                Some(&new_label) => {
                    let leaf_node = self.nodes.alloc(Node::with_leaf(search, key, value));
                    self.nodes.get_mut(split).add_edge(Edge {
                        label: new_label,
                        node: leaf_node,
                    });
                }
            }
            trace!(node = %split, at = common, "split edge");
            self.size += 1;
            return None;
        }
    }

    /// Removes `key`, returning its value if it was present.
    pub fn delete(&mut self, key: &[u8]) -> Option<V> {
        let pos = self.find(key)?;
        let leaf = self.nodes.get_mut(pos.node).leaf.take()?;
        self.size -= 1;
        self.reconcile(pos);
        Some(leaf.value)
    }

    /// Removes every key starting with `prefix`, returning how many were removed.
    pub fn delete_prefix(&mut self, prefix: &[u8]) -> usize {
        let Some(pos) = self.seek_prefix(prefix) else {
            return 0;
        };

        let node = self.nodes.get_mut(pos.node);
        let mut removed = usize::from(node.leaf.take().is_some());
        let edges = std::mem::take(&mut node.edges);
        for edge in edges {
            removed += self.nodes.free_subtree(edge.node);
        }
        self.size -= removed;
        self.reconcile(pos);

        debug!(removed, "deleted prefix");
        removed
    }

    /// Restores compression after the node at `pos` lost its leaf or subtree.
    ///
    /// An emptied non-root node is pruned from its parent; a leafless node
    /// left with one edge absorbs its child. The same single-edge check then
    /// runs on the parent.
    fn reconcile(&mut self, pos: Position) {
        let Some((parent, label)) = pos.parent else {
            return;
        };

        let node = self.nodes.get(pos.node);
        debug_assert!(!node.is_leaf());
        match node.edges.len() {
            0 => {
                self.nodes.get_mut(parent).delete_edge(label);
                self.nodes.free(pos.node);
                trace!(node = %pos.node, "pruned empty node");
            }
            1 => self.merge_child(pos.node),
            _ => {}
        }

        if parent != NodeId::ROOT {
            let p = self.nodes.get(parent);
            if p.edges.len() == 1 && !p.is_leaf() {
                self.merge_child(parent);
            }
        }
    }

    /// Collapses a leafless single-edge node into its child.
    fn merge_child(&mut self, id: NodeId) {
        let child_id = {
            let node = self.nodes.get(id);
            debug_assert_eq!(node.edges.len(), 1);
            debug_assert!(!node.is_leaf());
            node.edges[0].node
        };
        let child = self.nodes.free(child_id);
        let node = self.nodes.get_mut(id);
        node.prefix.extend_from_slice(&child.prefix);
        node.leaf = child.leaf;
        node.edges = child.edges;
        trace!(node = %id, absorbed = %child_id, "merged child");
    }

    /// Copies every entry into an ordered map.
    pub fn to_map(&self) -> BTreeMap<Vec<u8>, V>
    where
        V: Clone,
    {
        self.iter()
            .map(|(k, v)| (k.to_vec(), v.clone()))
            .collect()
    }
}

impl<V> Default for RadixTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for RadixTree<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: AsRef<[u8]>, V> Extend<(K, V)> for RadixTree<V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k.as_ref(), v);
        }
    }
}

impl<K: AsRef<[u8]>, V> FromIterator<(K, V)> for RadixTree<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter)
    }
}


#[cfg(test)]
mod proptests;
