//! Lookups, ordered traversal, and walks that may delete what they visit.

use crate::node::{Leaf, NodeArena, NodeId};
use crate::RadixTree;

impl<V> RadixTree<V> {
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let pos = self.find(key)?;
        self.nodes.get(pos.node).leaf.as_ref().map(|l| &l.value)
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let pos = self.find(key)?;
        self.nodes.get_mut(pos.node).leaf.as_mut().map(|l| &mut l.value)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Returns the longest stored key that is a prefix of `key`, with its value.
    ///
    /// The empty key matches everything when it is stored.
    pub fn longest_prefix(&self, key: &[u8]) -> Option<(&[u8], &V)> {
        let mut last: Option<&Leaf<V>> = None;
        let mut n = NodeId::ROOT;
        let mut search = key;
        loop {
            let node = self.nodes.get(n);
            if let Some(leaf) = &node.leaf {
                last = Some(leaf);
            }
            let Some(&label) = search.first() else { break };
            let Some(child) = node.get_edge(label) else { break };
            let prefix = self.nodes.get(child).prefix.as_slice();
            if !search.starts_with(prefix) {
                break;
            }
            search = &search[prefix.len()..];
            n = child;
        }
        last.map(|l| (&*l.key, &l.value))
    }

    /// Smallest key in byte-lexicographic order.
    pub fn minimum(&self) -> Option<(&[u8], &V)> {
        let mut n = NodeId::ROOT;
        loop {
            let node = self.nodes.get(n);
            if let Some(leaf) = &node.leaf {
                return Some((&*leaf.key, &leaf.value));
            }
            n = node.edges.first()?.node;
        }
    }

    /// Largest key in byte-lexicographic order.
    pub fn maximum(&self) -> Option<(&[u8], &V)> {
        let mut n = NodeId::ROOT;
        loop {
            let node = self.nodes.get(n);
            match node.edges.last() {
                Some(edge) => n = edge.node,
                None => return node.leaf.as_ref().map(|l| (&*l.key, &l.value)),
            }
        }
    }

    /// Iterates all entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(&self.nodes, NodeId::ROOT)
    }

    /// Visits every entry in ascending key order. Returning `true` stops the walk.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(&[u8], &V) -> bool,
    {
        for (k, v) in self.iter() {
            if f(k, v) {
                return;
            }
        }
    }

    /// Visits every entry whose key starts with `prefix`, in ascending order.
    /// Returning `true` stops the walk.
    pub fn walk_prefix<F>(&self, prefix: &[u8], mut f: F)
    where
        F: FnMut(&[u8], &V) -> bool,
    {
        let Some(pos) = self.seek_prefix(prefix) else {
            return;
        };
        for (k, v) in Iter::new(&self.nodes, pos.node) {
            if f(k, v) {
                return;
            }
        }
    }

    /// Visits every stored key that is a prefix of `path`, shortest first.
    /// Returning `true` stops the walk.
    pub fn walk_path<F>(&self, path: &[u8], mut f: F)
    where
        F: FnMut(&[u8], &V) -> bool,
    {
        let mut n = NodeId::ROOT;
        let mut search = path;
        loop {
            let node = self.nodes.get(n);
            if let Some(leaf) = &node.leaf {
                if f(&leaf.key, &leaf.value) {
                    return;
                }
            }
            let Some(&label) = search.first() else { return };
            let Some(child) = node.get_edge(label) else { return };
            let prefix = self.nodes.get(child).prefix.as_slice();
            if !search.starts_with(prefix) {
                return;
            }
            search = &search[prefix.len()..];
            n = child;
        }
    }

    /// Visits every entry in ascending order with a handle that can update or
    /// delete it. Returning `true` stops the walk.
    ///
    /// Deleting the visited entry is safe: no remaining key is skipped and no
    /// key is visited twice, even when the deletion collapses nodes.
    ///
    /// ```rust
    /// use radix_rs::RadixTree;
    ///
    /// let mut tree: RadixTree<u32> = (0..10u32).map(|i| (format!("k{i}"), i)).collect();
    /// tree.walk_mut(|entry| {
    ///     if *entry.value() % 2 == 1 {
    ///         entry.delete();
    ///     }
    ///     false
    /// });
    /// assert_eq!(tree.len(), 5);
    /// ```
    pub fn walk_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(WalkEntry<'_, V>) -> bool,
    {
        self.walk_node_mut(NodeId::ROOT, &mut f);
    }

    /// [`walk_mut`](Self::walk_mut) restricted to keys starting with `prefix`.
    pub fn walk_prefix_mut<F>(&mut self, prefix: &[u8], mut f: F)
    where
        F: FnMut(WalkEntry<'_, V>) -> bool,
    {
        if let Some(pos) = self.seek_prefix(prefix) {
            self.walk_node_mut(pos.node, &mut f);
        }
    }

    /// Pre-order walk of the subtree at `id` that tolerates deletions made
    /// through the [`WalkEntry`] handle. Returns `true` if the callback aborted.
    ///
    /// A deletion below `id` can do three things to this node: drop one of its
    /// edges, free it outright, or make it absorb its last remaining child.
    /// Edges are re-read by index after each child returns, and an absorb is
    /// detected by the node's prefix growing.
    fn walk_node_mut<F>(&mut self, id: NodeId, f: &mut F) -> bool
    where
        F: FnMut(WalkEntry<'_, V>) -> bool,
    {
        // Deleting this node's leaf may pull a not-yet-visited leaf up from
        // its only child, so keep visiting until the leaf stays put.
        while self.nodes.get(id).is_leaf() {
            let mut deleted = false;
            let entry = WalkEntry {
                tree: self,
                node: id,
                deleted: &mut deleted,
            };
            if f(entry) {
                return true;
            }
            if !deleted {
                break;
            }
            if !self.nodes.is_live(id) {
                return false;
            }
        }

        let prefix_len = self.nodes.get(id).prefix.len();
        let mut count = self.nodes.get(id).edges.len();
        let mut i = 0;
        while i < count {
            let edge = self.nodes.get(id).edges[i];
            if self.walk_node_mut(edge.node, f) {
                return true;
            }
            if !self.nodes.is_live(id) {
                return false;
            }

            let node = self.nodes.get(id);
            if node.prefix.len() != prefix_len {
                // Absorbed the last remaining child. Its label sorts before the
                // edge just walked only if it was already visited.
                let absorbed = node.prefix[prefix_len];
                if absorbed < edge.label {
                    return false;
                }
                return self.walk_node_mut(id, f);
            }
            if node.edges.len() >= count {
                i += 1;
            }
            count = node.edges.len();
        }
        false
    }
}

/// A visited entry during [`RadixTree::walk_mut`].
pub struct WalkEntry<'a, V> {
    tree: &'a mut RadixTree<V>,
    node: NodeId,
    deleted: &'a mut bool,
}

impl<V> WalkEntry<'_, V> {
    fn leaf(&self) -> &Leaf<V> {
        self.tree
            .nodes
            .get(self.node)
            .leaf
            .as_ref()
            .expect("walk entry points at a leaf")
    }

    pub fn key(&self) -> &[u8] {
        &self.leaf().key
    }

    pub fn value(&self) -> &V {
        &self.leaf().value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self
            .tree
            .nodes
            .get_mut(self.node)
            .leaf
            .as_mut()
            .expect("walk entry points at a leaf")
            .value
    }

    /// Removes the entry from the tree and returns its value.
    pub fn delete(mut self) -> V {
        let key = self.leaf().key.clone();
        *self.deleted = true;
        self.tree
            .delete(&key)
            .expect("walk entry key is present")
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for WalkEntry<'_, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalkEntry")
            .field("key", &self.key())
            .field("value", self.value())
            .finish()
    }
}

/// Iterator over `(key, value)` pairs in ascending key order.
pub struct Iter<'a, V> {
    nodes: &'a NodeArena<V>,
    stack: Vec<NodeId>,
}

impl<'a, V> Iter<'a, V> {
    pub(crate) fn new(nodes: &'a NodeArena<V>, start: NodeId) -> Self {
        Self {
            nodes,
            stack: vec![start],
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let node = self.nodes.get(id);
            // Reverse so the smallest label is popped first.
            self.stack.extend(node.edges.iter().rev().map(|e| e.node));
            if let Some(leaf) = &node.leaf {
                return Some((&*leaf.key, &leaf.value));
            }
        }
        None
    }
}

impl<'a, V> IntoIterator for &'a RadixTree<V> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
