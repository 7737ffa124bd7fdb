//! Node, edge and arena representation.
//!
//! Nodes live in a [`NodeArena`] and refer to each other by [`NodeId`]. Each
//! live slot is named by exactly one edge (or by the tree, for the root), so
//! ownership stays strictly hierarchical even though the storage is flat.

use smallvec::SmallVec;

/// Inline capacity for node prefixes. Most compressed segments are short.
pub(crate) const INLINE_PREFIX: usize = 16;

pub(crate) type Prefix = SmallVec<[u8; INLINE_PREFIX]>;

/// Index of a node slot in the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// The root always occupies the first slot and is never freed.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn from_index(idx: usize) -> Self {
        assert!(idx < u32::MAX as usize, "node arena overflow: {idx} slots");
        Self(idx as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Labeled link to an owned child. `label` is the first byte of the child's prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Edge {
    pub(crate) label: u8,
    pub(crate) node: NodeId,
}

/// Payload stored where an inserted key terminates.
#[derive(Clone, Debug)]
pub(crate) struct Leaf<V> {
    pub(crate) key: Box<[u8]>,
    pub(crate) value: V,
}

#[derive(Clone, Debug)]
pub(crate) struct Node<V> {
    pub(crate) prefix: Prefix,
    pub(crate) leaf: Option<Leaf<V>>,
    /// Sorted ascending by label, one edge per label.
    pub(crate) edges: Vec<Edge>,
}

impl<V> Node<V> {
    pub(crate) fn new(prefix: &[u8]) -> Self {
        Self {
            prefix: Prefix::from_slice(prefix),
            leaf: None,
            edges: Vec::new(),
        }
    }

    pub(crate) fn with_leaf(prefix: &[u8], key: &[u8], value: V) -> Self {
        Self {
            prefix: Prefix::from_slice(prefix),
            leaf: Some(Leaf {
                key: key.into(),
                value,
            }),
            edges: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.leaf.is_some()
    }

    #[inline]
    fn search(&self, label: u8) -> Result<usize, usize> {
        self.edges.binary_search_by_key(&label, |e| e.label)
    }

    pub(crate) fn add_edge(&mut self, edge: Edge) {
        match self.search(edge.label) {
            Ok(idx) => panic!(
                "add_edge: label {:#04x} already present (child {})",
                edge.label, self.edges[idx].node
            ),
            Err(idx) => self.edges.insert(idx, edge),
        }
    }

    /// Re-points an existing edge. A missing label means the tree is corrupt.
    pub(crate) fn update_edge(&mut self, label: u8, node: NodeId) {
        match self.search(label) {
            Ok(idx) => self.edges[idx].node = node,
            Err(_) => panic!("update_edge: edge {label:#04x} not found"),
        }
    }

    #[inline]
    pub(crate) fn get_edge(&self, label: u8) -> Option<NodeId> {
        self.search(label).ok().map(|idx| self.edges[idx].node)
    }

    pub(crate) fn delete_edge(&mut self, label: u8) -> Option<NodeId> {
        self.search(label).ok().map(|idx| self.edges.remove(idx).node)
    }

    fn heap_bytes(&self) -> usize {
        let prefix = if self.prefix.spilled() {
            self.prefix.capacity()
        } else {
            0
        };
        let key = self.leaf.as_ref().map_or(0, |l| l.key.len());
        prefix + key + self.edges.capacity() * std::mem::size_of::<Edge>()
    }
}

/// Slot arena for tree nodes, with a free list of vacated slots.
#[derive(Clone)]
pub(crate) struct NodeArena<V> {
    slots: Vec<Option<Node<V>>>,
    free: Vec<NodeId>,
}

impl<V> NodeArena<V> {
    /// Creates an arena holding only an empty root.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.push(Some(Node::new(&[])));
        Self {
            slots,
            free: Vec::new(),
        }
    }

    pub(crate) fn alloc(&mut self, node: Node<V>) -> NodeId {
        if let Some(id) = self.free.pop() {
            debug_assert!(self.slots[id.index()].is_none());
            self.slots[id.index()] = Some(node);
            return id;
        }
        let id = NodeId::from_index(self.slots.len());
        self.slots.push(Some(node));
        id
    }

    /// Vacates a slot and hands back its node.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<V> {
        assert_ne!(id, NodeId::ROOT, "the root slot is never freed");
        let node = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("free: node {id} already vacant"));
        self.free.push(id);
        node
    }

    /// Frees `id` and every node below it, returning the number of leaves dropped.
    pub(crate) fn free_subtree(&mut self, id: NodeId) -> usize {
        let mut leaves = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = self.free(id);
            leaves += usize::from(node.is_leaf());
            stack.extend(node.edges.iter().map(|e| e.node));
        }
        leaves
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<V> {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("node {id} is vacant"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<V> {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("node {id} is vacant"),
        }
    }

    #[inline]
    pub(crate) fn is_live(&self, id: NodeId) -> bool {
        matches!(self.slots.get(id.index()), Some(Some(_)))
    }

    pub(crate) fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn free_slots(&self) -> usize {
        self.free.len()
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn memory_usage(&self) -> usize {
        let nodes: usize = self
            .slots
            .iter()
            .flatten()
            .map(Node::heap_bytes)
            .sum();
        self.slots.capacity() * std::mem::size_of::<Option<Node<V>>>()
            + self.free.capacity() * std::mem::size_of::<NodeId>()
            + nodes
    }

    pub(crate) fn shrink_to_fit(&mut self) {
        // Trailing vacant slots can be dropped outright.
        while self.slots.len() > 1 && matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        let len = self.slots.len();
        self.free.retain(|id| id.index() < len);
        self.slots.shrink_to_fit();
        self.free.shrink_to_fit();
        for node in self.slots.iter_mut().flatten() {
            node.edges.shrink_to_fit();
            node.prefix.shrink_to_fit();
        }
    }

    /// Re-packs live nodes in depth-first order with no vacant slots.
    /// Returns how many slots were reclaimed.
    pub(crate) fn compact(&mut self) -> usize {
        let before = self.slots.len();
        let mut old = std::mem::take(&mut self.slots);
        let mut packed: Vec<Option<Node<V>>> = Vec::with_capacity(before - self.free.len());

        // (old id, slot in `packed` of the parent edge to patch)
        let mut stack: Vec<(NodeId, Option<(usize, usize)>)> = vec![(NodeId::ROOT, None)];
        while let Some((old_id, parent)) = stack.pop() {
            let node = old[old_id.index()]
                .take()
                .unwrap_or_else(|| panic!("compact: edge to vacant node {old_id}"));
            let new_id = NodeId::from_index(packed.len());
            if let Some((parent_idx, edge_idx)) = parent {
                if let Some(p) = packed[parent_idx].as_mut() {
                    p.edges[edge_idx].node = new_id;
                }
            }
            // Reverse so the first edge is packed right after its parent.
            for (edge_idx, e) in node.edges.iter().enumerate().rev() {
                stack.push((e.node, Some((new_id.index(), edge_idx))));
            }
            packed.push(Some(node));
        }

        self.slots = packed;
        self.free.clear();
        before - self.slots.len()
    }

    /// Iterates `(id, node)` for every live slot.
    pub(crate) fn iter_live(&self) -> impl Iterator<Item = (NodeId, &Node<V>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (NodeId::from_index(i), n)))
    }

    /// Counts vacant slots by scanning, independent of the free list.
    pub(crate) fn vacant_slots(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_none()).count()
    }
}
