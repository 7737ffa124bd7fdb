use crate::error::IntegrityError;
use crate::node::NodeId;
use crate::RadixTree;

impl<V> RadixTree<V> {
    /// Checks every structural invariant of the tree.
    ///
    /// Mutations keep these invariants on their own; this is meant for tests
    /// and for auditing a tree after a suspected bug.
    pub fn validate(&self) -> Result<(), IntegrityError> {
        let root = self.nodes.get(NodeId::ROOT);
        if !root.prefix.is_empty() {
            return Err(IntegrityError::RootHasPrefix {
                node: NodeId::ROOT,
            });
        }

        let mut seen = vec![false; self.nodes.slot_count()];
        let mut leaves = 0usize;
        let mut stack: Vec<(NodeId, Vec<u8>)> = vec![(NodeId::ROOT, Vec::new())];

        while let Some((id, path)) = stack.pop() {
            if std::mem::replace(&mut seen[id.index()], true) {
                return Err(IntegrityError::SharedNode { node: id });
            }
            let node = self.nodes.get(id);

            if id != NodeId::ROOT {
                if node.prefix.is_empty() {
                    return Err(IntegrityError::EmptyPrefix { node: id });
                }
                match (node.is_leaf(), node.edges.len()) {
                    (false, 0) => return Err(IntegrityError::DeadNode { node: id }),
                    (false, 1) => return Err(IntegrityError::PassThrough { node: id }),
                    _ => {}
                }
            }

            if let Some(leaf) = &node.leaf {
                if *leaf.key != *path {
                    return Err(IntegrityError::KeyMismatch { node: id });
                }
                leaves += 1;
            }

            if node.edges.windows(2).any(|w| w[0].label >= w[1].label) {
                return Err(IntegrityError::UnsortedEdges { node: id });
            }

            for edge in &node.edges {
                if !self.nodes.is_live(edge.node) {
                    return Err(IntegrityError::DanglingEdge {
                        node: id,
                        label: edge.label,
                    });
                }
                let child = self.nodes.get(edge.node);
                if child.prefix.first() != Some(&edge.label) {
                    return Err(IntegrityError::LabelMismatch {
                        node: id,
                        label: edge.label,
                    });
                }
                let mut child_path = path.clone();
                child_path.extend_from_slice(&child.prefix);
                stack.push((edge.node, child_path));
            }
        }

        if leaves != self.size {
            return Err(IntegrityError::SizeMismatch {
                recorded: self.size,
                found: leaves,
            });
        }

        if let Some((id, _)) = self.nodes.iter_live().find(|(id, _)| !seen[id.index()]) {
            return Err(IntegrityError::Unreachable { node: id });
        }

        let vacant = self.nodes.vacant_slots();
        if vacant != self.nodes.free_slots() {
            return Err(IntegrityError::FreeListMismatch {
                vacant,
                listed: self.nodes.free_slots(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Edge, Node};

    fn sample() -> RadixTree<u32> {
        ["team", "test", "toast", "t"]
            .iter()
            .enumerate()
            .map(|(i, k)| (k, i as u32))
            .collect()
    }

    #[test]
    fn test_valid_tree_passes() {
        sample().validate().unwrap();
        RadixTree::<()>::new().validate().unwrap();
    }

    #[test]
    fn test_detects_size_mismatch() {
        let mut t = sample();
        t.size += 1;
        assert_eq!(
            t.validate(),
            Err(IntegrityError::SizeMismatch {
                recorded: 5,
                found: 4
            })
        );
    }

    #[test]
    fn test_detects_pass_through() {
        let mut t = sample();
        let id = t.find(b"t").unwrap().node;
        t.nodes.get_mut(id).leaf = None;
        t.size -= 1;
        // "t" still has edges 'e' and 'o'; drop one to leave a pass-through node.
        let removed = t.nodes.get_mut(id).delete_edge(b'o').unwrap();
        t.size -= t.nodes.free_subtree(removed);
        assert_eq!(t.validate(), Err(IntegrityError::PassThrough { node: id }));
    }

    #[test]
    fn test_detects_label_mismatch() {
        let mut t = sample();
        let id = t.find(b"t").unwrap().node;
        let child = t.nodes.get(id).get_edge(b'o').unwrap();
        t.nodes.get_mut(child).prefix[0] = b'p';
        assert_eq!(
            t.validate(),
            Err(IntegrityError::LabelMismatch {
                node: id,
                label: b'o'
            })
        );
    }

    #[test]
    fn test_detects_unreachable_node() {
        let mut t = sample();
        let stray = t.nodes.alloc(Node::with_leaf(b"x", b"x", 9));
        assert_eq!(t.validate(), Err(IntegrityError::Unreachable { node: stray }));
    }

    #[test]
    fn test_detects_shared_node() {
        let mut t = sample();
        let id = t.find(b"toast").unwrap().node;
        t.nodes.get_mut(NodeId::ROOT).add_edge(Edge {
            label: b'o',
            node: id,
        });
        assert!(t.validate().is_err());
    }
}
