//! Debug utilities for inspecting tree shape.

use std::fmt::Write;

use crate::node::NodeId;
use crate::RadixTree;

impl<V: std::fmt::Debug> RadixTree<V> {
    /// Renders the node structure, one node per line, indented by depth.
    ///
    /// Prefixes and keys are shown lossily as UTF-8.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "RadixTree: {} keys, {} nodes, {} free slots",
            self.size,
            self.nodes.live(),
            self.nodes.free_slots()
        );
        self.dump_node(&mut out, NodeId::ROOT, 0);
        out
    }

    fn dump_node(&self, out: &mut String, id: NodeId, depth: usize) {
        let node = self.nodes.get(id);
        let indent = "  ".repeat(depth);
        let _ = write!(
            out,
            "{}{} {:?}",
            indent,
            id,
            String::from_utf8_lossy(&node.prefix)
        );
        if let Some(leaf) = &node.leaf {
            let _ = write!(
                out,
                " => {:?}: {:?}",
                String::from_utf8_lossy(&leaf.key),
                leaf.value
            );
        }
        out.push('\n');
        for edge in &node.edges {
            self.dump_node(out, edge.node, depth + 1);
        }
    }
}
