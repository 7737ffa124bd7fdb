//! Structural integrity failures reported by [`RadixTree::validate`](crate::RadixTree::validate).

use thiserror::Error;

use crate::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("root node {node} carries a non-empty prefix")]
    RootHasPrefix { node: NodeId },

    #[error("node {node} has an empty prefix")]
    EmptyPrefix { node: NodeId },

    #[error("node {node} has edges out of order or a repeated label")]
    UnsortedEdges { node: NodeId },

    #[error("edge {label:#04x} of node {node} leads to a child whose prefix starts differently")]
    LabelMismatch { node: NodeId, label: u8 },

    #[error("edge {label:#04x} of node {node} leads to a vacant slot")]
    DanglingEdge { node: NodeId, label: u8 },

    #[error("node {node} is reachable more than once")]
    SharedNode { node: NodeId },

    #[error("non-root node {node} has neither a leaf nor edges")]
    DeadNode { node: NodeId },

    #[error("non-root node {node} has no leaf and a single edge")]
    PassThrough { node: NodeId },

    #[error("leaf at node {node} stores a key that differs from its path")]
    KeyMismatch { node: NodeId },

    #[error("tree reports {recorded} keys but holds {found}")]
    SizeMismatch { recorded: usize, found: usize },

    #[error("node {node} is live but not reachable from the root")]
    Unreachable { node: NodeId },

    #[error("{vacant} vacant slots but {listed} on the free list")]
    FreeListMismatch { vacant: usize, listed: usize },
}
