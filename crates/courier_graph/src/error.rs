use thiserror::Error;

use crate::node::NodeIdx;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Invalid node reference {node}, graph has {node_count} nodes")]
    InvalidNodeReference { node: usize, node_count: usize },

    #[error("Negative cost cycle detected")]
    NegativeCycleDetected,

    #[error("Graph is disconnected: no unvisited neighbor reachable from node {at} after visiting {visited} nodes")]
    GraphDisconnected { at: NodeIdx, visited: usize },

    #[error("No path from node {from} to node {to}")]
    NoPath { from: NodeIdx, to: NodeIdx },
}
