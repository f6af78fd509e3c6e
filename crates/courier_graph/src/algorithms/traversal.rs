use std::collections::VecDeque;

use fixedbitset::FixedBitSet;

use crate::{error::GraphError, network_graph::NetworkGraph, node::NodeIdx};

/// Depth-first visitation order from `start`.
///
/// Neighbors are explored in traversal order, producing the same order as a recursive search
/// would, without growing the call stack.
pub fn dfs(graph: &NetworkGraph, start: NodeIdx) -> Result<Vec<NodeIdx>, GraphError> {
    graph.check_node(start)?;

    let mut visited = FixedBitSet::with_capacity(graph.node_count());
    let mut order = Vec::new();
    let mut stack = vec![start];

    while let Some(node) = stack.pop() {
        if visited.put(node.get()) {
            continue;
        }
        order.push(node);

        // Reverse push so that the first neighbor in traversal order is popped first
        for edge in graph.out_edges(node).rev() {
            if !visited.contains(edge.dest().get()) {
                stack.push(edge.dest());
            }
        }
    }

    Ok(order)
}

/// Breadth-first visitation order from `start`.
pub fn bfs(graph: &NetworkGraph, start: NodeIdx) -> Result<Vec<NodeIdx>, GraphError> {
    graph.check_node(start)?;

    let mut visited = FixedBitSet::with_capacity(graph.node_count());
    let mut order = Vec::new();
    let mut queue = VecDeque::from([start]);
    visited.insert(start.get());

    while let Some(node) = queue.pop_front() {
        order.push(node);

        for edge in graph.out_edges(node) {
            if !visited.put(edge.dest().get()) {
                queue.push_back(edge.dest());
            }
        }
    }

    Ok(order)
}

/// Whether `dest` can be reached from `src` following edge directions.
pub fn is_accessible(graph: &NetworkGraph, src: NodeIdx, dest: NodeIdx) -> Result<bool, GraphError> {
    graph.check_node(dest)?;
    Ok(bfs(graph, src)?.contains(&dest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_graph_utils::{add_edge, create_chain_graph, create_ring_graph, idx};

    #[test]
    fn test_dfs_follows_most_recent_edge_first() {
        let mut graph = NetworkGraph::new(5);
        add_edge(&mut graph, 0, 1, 1.0);
        add_edge(&mut graph, 0, 2, 1.0);
        add_edge(&mut graph, 1, 3, 1.0);
        add_edge(&mut graph, 2, 4, 1.0);

        let order = dfs(&graph, idx(0)).unwrap();
        assert_eq!(order, vec![idx(0), idx(2), idx(4), idx(1), idx(3)]);
    }

    #[test]
    fn test_bfs_levels() {
        let mut graph = NetworkGraph::new(5);
        add_edge(&mut graph, 0, 1, 1.0);
        add_edge(&mut graph, 0, 2, 1.0);
        add_edge(&mut graph, 1, 3, 1.0);
        add_edge(&mut graph, 2, 4, 1.0);

        let order = bfs(&graph, idx(0)).unwrap();
        assert_eq!(order, vec![idx(0), idx(2), idx(1), idx(4), idx(3)]);
    }

    #[test]
    fn test_traversal_visits_each_node_once() {
        let graph = create_ring_graph(6);

        let order = dfs(&graph, idx(3)).unwrap();
        assert_eq!(order.len(), 6);
        assert_eq!(order[0], idx(3));
        assert_eq!(bfs(&graph, idx(3)).unwrap().len(), 6);
    }

    #[test]
    fn test_is_accessible() {
        let graph = create_chain_graph(4);

        assert!(is_accessible(&graph, idx(0), idx(3)).unwrap());
        assert!(!is_accessible(&graph, idx(3), idx(0)).unwrap());
        assert!(is_accessible(&graph, idx(0), idx(4)).is_err());
    }

    #[test]
    fn test_invalid_start() {
        let graph = create_chain_graph(2);
        assert_eq!(
            dfs(&graph, idx(2)),
            Err(GraphError::InvalidNodeReference {
                node: 2,
                node_count: 2
            })
        );
    }
}
