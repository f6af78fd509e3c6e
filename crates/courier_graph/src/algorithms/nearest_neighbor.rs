use fixedbitset::FixedBitSet;
use serde::Serialize;

use crate::{error::GraphError, network_graph::NetworkGraph, node::NodeIdx};

/// Closed tour visiting every node once, starting and ending at the same node.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Tour {
    nodes: Vec<NodeIdx>,
    total_distance: f64,
}

impl Tour {
    /// Visited nodes, `V + 1` entries with the start repeated at the end.
    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    /// Distance of the edges chosen while building the tour, excluding the closing leg which
    /// need not be a direct edge.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }
}

/// Nearest-neighbor tour heuristic.
///
/// From the current node, moves along the shortest edge to an unvisited node. Ties keep the
/// first edge in traversal order. Fails with [`GraphError::GraphDisconnected`] when a node has
/// no edge to an unvisited node before the tour is complete.
pub fn nearest_neighbor_tour(graph: &NetworkGraph, start: NodeIdx) -> Result<Tour, GraphError> {
    graph.check_node(start)?;

    let node_count = graph.node_count();
    let mut visited = FixedBitSet::with_capacity(node_count);
    let mut nodes = Vec::with_capacity(node_count + 1);
    let mut total_distance = 0.0;

    visited.insert(start.get());
    nodes.push(start);
    let mut current = start;

    while nodes.len() < node_count {
        let mut best: Option<(NodeIdx, f64)> = None;
        for edge in graph.out_edges(current) {
            let distance = edge.attributes().distance;
            if visited.contains(edge.dest().get()) {
                continue;
            }
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((edge.dest(), distance));
            }
        }

        let (next, distance) = best.ok_or(GraphError::GraphDisconnected {
            at: current,
            visited: nodes.len(),
        })?;

        visited.insert(next.get());
        nodes.push(next);
        total_distance += distance;
        current = next;
    }

    nodes.push(start);

    Ok(Tour {
        nodes,
        total_distance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_graph_utils::{
        add_edge, create_complete_graph, create_ring_graph, create_triangle_graph, idx,
    };

    #[test]
    fn test_complete_graph_tour() {
        let graph = create_complete_graph(6);
        let tour = nearest_neighbor_tour(&graph, idx(2)).unwrap();

        let nodes = tour.nodes();
        assert_eq!(nodes.len(), 7);
        assert_eq!(nodes.first(), Some(&idx(2)));
        assert_eq!(nodes.last(), Some(&idx(2)));

        let mut inner = nodes[..6].to_vec();
        inner.sort();
        assert_eq!(inner, (0..6).map(idx).collect::<Vec<_>>());
    }

    #[test]
    fn test_ring_tour() {
        let tour = nearest_neighbor_tour(&create_ring_graph(4), idx(0)).unwrap();

        assert_eq!(tour.nodes(), &[idx(0), idx(1), idx(2), idx(3), idx(0)]);
        assert_eq!(tour.total_distance(), 3.0);
    }

    #[test]
    fn test_tie_keeps_first_edge_in_traversal_order() {
        let mut graph = NetworkGraph::new(3);
        add_edge(&mut graph, 0, 1, 5.0);
        add_edge(&mut graph, 0, 2, 5.0);
        add_edge(&mut graph, 2, 1, 5.0);
        add_edge(&mut graph, 1, 2, 5.0);

        let tour = nearest_neighbor_tour(&graph, idx(0)).unwrap();
        assert_eq!(tour.nodes(), &[idx(0), idx(2), idx(1), idx(0)]);
    }

    #[test]
    fn test_disconnected_graph_fails() {
        let result = nearest_neighbor_tour(&create_triangle_graph(), idx(0));

        assert!(matches!(
            result,
            Err(GraphError::GraphDisconnected { visited: 3, .. })
        ));
    }

    #[test]
    fn test_single_node() {
        let tour = nearest_neighbor_tour(&NetworkGraph::new(1), idx(0)).unwrap();
        assert_eq!(tour.nodes(), &[idx(0), idx(0)]);
    }
}
