use tracing::instrument;

use crate::{network_graph::NetworkGraph, node::NodeIdx, weighting::Weight};

/// Dense all-pairs distance matrix, `f64::INFINITY` when unreachable.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    node_count: usize,
    distances: Vec<Weight>,
}

impl DistanceMatrix {
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline(always)]
    pub fn distance(&self, from: NodeIdx, to: NodeIdx) -> Weight {
        self.distances[from.get() * self.node_count + to.get()]
    }

    pub fn row(&self, from: NodeIdx) -> &[Weight] {
        let start = from.get() * self.node_count;
        &self.distances[start..start + self.node_count]
    }
}

/// All-pairs shortest distances by edge length, in O(V³).
///
/// Direct distances are filled in traversal order, so with parallel edges the last one
/// encountered, i.e. the oldest edge, is the one the relaxation starts from. Self loops are
/// ignored so the diagonal stays at zero.
#[instrument(skip_all, level = "debug")]
pub fn floyd_warshall(graph: &NetworkGraph) -> DistanceMatrix {
    let n = graph.node_count();
    let mut distances = vec![Weight::INFINITY; n * n];

    for (from, node) in (0..n).map(|from| (from, NodeIdx::new(from))) {
        distances[from * n + from] = 0.0;
        for edge in graph.out_edges(node).filter(|edge| edge.dest() != node) {
            distances[from * n + edge.dest().get()] = edge.attributes().distance;
        }
    }

    for k in 0..n {
        for i in 0..n {
            let through_k = distances[i * n + k];
            if through_k == Weight::INFINITY {
                continue;
            }
            for j in 0..n {
                let candidate = through_k + distances[k * n + j];
                if candidate < distances[i * n + j] {
                    distances[i * n + j] = candidate;
                }
            }
        }
    }

    DistanceMatrix {
        node_count: n,
        distances,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_graph_utils::{
        add_edge, create_complete_graph, create_ring_graph, create_triangle_graph, idx,
    };

    #[test]
    fn test_ring_distances() {
        let matrix = floyd_warshall(&create_ring_graph(5));

        assert_eq!(matrix.distance(idx(0), idx(4)), 4.0);
        assert_eq!(matrix.distance(idx(4), idx(0)), 1.0);
        assert_eq!(matrix.distance(idx(2), idx(1)), 4.0);
        assert_eq!(matrix.row(idx(0)), &[0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_unreachable_is_infinite() {
        let matrix = floyd_warshall(&create_triangle_graph());

        assert_eq!(matrix.distance(idx(0), idx(3)), f64::INFINITY);
        assert_eq!(matrix.distance(idx(3), idx(3)), 0.0);
        assert_eq!(matrix.distance(idx(0), idx(2)), 20.0);
    }

    #[test]
    fn test_oldest_parallel_edge_is_kept_before_relaxation() {
        let mut graph = NetworkGraph::new(2);
        add_edge(&mut graph, 0, 1, 8.0);
        add_edge(&mut graph, 0, 1, 3.0);

        let matrix = floyd_warshall(&graph);
        assert_eq!(matrix.distance(idx(0), idx(1)), 8.0);
    }

    #[test]
    fn test_matrix_properties() {
        let graph = create_complete_graph(6);
        let matrix = floyd_warshall(&graph);
        let n = graph.node_count();

        for i in (0..n).map(idx) {
            assert_eq!(matrix.distance(i, i), 0.0);
            for j in (0..n).map(idx) {
                assert!(matrix.distance(i, j) >= 0.0);
                for k in (0..n).map(idx) {
                    assert!(
                        matrix.distance(i, j)
                            <= matrix.distance(i, k) + matrix.distance(k, j) + 1e-9
                    );
                }
            }
        }
    }
}
