use crate::{
    edge::{EdgeAttributes, RoadCondition},
    network_graph::NetworkGraph,
    node::NodeIdx,
};

pub fn idx(index: usize) -> NodeIdx {
    NodeIdx::new(index)
}

pub fn add_edge(graph: &mut NetworkGraph, src: usize, dest: usize, distance: f64) {
    graph
        .add_edge(
            idx(src),
            idx(dest),
            EdgeAttributes::new(distance, distance / 50.0, distance),
        )
        .unwrap();
}

pub fn add_two_way_edge(graph: &mut NetworkGraph, a: usize, b: usize, distance: f64) {
    add_edge(graph, a, b, distance);
    add_edge(graph, b, a, distance);
}

/// 0 -> 1 -> 2 -> ... -> n-1 -> 0
pub fn create_ring_graph(node_count: usize) -> NetworkGraph {
    let mut graph = NetworkGraph::new(node_count);
    for node in 0..node_count {
        add_edge(&mut graph, node, (node + 1) % node_count, 1.0);
    }
    graph
}

/// Ring graph without the closing edge.
pub fn create_chain_graph(node_count: usize) -> NetworkGraph {
    let mut graph = NetworkGraph::new(node_count);
    for node in 0..node_count.saturating_sub(1) {
        add_edge(&mut graph, node, node + 1, 1.0);
    }
    graph
}

/// Every ordered pair connected, distance `|i - j| * 10 + i`.
pub fn create_complete_graph(node_count: usize) -> NetworkGraph {
    let mut graph = NetworkGraph::new(node_count);
    for i in 0..node_count {
        for j in 0..node_count {
            if i != j {
                add_edge(&mut graph, i, j, (i.abs_diff(j) * 10 + i) as f64);
            }
        }
    }
    graph
}

/// Five nodes, two-way roads 0-1 (10 km, excellent), 1-2 (15 km, good) and 0-2 (20 km, fair).
/// Nodes 3 and 4 are isolated.
pub fn create_triangle_graph() -> NetworkGraph {
    let mut graph = NetworkGraph::new(5);
    let roads = [
        (0, 1, 10.0, RoadCondition::Excellent),
        (1, 2, 15.0, RoadCondition::Good),
        (0, 2, 20.0, RoadCondition::Fair),
    ];

    for (a, b, distance, condition) in roads {
        let attributes =
            EdgeAttributes::new(distance, distance / 50.0, distance).with_condition(condition);
        graph.add_edge(idx(a), idx(b), attributes.clone()).unwrap();
        graph.add_edge(idx(b), idx(a), attributes).unwrap();
    }

    graph
}
