use std::collections::BinaryHeap;

use fixedbitset::FixedBitSet;

use crate::{
    error::GraphError,
    network_graph::NetworkGraph,
    node::{Node, NodeIdx},
    weighting::{Weight, Weighting},
};

use super::shortest_paths::ShortestPaths;

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    node: NodeIdx,
    distance: Weight,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.node == other.node
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// Reversed to turn the max-heap into a min-heap, lower index first on ties
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Dijkstra search from `source` over non-negative weights.
///
/// Unavailable nodes are never entered. The search stops early once `stop_at` returns true for
/// a settled node, in which case that node is returned alongside the partial tree.
fn search<W, F>(
    graph: &NetworkGraph,
    source: NodeIdx,
    weighting: &W,
    mut stop_at: F,
) -> Result<(ShortestPaths, Option<NodeIdx>), GraphError>
where
    W: Weighting,
    F: FnMut(NodeIdx, &Node) -> bool,
{
    let source_node = graph.node(source)?;

    let mut paths = ShortestPaths::new(source, graph.node_count());
    let mut settled = FixedBitSet::with_capacity(graph.node_count());
    let mut heap = BinaryHeap::new();

    if stop_at(source, source_node) {
        return Ok((paths, Some(source)));
    }

    heap.push(HeapEntry {
        node: source,
        distance: 0.0,
    });

    while let Some(HeapEntry { node, distance }) = heap.pop() {
        if settled.put(node.get()) {
            continue;
        }

        if node != source && stop_at(node, graph.node(node)?) {
            return Ok((paths, Some(node)));
        }

        for edge in graph.out_edges(node) {
            let dest = edge.dest();
            if settled.contains(dest.get()) || !graph.node(dest)?.is_available() {
                continue;
            }

            let weight = weighting.weight(edge.attributes());
            if paths.relax(node, dest, weight) {
                heap.push(HeapEntry {
                    node: dest,
                    distance: distance + weight,
                });
            }
        }
    }

    Ok((paths, None))
}

/// Shortest path tree from `source`, skipping unavailable nodes.
pub fn dijkstra<W>(
    graph: &NetworkGraph,
    source: NodeIdx,
    weighting: &W,
) -> Result<ShortestPaths, GraphError>
where
    W: Weighting,
{
    search(graph, source, weighting, |_, _| false).map(|(paths, _)| paths)
}

/// Shortest path between two nodes as the list of visited nodes and its total weight.
pub fn shortest_path<W>(
    graph: &NetworkGraph,
    source: NodeIdx,
    target: NodeIdx,
    weighting: &W,
) -> Result<(Vec<NodeIdx>, Weight), GraphError>
where
    W: Weighting,
{
    graph.check_node(target)?;

    let (paths, found) = search(graph, source, weighting, |node, _| node == target)?;
    match (found, paths.path_to(target), paths.distance(target)) {
        (Some(_), Some(path), Some(distance)) => Ok((path, distance)),
        _ => Err(GraphError::NoPath {
            from: source,
            to: target,
        }),
    }
}

/// Closest available node, by weight from `source`, for which `predicate` holds. The source
/// itself is a candidate at distance zero.
pub fn nearest_matching<W, F>(
    graph: &NetworkGraph,
    source: NodeIdx,
    weighting: &W,
    mut predicate: F,
) -> Result<Option<(NodeIdx, Vec<NodeIdx>, Weight)>, GraphError>
where
    W: Weighting,
    F: FnMut(NodeIdx, &Node) -> bool,
{
    let (paths, found) = search(graph, source, weighting, |node, attributes| {
        attributes.is_available() && predicate(node, attributes)
    })?;

    Ok(found.and_then(|node| {
        let path = paths.path_to(node)?;
        let distance = paths.distance(node)?;
        Some((node, path, distance))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        node::{NodeBuilder, NodeType},
        test_graph_utils::{add_edge, add_two_way_edge, create_triangle_graph, idx},
        weighting::DistanceWeighting,
    };

    #[test]
    fn test_matches_shortest_distances() {
        let graph = create_triangle_graph();
        let paths = dijkstra(&graph, idx(2), &DistanceWeighting).unwrap();

        assert_eq!(paths.distance(idx(0)), Some(20.0));
        assert_eq!(paths.distance(idx(1)), Some(15.0));
        assert_eq!(paths.distance(idx(4)), None);
    }

    #[test]
    fn test_shortest_path_prefers_detour() {
        let mut graph = NetworkGraph::new(4);
        add_edge(&mut graph, 0, 3, 50.0);
        add_edge(&mut graph, 0, 1, 10.0);
        add_edge(&mut graph, 1, 2, 10.0);
        add_edge(&mut graph, 2, 3, 10.0);

        let (path, distance) = shortest_path(&graph, idx(0), idx(3), &DistanceWeighting).unwrap();
        assert_eq!(path, vec![idx(0), idx(1), idx(2), idx(3)]);
        assert_eq!(distance, 30.0);
    }

    #[test]
    fn test_unavailable_nodes_are_skipped() {
        let mut graph = NetworkGraph::new(4);
        add_edge(&mut graph, 0, 3, 50.0);
        add_edge(&mut graph, 0, 1, 10.0);
        add_edge(&mut graph, 1, 3, 10.0);
        graph.node_mut(idx(1)).unwrap().set_available(false);

        let (path, distance) = shortest_path(&graph, idx(0), idx(3), &DistanceWeighting).unwrap();
        assert_eq!(path, vec![idx(0), idx(3)]);
        assert_eq!(distance, 50.0);

        assert_eq!(
            shortest_path(&graph, idx(0), idx(2), &DistanceWeighting),
            Err(GraphError::NoPath {
                from: idx(0),
                to: idx(2)
            })
        );
    }

    #[test]
    fn test_nearest_matching() {
        let mut graph = NetworkGraph::from_nodes(vec![
            NodeBuilder::default().set_node_type(NodeType::Depot).build(),
            NodeBuilder::default()
                .set_node_type(NodeType::ChargingStation)
                .build(),
            NodeBuilder::default().build(),
            NodeBuilder::default()
                .set_node_type(NodeType::ChargingStation)
                .build(),
        ]);
        add_two_way_edge(&mut graph, 0, 1, 30.0);
        add_two_way_edge(&mut graph, 0, 2, 5.0);
        add_two_way_edge(&mut graph, 2, 3, 5.0);

        let (station, path, distance) =
            nearest_matching(&graph, idx(0), &DistanceWeighting, |_, node| node.can_charge())
                .unwrap()
                .unwrap();
        assert_eq!(station, idx(3));
        assert_eq!(path, vec![idx(0), idx(2), idx(3)]);
        assert_eq!(distance, 10.0);

        graph.node_mut(idx(3)).unwrap().set_available(false);
        let (station, _, distance) =
            nearest_matching(&graph, idx(0), &DistanceWeighting, |_, node| node.can_charge())
                .unwrap()
                .unwrap();
        assert_eq!(station, idx(1));
        assert_eq!(distance, 30.0);

        let none = nearest_matching(&graph, idx(0), &DistanceWeighting, |_, node| {
            node.node_type() == NodeType::RestArea
        })
        .unwrap();
        assert_eq!(none, None);
    }
}
