use fixedbitset::FixedBitSet;

use crate::{
    network_graph::{Neighbors, NetworkGraph},
    node::NodeIdx,
};

/// Returns true if the graph contains a directed cycle, self loops included.
///
/// Iterative depth-first search keeping, for each node, whether it is on the current path.
/// Returns as soon as an edge back to a node on the path is found.
pub fn has_cycle(graph: &NetworkGraph) -> bool {
    let node_count = graph.node_count();
    let mut visited = FixedBitSet::with_capacity(node_count);
    let mut on_stack = FixedBitSet::with_capacity(node_count);
    let mut stack: Vec<(NodeIdx, Neighbors<'_>)> = Vec::new();

    for start in 0..node_count {
        if visited.contains(start) {
            continue;
        }

        let start = NodeIdx::new(start);
        visited.insert(start.get());
        on_stack.insert(start.get());
        stack.push((start, graph.out_edges(start)));

        while let Some((node, neighbors)) = stack.last_mut() {
            match neighbors.next() {
                Some(edge) => {
                    let dest = edge.dest().get();
                    if on_stack.contains(dest) {
                        return true;
                    }
                    if !visited.put(dest) {
                        on_stack.insert(dest);
                        stack.push((edge.dest(), graph.out_edges(edge.dest())));
                    }
                }
                None => {
                    on_stack.set(node.get(), false);
                    stack.pop();
                }
            }
        }
    }

    false
}
