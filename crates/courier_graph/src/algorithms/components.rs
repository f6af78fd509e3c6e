use fixedbitset::FixedBitSet;

use crate::{network_graph::NetworkGraph, node::NodeIdx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Components {
    component_of: Vec<usize>,
    count: usize,
}

impl Components {
    pub fn component_of(&self, node: NodeIdx) -> usize {
        self.component_of[node.get()]
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.component_of
    }

    pub fn same_component(&self, a: NodeIdx, b: NodeIdx) -> bool {
        self.component_of(a) == self.component_of(b)
    }
}

/// Labels nodes with component ids.
///
/// Nodes are scanned in index order; each node not yet labeled starts a new component made of
/// itself and every unlabeled node reachable from it through outgoing edges.
pub fn connected_components(graph: &NetworkGraph) -> Components {
    let node_count = graph.node_count();
    let mut visited = FixedBitSet::with_capacity(node_count);
    let mut component_of = vec![0; node_count];
    let mut count = 0;
    let mut stack = Vec::new();

    for start in 0..node_count {
        if visited.contains(start) {
            continue;
        }

        stack.push(NodeIdx::new(start));
        while let Some(node) = stack.pop() {
            if visited.put(node.get()) {
                continue;
            }
            component_of[node.get()] = count;

            stack.extend(
                graph
                    .out_edges(node)
                    .map(|edge| edge.dest())
                    .filter(|dest| !visited.contains(dest.get())),
            );
        }

        count += 1;
    }

    Components {
        component_of,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_graph_utils::{create_ring_graph, create_triangle_graph, idx};

    #[test]
    fn test_ring_is_single_component() {
        let components = connected_components(&create_ring_graph(7));

        assert_eq!(components.count(), 1);
        assert!(components.as_slice().iter().all(|&component| component == 0));
    }

    #[test]
    fn test_isolated_nodes_get_their_own_component() {
        let components = connected_components(&create_triangle_graph());

        assert_eq!(components.count(), 3);
        assert_eq!(components.as_slice(), &[0, 0, 0, 1, 2]);
        assert!(components.same_component(idx(0), idx(2)));
        assert!(!components.same_component(idx(3), idx(4)));
    }

    #[test]
    fn test_empty_graph() {
        let components = connected_components(&NetworkGraph::new(0));
        assert_eq!(components.count(), 0);
    }
}
