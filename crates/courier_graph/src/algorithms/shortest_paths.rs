use crate::{node::NodeIdx, weighting::Weight};

/// Single-source shortest path tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPaths {
    source: NodeIdx,
    distances: Vec<Weight>,
    predecessors: Vec<Option<NodeIdx>>,
}

impl ShortestPaths {
    pub(crate) fn new(source: NodeIdx, node_count: usize) -> Self {
        let mut distances = vec![Weight::INFINITY; node_count];
        distances[source.get()] = 0.0;
        ShortestPaths {
            source,
            distances,
            predecessors: vec![None; node_count],
        }
    }

    pub(crate) fn relax(&mut self, from: NodeIdx, to: NodeIdx, weight: Weight) -> bool {
        let candidate = self.distances[from.get()] + weight;
        if candidate < self.distances[to.get()] {
            self.distances[to.get()] = candidate;
            self.predecessors[to.get()] = Some(from);
            true
        } else {
            false
        }
    }

    pub fn source(&self) -> NodeIdx {
        self.source
    }

    /// Distance from the source, `None` when unreachable.
    pub fn distance(&self, node: NodeIdx) -> Option<Weight> {
        self.distances
            .get(node.get())
            .copied()
            .filter(|distance| distance.is_finite())
    }

    pub fn distances(&self) -> &[Weight] {
        &self.distances
    }

    pub fn predecessor(&self, node: NodeIdx) -> Option<NodeIdx> {
        self.predecessors.get(node.get()).copied().flatten()
    }

    /// Nodes from the source to `target`, both included. `None` when unreachable.
    pub fn path_to(&self, target: NodeIdx) -> Option<Vec<NodeIdx>> {
        self.distance(target)?;

        let mut path = vec![target];
        let mut current = target;
        while current != self.source {
            current = self.predecessor(current)?;
            path.push(current);
        }

        path.reverse();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_reconstruction() {
        let mut paths = ShortestPaths::new(NodeIdx::new(0), 4);
        assert!(paths.relax(NodeIdx::new(0), NodeIdx::new(1), 2.0));
        assert!(paths.relax(NodeIdx::new(1), NodeIdx::new(2), 3.0));
        assert!(!paths.relax(NodeIdx::new(0), NodeIdx::new(2), 6.0));

        assert_eq!(paths.distance(NodeIdx::new(2)), Some(5.0));
        assert_eq!(
            paths.path_to(NodeIdx::new(2)),
            Some(vec![NodeIdx::new(0), NodeIdx::new(1), NodeIdx::new(2)])
        );
        assert_eq!(paths.path_to(NodeIdx::new(0)), Some(vec![NodeIdx::new(0)]));
        assert_eq!(paths.distance(NodeIdx::new(3)), None);
        assert_eq!(paths.path_to(NodeIdx::new(3)), None);
    }
}
