use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    edge::{Edge, EdgeAttributes, TravelConditions},
    error::GraphError,
    node::{MINUTES_PER_DAY, Node, NodeIdx, NodeType},
};

/// Lazy sequence of the outgoing edges of a node, most recently added edge first.
pub type Neighbors<'a> = std::iter::Rev<std::slice::Iter<'a, Edge>>;

/// Weighted directed multigraph.
///
/// Every node owns its outgoing edges. Edges are stored in insertion order but are always
/// traversed from the most recently added to the oldest one, so an edge added later between
/// the same pair of nodes shadows older ones for any algorithm that picks the first matching
/// edge.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct NetworkGraph {
    nodes: Vec<Node>,
    adjacency_list: Vec<Vec<Edge>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteValidation {
    Valid { arrival_minutes: f64 },
    MissingEdge { from: NodeIdx, to: NodeIdx },
    ClosedNode { node: NodeIdx, arrival_minutes: f64 },
}

impl RouteValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, RouteValidation::Valid { .. })
    }
}

impl NetworkGraph {
    pub fn new(node_count: usize) -> Self {
        NetworkGraph {
            nodes: vec![Node::default(); node_count],
            adjacency_list: vec![vec![]; node_count],
        }
    }

    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        let adjacency_list = vec![vec![]; nodes.len()];
        NetworkGraph {
            nodes,
            adjacency_list,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency_list.iter().map(|edges| edges.len()).sum()
    }

    pub fn check_node(&self, node: NodeIdx) -> Result<NodeIdx, GraphError> {
        if node.get() < self.nodes.len() {
            Ok(node)
        } else {
            Err(GraphError::InvalidNodeReference {
                node: node.get(),
                node_count: self.nodes.len(),
            })
        }
    }

    pub fn node(&self, node: NodeIdx) -> Result<&Node, GraphError> {
        self.check_node(node)?;
        Ok(&self.nodes[node])
    }

    pub fn node_mut(&mut self, node: NodeIdx) -> Result<&mut Node, GraphError> {
        self.check_node(node)?;
        Ok(&mut self.nodes[node])
    }

    pub fn set_node(&mut self, node: NodeIdx, attributes: Node) -> Result<(), GraphError> {
        *self.node_mut(node)? = attributes;
        Ok(())
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeIdx::new(index), node))
    }

    pub fn nodes_of_type(&self, node_type: NodeType) -> impl Iterator<Item = NodeIdx> + '_ {
        self.nodes()
            .filter(move |(_, node)| node.node_type() == node_type)
            .map(|(index, _)| index)
    }

    pub fn add_edge(
        &mut self,
        src: NodeIdx,
        dest: NodeIdx,
        attributes: EdgeAttributes,
    ) -> Result<(), GraphError> {
        self.check_node(src)?;
        self.check_node(dest)?;

        self.adjacency_list[src.get()].push(Edge::new(dest, attributes));
        Ok(())
    }

    /// Removes the first edge `src -> dest` in traversal order, i.e. the most recently added.
    pub fn remove_edge(
        &mut self,
        src: NodeIdx,
        dest: NodeIdx,
    ) -> Result<Option<EdgeAttributes>, GraphError> {
        self.check_node(src)?;
        self.check_node(dest)?;

        let edges = &mut self.adjacency_list[src.get()];
        let removed = edges
            .iter()
            .rposition(|edge| edge.dest() == dest)
            .map(|position| edges.remove(position).attributes().clone());

        Ok(removed)
    }

    pub fn neighbors(&self, node: NodeIdx) -> Result<Neighbors<'_>, GraphError> {
        self.check_node(node)?;
        Ok(self.out_edges(node))
    }

    /// Unchecked variant of [`NetworkGraph::neighbors`] for callers that validated `node`.
    #[inline]
    pub(crate) fn out_edges(&self, node: NodeIdx) -> Neighbors<'_> {
        self.adjacency_list[node.get()].iter().rev()
    }

    /// First edge `src -> dest` in traversal order.
    pub fn first_edge(
        &self,
        src: NodeIdx,
        dest: NodeIdx,
    ) -> Result<Option<&EdgeAttributes>, GraphError> {
        self.check_node(dest)?;
        Ok(self
            .neighbors(src)?
            .find(|edge| edge.dest() == dest)
            .map(|edge| edge.attributes()))
    }

    /// All edges as `(source, edge)`, each node's edges in traversal order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIdx, &Edge)> {
        self.adjacency_list
            .iter()
            .enumerate()
            .flat_map(|(src, edges)| edges.iter().rev().map(move |edge| (NodeIdx::new(src), edge)))
    }

    /// All edges in the order they were added, per source node. Re-adding them in this order
    /// reproduces the same traversal order.
    pub fn edges_in_insertion_order(&self) -> impl Iterator<Item = (NodeIdx, &Edge)> {
        self.adjacency_list
            .iter()
            .enumerate()
            .flat_map(|(src, edges)| edges.iter().map(move |edge| (NodeIdx::new(src), edge)))
    }

    pub fn edges_mut(&mut self) -> impl Iterator<Item = (NodeIdx, &mut Edge)> {
        self.adjacency_list
            .iter_mut()
            .enumerate()
            .flat_map(|(src, edges)| edges.iter_mut().map(move |edge| (NodeIdx::new(src), edge)))
    }

    /// Sum of the costs of the first matching edge between consecutive nodes. Pairs without a
    /// direct edge contribute nothing.
    pub fn route_cost(&self, route: &[NodeIdx]) -> Result<f64, GraphError> {
        let mut total_cost = 0.0;
        for pair in route.windows(2) {
            if let Some(attributes) = self.first_edge(pair[0], pair[1])? {
                total_cost += attributes.cost;
            }
        }

        Ok(total_cost)
    }

    /// Checks that consecutive nodes are connected by a direct edge and that each node is open
    /// when reached, starting at `start_minutes`.
    pub fn validate_route(
        &self,
        route: &[NodeIdx],
        start_minutes: f64,
        conditions: &TravelConditions,
    ) -> Result<RouteValidation, GraphError> {
        for &node in route {
            self.check_node(node)?;
        }

        let mut current_time = start_minutes;
        for (position, &node) in route.iter().enumerate() {
            let minute_of_day = current_time % MINUTES_PER_DAY;
            if !self.nodes[node].is_open_at(minute_of_day) {
                return Ok(RouteValidation::ClosedNode {
                    node,
                    arrival_minutes: current_time,
                });
            }

            if let Some(&next) = route.get(position + 1) {
                match self.first_edge(node, next)? {
                    Some(attributes) => current_time += attributes.travel_time(conditions) * 60.0,
                    None => {
                        return Ok(RouteValidation::MissingEdge {
                            from: node,
                            to: next,
                        });
                    }
                }
            }
        }

        Ok(RouteValidation::Valid {
            arrival_minutes: current_time,
        })
    }
}

impl fmt::Display for NetworkGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, node) in self.nodes() {
            writeln!(f, "Node {} ({}, {}):", index, node.name(), node.node_type())?;
            for edge in self.out_edges(index) {
                let attributes = edge.attributes();
                writeln!(
                    f,
                    "  -> {} ({:.1} km, {:.1} h, {:.1} cost)",
                    edge.dest(),
                    attributes.distance,
                    attributes.base_time,
                    attributes.cost
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeBuilder;

    fn idx(index: usize) -> NodeIdx {
        NodeIdx::new(index)
    }

    #[test]
    fn test_add_edge_rejects_invalid_nodes() {
        let mut graph = NetworkGraph::new(3);

        let result = graph.add_edge(idx(0), idx(3), EdgeAttributes::new(1.0, 1.0, 1.0));
        assert_eq!(
            result,
            Err(GraphError::InvalidNodeReference {
                node: 3,
                node_count: 3
            })
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_most_recent_edge_is_traversed_first() {
        let mut graph = NetworkGraph::new(3);
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(10.0, 1.0, 1.0))
            .unwrap();
        graph
            .add_edge(idx(0), idx(2), EdgeAttributes::new(20.0, 1.0, 1.0))
            .unwrap();
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(5.0, 1.0, 1.0))
            .unwrap();

        let distances = graph
            .neighbors(idx(0))
            .unwrap()
            .map(|edge| (edge.dest().get(), edge.attributes().distance))
            .collect::<Vec<_>>();

        assert_eq!(distances, vec![(1, 5.0), (2, 20.0), (1, 10.0)]);
        assert_eq!(
            graph.first_edge(idx(0), idx(1)).unwrap().unwrap().distance,
            5.0
        );
    }

    #[test]
    fn test_neighbors_is_restartable() {
        let mut graph = NetworkGraph::new(3);
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(1.0, 1.0, 1.0))
            .unwrap();
        graph
            .add_edge(idx(0), idx(2), EdgeAttributes::new(1.0, 1.0, 1.0))
            .unwrap();

        let neighbors = graph.neighbors(idx(0)).unwrap();
        let first_pass = neighbors.clone().count();
        let second_pass = neighbors.count();

        assert_eq!(first_pass, 2);
        assert_eq!(second_pass, 2);
        assert!(graph.neighbors(idx(5)).is_err());
    }

    #[test]
    fn test_remove_edge_removes_first_in_traversal_order() {
        let mut graph = NetworkGraph::new(2);
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(10.0, 1.0, 1.0))
            .unwrap();
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(5.0, 1.0, 1.0))
            .unwrap();

        let removed = graph.remove_edge(idx(0), idx(1)).unwrap();
        assert_eq!(removed.map(|attributes| attributes.distance), Some(5.0));
        assert_eq!(
            graph.first_edge(idx(0), idx(1)).unwrap().unwrap().distance,
            10.0
        );

        graph.remove_edge(idx(0), idx(1)).unwrap();
        assert_eq!(graph.remove_edge(idx(0), idx(1)).unwrap(), None);
    }

    #[test]
    fn test_route_cost_uses_first_matching_edge() {
        let mut graph = NetworkGraph::new(3);
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(1.0, 1.0, 7.0))
            .unwrap();
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(1.0, 1.0, 3.0))
            .unwrap();
        graph
            .add_edge(idx(1), idx(2), EdgeAttributes::new(1.0, 1.0, 4.0))
            .unwrap();

        let cost = graph.route_cost(&[idx(0), idx(1), idx(2)]).unwrap();
        assert_eq!(cost, 7.0);
    }

    #[test]
    fn test_validate_route() {
        let mut graph = NetworkGraph::from_nodes(vec![
            NodeBuilder::default().build(),
            NodeBuilder::default().set_time_window(600.0, 720.0).build(),
            NodeBuilder::default().build(),
        ]);
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(10.0, 2.0, 1.0))
            .unwrap();

        let conditions = TravelConditions::default();

        let valid = graph
            .validate_route(&[idx(0), idx(1)], 480.0, &conditions)
            .unwrap();
        assert_eq!(
            valid,
            RouteValidation::Valid {
                arrival_minutes: 600.0
            }
        );

        let closed = graph
            .validate_route(&[idx(0), idx(1)], 0.0, &conditions)
            .unwrap();
        assert!(matches!(closed, RouteValidation::ClosedNode { .. }));

        let missing = graph
            .validate_route(&[idx(0), idx(2)], 0.0, &conditions)
            .unwrap();
        assert_eq!(
            missing,
            RouteValidation::MissingEdge {
                from: idx(0),
                to: idx(2)
            }
        );
    }

    #[test]
    fn test_display_lists_edges() {
        let mut graph = NetworkGraph::new(2);
        graph
            .add_edge(idx(0), idx(1), EdgeAttributes::new(10.5, 1.0, 2.0))
            .unwrap();

        let output = graph.to_string();
        assert!(output.contains("Node 0 (Unnamed, delivery_point):"));
        assert!(output.contains("-> 1 (10.5 km, 1.0 h, 2.0 cost)"));
    }
}
