use courier_graph::{
    edge::EdgeAttributes,
    network_graph::NetworkGraph,
    node::{NodeBuilder, NodeIdx, NodeType},
};
use rand::RngCore;

use crate::{
    error::PlanningError,
    problem::{
        network_state::NetworkState,
        package::{Package, PackageBuilder},
        vehicle::{Vehicle, VehicleBuilder},
    },
};

pub fn idx(index: usize) -> NodeIdx {
    NodeIdx::new(index)
}

/// Two-way road, `distance` km driven in `distance / 50` hours.
pub fn add_road(graph: &mut NetworkGraph, src: usize, dest: usize, distance: f64) {
    for (from, to) in [(src, dest), (dest, src)] {
        graph
            .add_edge(
                idx(from),
                idx(to),
                EdgeAttributes::new(distance, distance / 50.0, distance),
            )
            .unwrap();
    }
}

fn create_nodes(node_types: &[NodeType]) -> NetworkGraph {
    NetworkGraph::from_nodes(
        node_types
            .iter()
            .enumerate()
            .map(|(index, &node_type)| {
                NodeBuilder::default()
                    .set_name(format!("node-{index}"))
                    .set_node_type(node_type)
                    .build()
            })
            .collect(),
    )
}

/// `node_count` nodes, node 0 is a depot, two-way 10 km roads between consecutive nodes.
fn create_line_graph(node_count: usize) -> NetworkGraph {
    let mut node_types = vec![NodeType::DeliveryPoint; node_count];
    if let Some(depot) = node_types.first_mut() {
        *depot = NodeType::Depot;
    }

    let mut graph = create_nodes(&node_types);
    for node in 1..node_count {
        add_road(&mut graph, node - 1, node, 10.0);
    }
    graph
}

fn create_vehicles(capacities: &[f64]) -> Vec<Vehicle> {
    capacities
        .iter()
        .enumerate()
        .map(|(index, &capacity)| {
            VehicleBuilder::default()
                .set_external_id(index.to_string())
                .set_capacity(capacity, 1000.0)
                .set_current_location(idx(0))
                .build()
        })
        .collect()
}

/// State over `graph` with the depot on node 0.
pub fn create_network_state(
    graph: NetworkGraph,
    vehicles: Vec<Vehicle>,
    packages: Vec<Package>,
) -> NetworkState {
    NetworkState::new(graph, vehicles, packages, idx(0)).unwrap()
}

/// Line network of `node_count` nodes, one vehicle per capacity and one package per
/// `(source, destination, weight)`.
pub fn create_line_state(
    node_count: usize,
    capacities: &[f64],
    packages: &[(usize, usize, f64)],
) -> Result<NetworkState, PlanningError> {
    let packages = packages
        .iter()
        .enumerate()
        .map(|(index, &(source, destination, weight))| {
            PackageBuilder::default()
                .set_external_id(index.to_string())
                .set_source(idx(source))
                .set_destination(idx(destination))
                .set_weight(weight)
                .build()
        })
        .collect();

    NetworkState::new(
        create_line_graph(node_count),
        create_vehicles(capacities),
        packages,
        idx(0),
    )
}

/// Three node line network with packages given as `(weight, priority, window_start)`, all
/// leaving the depot.
pub fn create_state_with_packages(
    capacities: &[f64],
    packages: &[(f64, f64, f64)],
) -> NetworkState {
    let packages = packages
        .iter()
        .enumerate()
        .map(|(index, &(weight, priority, window_start))| {
            PackageBuilder::default()
                .set_external_id(index.to_string())
                .set_source(idx(0))
                .set_destination(idx(1 + index % 2))
                .set_weight(weight)
                .set_priority(priority)
                .set_window(window_start, f64::INFINITY)
                .build()
        })
        .collect();

    create_network_state(create_line_graph(3), create_vehicles(capacities), packages)
}

/// Depot 0, hubs 1 and 2, delivery point 3 with two-way roads 0-1 (10 km), 0-2 (15 km),
/// 0-3 (10 km), 1-3 (5 km) and 2-3 (20 km). One 500 kg vehicle, package 0 goes to hub 1 and
/// package 1 to the delivery point.
pub fn create_hub_state() -> NetworkState {
    let mut graph = create_nodes(&[
        NodeType::Depot,
        NodeType::Hub,
        NodeType::Hub,
        NodeType::DeliveryPoint,
    ]);
    add_road(&mut graph, 0, 1, 10.0);
    add_road(&mut graph, 0, 2, 15.0);
    add_road(&mut graph, 0, 3, 10.0);
    add_road(&mut graph, 1, 3, 5.0);
    add_road(&mut graph, 2, 3, 20.0);

    let packages = [1, 3]
        .into_iter()
        .map(|destination| {
            PackageBuilder::default()
                .set_source(idx(0))
                .set_destination(idx(destination))
                .set_weight(50.0)
                .build()
        })
        .collect();

    create_network_state(graph, create_vehicles(&[500.0]), packages)
}

/// Line network with two 500 kg vehicles, package `i` goes from the depot to node `i + 1`
/// within the given window.
pub fn create_windowed_state(windows: &[(f64, f64)]) -> NetworkState {
    let packages = windows
        .iter()
        .enumerate()
        .map(|(index, &(start, end))| {
            PackageBuilder::default()
                .set_external_id(index.to_string())
                .set_source(idx(0))
                .set_destination(idx(index + 1))
                .set_weight(10.0)
                .set_window(start, end)
                .build()
        })
        .collect();

    create_network_state(
        create_line_graph(windows.len() + 1),
        create_vehicles(&[500.0, 500.0]),
        packages,
    )
}

pub struct MockRng {
    data: Vec<u64>,
    index: usize,
}

impl MockRng {
    pub fn new(data: Vec<u64>) -> Self {
        MockRng { data, index: 0 }
    }
}

impl RngCore for MockRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        let value = self.data[self.index % self.data.len()];
        self.index = (self.index + 1) % self.data.len();
        value
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_mock_rng_cycles() {
        let data = vec![3, 1, 4];
        let mut rng = MockRng::new(data.clone());

        for &expected in data.iter().cycle().take(7) {
            assert_eq!(rng.next_u64(), expected);
        }
    }

    #[test]
    fn test_mock_rng_random_bool() {
        let mut rng = MockRng::new(vec![u64::MAX / 2]);

        assert!(!rng.random_bool(0.4));
        assert!(rng.random_bool(0.6));
    }

    #[test]
    fn test_line_state_shape() {
        let state = create_line_state(3, &[100.0], &[(0, 2, 5.0)]).unwrap();

        assert_eq!(state.graph().edge_count(), 4);
        assert_eq!(
            state.graph().node(idx(0)).unwrap().node_type(),
            NodeType::Depot
        );
        assert_eq!(state.depot(), idx(0));
    }
}
