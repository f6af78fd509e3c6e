use courier_graph::{
    edge::EdgeAttributes,
    error::GraphError,
    network_graph::NetworkGraph,
    node::{NodeBuilder, NodeIdx, NodeType},
};
use fxhash::FxHashMap;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::{
    error::PlanningError,
    problem::{
        network_state::NetworkState,
        package::{PackageBuilder, PackageIdx, PackageStatus},
        vehicle::{VehicleBuilder, VehicleIdx},
    },
};

use super::types::{JsonEdge, JsonNetworkState, JsonNode, JsonPackage, JsonVehicle, JsonVehicleStatus};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node id {0} is used more than once")]
    DuplicateNodeId(usize),

    #[error("Unknown node id {0}")]
    UnknownNode(usize),

    #[error("Unknown vehicle id {0}")]
    UnknownVehicle(i64),

    #[error("Unknown package id {0}")]
    UnknownPackage(i64),

    #[error("The network has no depot node")]
    MissingDepot,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Planning(#[from] PlanningError),
}

/// Maps the ids used in the document to indices.
#[derive(Default)]
struct IdMap {
    nodes: FxHashMap<usize, NodeIdx>,
    vehicles: FxHashMap<i64, VehicleIdx>,
    packages: FxHashMap<i64, PackageIdx>,
}

impl IdMap {
    fn node(&self, id: usize) -> Result<NodeIdx, ImportError> {
        self.nodes
            .get(&id)
            .copied()
            .ok_or(ImportError::UnknownNode(id))
    }

    fn vehicle(&self, id: i64) -> Result<VehicleIdx, ImportError> {
        self.vehicles
            .get(&id)
            .copied()
            .ok_or(ImportError::UnknownVehicle(id))
    }

    fn package(&self, id: i64) -> Result<PackageIdx, ImportError> {
        self.packages
            .get(&id)
            .copied()
            .ok_or(ImportError::UnknownPackage(id))
    }
}

fn build_graph(
    nodes: &[JsonNode],
    edges: &[JsonEdge],
    ids: &mut IdMap,
) -> Result<NetworkGraph, ImportError> {
    let mut graph_nodes = Vec::with_capacity(nodes.len());
    for (index, json) in nodes.iter().enumerate() {
        if ids.nodes.insert(json.id, NodeIdx::new(index)).is_some() {
            return Err(ImportError::DuplicateNodeId(json.id));
        }

        let mut builder = NodeBuilder::default();
        builder.set_name(json.name.clone()).set_node_type(json.node_type);
        if let Some(capacity) = json.capacity {
            builder.set_capacity(capacity);
        }
        if let Some(service_time) = json.service_time {
            builder.set_service_time(service_time);
        }
        if let (Some(opening), Some(closing)) = (json.opening_time, json.closing_time) {
            builder.set_time_window(opening, closing);
        }
        if let Some(has_charging_station) = json.has_charging_station {
            builder.set_has_charging_station(has_charging_station);
        }

        let mut node = builder.build();
        node.set_available(json.available.unwrap_or(true));
        graph_nodes.push(node);
    }

    let mut graph = NetworkGraph::from_nodes(graph_nodes);
    for edge in edges {
        let mut attributes = EdgeAttributes::new(edge.distance, edge.time, edge.cost);
        if let Some(condition) = edge.condition {
            attributes = attributes.with_condition(condition);
        }
        if let Some(traffic) = edge.traffic {
            attributes = attributes.with_traffic(traffic);
        }
        if let Some(reliability) = edge.reliability {
            attributes = attributes.with_reliability(reliability);
        }
        if let Some(time_factors) = edge.time_factors {
            attributes = attributes.with_time_factors(time_factors);
        }

        graph.add_edge(ids.node(edge.source)?, ids.node(edge.target)?, attributes)?;
    }

    Ok(graph)
}

fn build_vehicle(
    json: &JsonVehicle,
    ids: &IdMap,
) -> Result<crate::problem::vehicle::Vehicle, ImportError> {
    let mut builder = VehicleBuilder::default();
    builder
        .set_external_id(json.id.to_string())
        .set_class(json.vehicle_type)
        .set_current_location(ids.node(json.current_node)?)
        .set_available(json.status != JsonVehicleStatus::Unavailable);

    let overrides: [(Option<f64>, fn(&mut VehicleBuilder, f64) -> &mut VehicleBuilder); 8] = [
        (json.weight_capacity, VehicleBuilder::set_weight_capacity),
        (json.volume_capacity, VehicleBuilder::set_volume_capacity),
        (json.speed, VehicleBuilder::set_speed),
        (json.cost_per_km, VehicleBuilder::set_cost_per_km),
        (json.battery_capacity, VehicleBuilder::set_battery_capacity),
        (json.consumption_rate, VehicleBuilder::set_consumption_rate),
        (json.charging_rate, VehicleBuilder::set_charging_rate),
        (json.max_driving_time, VehicleBuilder::set_max_driving_time),
    ];
    for (value, setter) in overrides {
        if let Some(value) = value {
            setter(&mut builder, value);
        }
    }
    if let Some(battery) = json.current_battery {
        builder.set_current_battery(battery);
    }

    let mut vehicle = builder.build();
    if let Some(driving_time) = json.driving_time {
        vehicle.set_driving_time(driving_time);
    }
    Ok(vehicle)
}

fn build_package(
    json: &JsonPackage,
    ids: &IdMap,
) -> Result<crate::problem::package::Package, ImportError> {
    let mut builder = PackageBuilder::default();
    builder
        .set_external_id(json.id.to_string())
        .set_source(ids.node(json.source_node)?)
        .set_destination(ids.node(json.destination_node)?)
        .set_weight(json.weight)
        .set_volume(json.volume)
        .set_priority(json.priority)
        .set_window(
            json.window_start.unwrap_or(0.0),
            json.window_end.unwrap_or(f64::INFINITY),
        );

    if json.status == PackageStatus::Delivered {
        builder.set_delivered_at(
            json.delivered_at
                .or(json.window_start)
                .unwrap_or(0.0),
        );
    }

    Ok(builder.build())
}

/// Builds a state from a document. Node, vehicle and package ids may be arbitrary, they are
/// mapped to indices in document order. The depot is the first depot node. Routes and
/// statistics are not read, they are derived from the planning.
#[instrument(skip_all, level = "debug")]
pub fn import_network_state(json: &JsonNetworkState) -> Result<NetworkState, ImportError> {
    let mut ids = IdMap::default();
    let graph = build_graph(&json.network.nodes, &json.network.edges, &mut ids)?;

    let depot = graph
        .nodes_of_type(NodeType::Depot)
        .next()
        .ok_or(ImportError::MissingDepot)?;

    let mut vehicles = Vec::with_capacity(json.vehicles.len());
    for (index, vehicle) in json.vehicles.iter().enumerate() {
        ids.vehicles.insert(vehicle.id, VehicleIdx::new(index));
        vehicles.push(build_vehicle(vehicle, &ids)?);
    }

    let mut packages = Vec::with_capacity(json.packages.len());
    for (index, package) in json.packages.iter().enumerate() {
        ids.packages.insert(package.id, PackageIdx::new(index));
        packages.push(build_package(package, &ids)?);
    }

    let mut state = NetworkState::new(graph, vehicles, packages, depot)?;

    for (index, package) in json.packages.iter().enumerate() {
        if let Some(vehicle) = package.assigned_vehicle {
            state.restore_assignment(PackageIdx::new(index), ids.vehicle(vehicle)?)?;
        }
    }
    for (index, vehicle) in json.vehicles.iter().enumerate() {
        for &package in &vehicle.packages {
            let package = ids.package(package)?;
            if state.package(package)?.assigned_vehicle().is_none() {
                state.restore_assignment(package, VehicleIdx::new(index))?;
            }
        }
    }

    debug!(
        nodes = state.graph().node_count(),
        edges = state.graph().edge_count(),
        vehicles = state.vehicles().len(),
        packages = state.packages().len(),
        "Imported network state"
    );
    Ok(state)
}

pub fn import_from_str(text: &str) -> Result<NetworkState, ImportError> {
    let json: JsonNetworkState = serde_json::from_str(text)?;
    import_network_state(&json)
}
