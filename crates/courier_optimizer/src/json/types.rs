use courier_graph::{
    edge::{Edge, RoadCondition, TrafficLevel},
    node::{NodeIdx, NodeType},
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    problem::{
        network_state::NetworkState,
        package::{Package, PackageIdx, PackageStatus},
        vehicle::{Vehicle, VehicleClass, VehicleIdx},
    },
    solver::statistics::NetworkStatistics,
};

pub trait FromNetworkState<T> {
    fn from_network_state(value: T, state: &NetworkState) -> Self;
}

/// Numeric identifier of an entity, its external id when numeric and its index otherwise.
pub(crate) fn external_number(external_id: &str, index: usize) -> i64 {
    external_id.parse().unwrap_or(index as i64)
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename = "NetworkState")]
pub struct JsonNetworkState {
    pub vehicles: Vec<JsonVehicle>,
    pub packages: Vec<JsonPackage>,
    pub network: JsonNetwork,
    #[serde(default)]
    pub statistics: NetworkStatistics,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JsonVehicleStatus {
    Idle,
    Active,
    #[serde(alias = "maintenance", alias = "inactive")]
    Unavailable,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename = "Vehicle")]
pub struct JsonVehicle {
    pub id: i64,
    #[serde(rename = "type")]
    pub vehicle_type: VehicleClass,
    pub status: JsonVehicleStatus,
    /// Name of the current node
    #[serde(default)]
    pub current_location: String,
    pub current_battery: Option<f64>,
    pub current_node: usize,
    #[serde(default)]
    pub route: Vec<usize>,
    #[serde(default)]
    pub packages: Vec<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_per_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charging_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driving_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_driving_time: Option<f64>,
}

impl FromNetworkState<(VehicleIdx, &Vehicle)> for JsonVehicle {
    fn from_network_state((index, vehicle): (VehicleIdx, &Vehicle), state: &NetworkState) -> Self {
        let assigned = state.assigned_packages(index).unwrap_or_default();
        let route = state.route(index).ok().flatten();

        let status = if !vehicle.is_available() {
            JsonVehicleStatus::Unavailable
        } else if !assigned.is_empty() || route.is_some() {
            JsonVehicleStatus::Active
        } else {
            JsonVehicleStatus::Idle
        };

        JsonVehicle {
            id: external_number(vehicle.external_id(), index.get()),
            vehicle_type: vehicle.class(),
            status,
            current_location: state
                .graph()
                .node(vehicle.current_location())
                .map(|node| node.name().to_owned())
                .unwrap_or_default(),
            current_battery: Some(vehicle.current_battery()),
            current_node: vehicle.current_location().get(),
            route: route
                .map(|route| route.nodes().iter().map(|node| node.get()).collect())
                .unwrap_or_default(),
            packages: assigned
                .iter()
                .map(|&package| {
                    external_number(state.packages()[package].external_id(), package.get())
                })
                .collect(),
            weight_capacity: Some(vehicle.weight_capacity()),
            volume_capacity: Some(vehicle.volume_capacity()),
            speed: Some(vehicle.speed()),
            cost_per_km: Some(vehicle.cost_per_km()),
            battery_capacity: Some(vehicle.battery_capacity()),
            consumption_rate: Some(vehicle.consumption_rate()),
            charging_rate: Some(vehicle.charging_rate()),
            driving_time: Some(vehicle.driving_time()),
            max_driving_time: Some(vehicle.max_driving_time()),
        }
    }
}

/// Vehicle reference written as `-1` when missing, read from `-1`, any negative value or null.
mod assigned_vehicle {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<i64>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.unwrap_or(-1))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let value = Option::<i64>::deserialize(deserializer)?;
        Ok(value.filter(|&vehicle| vehicle >= 0))
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename = "Package")]
pub struct JsonPackage {
    pub id: i64,
    #[serde(default)]
    pub status: PackageStatus,
    #[serde(default = "default_priority")]
    pub priority: f64,
    /// Name of the source node
    #[serde(default)]
    pub source: String,
    /// Name of the destination node
    #[serde(default)]
    pub destination: String,
    pub weight: f64,
    pub source_node: usize,
    pub destination_node: usize,
    #[serde(default, with = "assigned_vehicle")]
    #[schemars(with = "i64")]
    pub assigned_vehicle: Option<i64>,

    #[serde(default)]
    pub volume: f64,
    /// Minutes since the start of the horizon
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_start: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_end: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<f64>,
}

fn default_priority() -> f64 {
    1.0
}

impl FromNetworkState<(PackageIdx, &Package)> for JsonPackage {
    fn from_network_state((index, package): (PackageIdx, &Package), state: &NetworkState) -> Self {
        let node_name = |node: NodeIdx| {
            state
                .graph()
                .node(node)
                .map(|node| node.name().to_owned())
                .unwrap_or_default()
        };
        let window = package.window();

        JsonPackage {
            id: external_number(package.external_id(), index.get()),
            status: package.status(),
            priority: package.priority(),
            source: node_name(package.source()),
            destination: node_name(package.destination()),
            weight: package.weight(),
            source_node: package.source().get(),
            destination_node: package.destination().get(),
            assigned_vehicle: package.assigned_vehicle().map(|vehicle| {
                external_number(state.vehicles()[vehicle].external_id(), vehicle.get())
            }),
            volume: package.volume(),
            window_start: Some(window.start),
            window_end: window.end.is_finite().then_some(window.end),
            delivered_at: package.delivered_at(),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq, Default)]
#[serde(rename = "Network")]
pub struct JsonNetwork {
    pub nodes: Vec<JsonNode>,
    #[serde(default)]
    pub edges: Vec<JsonEdge>,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename = "Node")]
pub struct JsonNode {
    pub id: usize,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,

    /// Storage capacity of depots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    /// Weight of the undelivered packages waiting at a depot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_load: Option<f64>,
    /// Weight of all packages destined to the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand: Option<f64>,
    /// Weight of the undelivered packages destined to the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_demand: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_charging_station: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
}

impl FromNetworkState<NodeIdx> for JsonNode {
    fn from_network_state(index: NodeIdx, state: &NetworkState) -> Self {
        let sum_weights = |filter: &dyn Fn(&Package) -> bool| -> f64 {
            state
                .packages()
                .iter()
                .filter(|package| filter(package))
                .map(|package| package.weight())
                .sum()
        };

        let Ok(node) = state.graph().node(index) else {
            return JsonNode::unnamed(index.get());
        };

        let is_depot = node.node_type() == NodeType::Depot;
        let (capacity, current_load, demand, current_demand) = if is_depot {
            (
                Some(node.capacity()),
                Some(sum_weights(&|package| {
                    package.source() == index && !package.is_delivered() && !package.is_assigned()
                })),
                None,
                None,
            )
        } else {
            (
                None,
                None,
                Some(sum_weights(&|package| package.destination() == index)),
                Some(sum_weights(&|package| {
                    package.destination() == index && !package.is_delivered()
                })),
            )
        };

        JsonNode {
            id: index.get(),
            name: node.name().to_owned(),
            node_type: node.node_type(),
            capacity,
            current_load,
            demand,
            current_demand,
            service_time: Some(node.service_time()),
            opening_time: Some(node.opening_time()),
            closing_time: Some(node.closing_time()),
            has_charging_station: Some(node.has_charging_station()),
            available: Some(node.is_available()),
        }
    }
}

impl JsonNode {
    fn unnamed(id: usize) -> Self {
        JsonNode {
            id,
            name: String::new(),
            node_type: NodeType::default(),
            capacity: None,
            current_load: None,
            demand: None,
            current_demand: None,
            service_time: None,
            opening_time: None,
            closing_time: None,
            has_charging_station: None,
            available: None,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(rename = "Edge")]
pub struct JsonEdge {
    pub source: usize,
    pub target: usize,
    pub distance: f64,
    /// Hours under nominal conditions
    pub time: f64,
    pub cost: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<RoadCondition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic: Option<TrafficLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_factors: Option<[f64; 3]>,
}

impl FromNetworkState<(NodeIdx, &Edge)> for JsonEdge {
    fn from_network_state((source, edge): (NodeIdx, &Edge), _state: &NetworkState) -> Self {
        let attributes = edge.attributes();
        JsonEdge {
            source: source.get(),
            target: edge.dest().get(),
            distance: attributes.distance,
            time: attributes.base_time,
            cost: attributes.cost,
            condition: Some(attributes.condition),
            traffic: Some(attributes.traffic),
            reliability: Some(attributes.reliability),
            time_factors: Some(attributes.time_factors),
        }
    }
}
