use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::define_index_newtype;

define_index_newtype!(NodeIdx, Node);

/// Minutes in a day, the default closing time of a node.
pub const MINUTES_PER_DAY: f64 = 1440.0;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[serde(alias = "warehouse", alias = "distribution_center")]
    Depot,
    #[serde(alias = "relay_point")]
    Hub,
    RestArea,
    ChargingStation,
    #[default]
    #[serde(alias = "delivery")]
    DeliveryPoint,
}

impl NodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Depot => "depot",
            NodeType::Hub => "hub",
            NodeType::RestArea => "rest_area",
            NodeType::ChargingStation => "charging_station",
            NodeType::DeliveryPoint => "delivery_point",
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    node_type: NodeType,
    capacity: f64,
    /// Service time in minutes
    service_time: f64,
    /// Opening time in minutes since midnight
    opening_time: f64,
    /// Closing time in minutes since midnight
    closing_time: f64,
    has_charging_station: bool,
    available: bool,
}

impl Default for Node {
    fn default() -> Self {
        Node {
            name: String::from("Unnamed"),
            node_type: NodeType::default(),
            capacity: 0.0,
            service_time: 0.0,
            opening_time: 0.0,
            closing_time: MINUTES_PER_DAY,
            has_charging_station: false,
            available: true,
        }
    }
}

impl Node {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn service_time(&self) -> f64 {
        self.service_time
    }

    pub fn opening_time(&self) -> f64 {
        self.opening_time
    }

    pub fn closing_time(&self) -> f64 {
        self.closing_time
    }

    /// A node can recharge a vehicle if it is a charging station or declares a charger.
    pub fn can_charge(&self) -> bool {
        self.has_charging_station || self.node_type == NodeType::ChargingStation
    }

    pub fn has_charging_station(&self) -> bool {
        self.has_charging_station
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_open_at(&self, minute_of_day: f64) -> bool {
        minute_of_day >= self.opening_time && minute_of_day <= self.closing_time
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn set_node_type(&mut self, node_type: NodeType) {
        self.node_type = node_type;
    }
}

#[derive(Default)]
pub struct NodeBuilder {
    name: Option<String>,
    node_type: Option<NodeType>,
    capacity: Option<f64>,
    service_time: Option<f64>,
    opening_time: Option<f64>,
    closing_time: Option<f64>,
    has_charging_station: Option<bool>,
}

impl NodeBuilder {
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut NodeBuilder {
        self.name = Some(name.into());
        self
    }

    pub fn set_node_type(&mut self, node_type: NodeType) -> &mut NodeBuilder {
        self.node_type = Some(node_type);
        self
    }

    pub fn set_capacity(&mut self, capacity: f64) -> &mut NodeBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_service_time(&mut self, service_time: f64) -> &mut NodeBuilder {
        self.service_time = Some(service_time);
        self
    }

    pub fn set_time_window(&mut self, opening_time: f64, closing_time: f64) -> &mut NodeBuilder {
        self.opening_time = Some(opening_time);
        self.closing_time = Some(closing_time);
        self
    }

    pub fn set_has_charging_station(&mut self, has_charging_station: bool) -> &mut NodeBuilder {
        self.has_charging_station = Some(has_charging_station);
        self
    }

    pub fn build(&self) -> Node {
        let default = Node::default();
        Node {
            name: self.name.clone().unwrap_or(default.name),
            node_type: self.node_type.unwrap_or(default.node_type),
            capacity: self.capacity.unwrap_or(default.capacity),
            service_time: self.service_time.unwrap_or(default.service_time),
            opening_time: self.opening_time.unwrap_or(default.opening_time),
            closing_time: self.closing_time.unwrap_or(default.closing_time),
            has_charging_station: self.has_charging_station.unwrap_or(false),
            available: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_node_is_open_all_day() {
        let node = Node::default();

        assert_eq!(node.name(), "Unnamed");
        assert!(node.is_open_at(0.0));
        assert!(node.is_open_at(MINUTES_PER_DAY));
        assert!(!node.is_open_at(MINUTES_PER_DAY + 1.0));
    }

    #[test]
    fn test_charging_capability() {
        let station = NodeBuilder::default()
            .set_node_type(NodeType::ChargingStation)
            .build();
        let hub = NodeBuilder::default()
            .set_node_type(NodeType::Hub)
            .set_has_charging_station(true)
            .build();
        let delivery = NodeBuilder::default().build();

        assert!(station.can_charge());
        assert!(hub.can_charge());
        assert!(!delivery.can_charge());
    }

    #[test]
    fn test_node_type_aliases() {
        let node_type: NodeType = serde_json::from_str("\"warehouse\"").unwrap();
        assert_eq!(node_type, NodeType::Depot);

        let node_type: NodeType = serde_json::from_str("\"rest_area\"").unwrap();
        assert_eq!(node_type, NodeType::RestArea);
    }
}
