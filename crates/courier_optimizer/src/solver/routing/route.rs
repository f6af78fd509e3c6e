use courier_graph::node::NodeIdx;
use serde::Serialize;

use crate::{
    error::RouteViolation,
    problem::{package::PackageIdx, vehicle::VehicleIdx},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "package", rename_all = "snake_case")]
pub enum StopKind {
    Start,
    Pickup(PackageIdx),
    Delivery(PackageIdx),
    Charging,
    Rest,
    Return,
}

impl StopKind {
    pub fn package(&self) -> Option<PackageIdx> {
        match self {
            StopKind::Pickup(package) | StopKind::Delivery(package) => Some(*package),
            _ => None,
        }
    }
}

/// Stop of a visiting sequence before simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedStop {
    pub node: NodeIdx,
    pub kind: StopKind,
}

impl PlannedStop {
    pub fn new(node: NodeIdx, kind: StopKind) -> Self {
        PlannedStop { node, kind }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStop {
    pub node: NodeIdx,
    pub kind: StopKind,
    /// Arrival in minutes since the start of the horizon, after any waiting
    pub arrival: f64,
    /// Battery level on arrival
    pub battery: f64,
}

/// Simulated route of one vehicle. Replaced as a whole when re-planned.
#[derive(Debug, Clone, Serialize)]
pub struct Route {
    pub(crate) vehicle: VehicleIdx,
    pub(crate) start_minute: f64,
    pub(crate) stops: Vec<RouteStop>,
    /// Every node traversed, including intermediate ones
    pub(crate) nodes: Vec<NodeIdx>,
    /// Hours from departure to the end of the last stop
    pub(crate) total_time: f64,
    pub(crate) total_cost: f64,
    pub(crate) total_distance: f64,
    pub(crate) violations: Vec<RouteViolation>,
    pub(crate) final_battery: f64,
    pub(crate) final_driving_time: f64,
}

impl Route {
    pub fn vehicle(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn start_minute(&self) -> f64 {
        self.start_minute
    }

    pub fn stops(&self) -> &[RouteStop] {
        &self.stops
    }

    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    pub fn end_node(&self) -> Option<NodeIdx> {
        self.nodes.last().copied()
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    pub fn violations(&self) -> &[RouteViolation] {
        &self.violations
    }

    pub fn is_feasible(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn final_battery(&self) -> f64 {
        self.final_battery
    }

    pub fn final_driving_time(&self) -> f64 {
        self.final_driving_time
    }

    pub fn charging_stops(&self) -> usize {
        self.count_stops(StopKind::Charging)
    }

    pub fn rest_stops(&self) -> usize {
        self.count_stops(StopKind::Rest)
    }

    fn count_stops(&self, kind: StopKind) -> usize {
        self.stops.iter().filter(|stop| stop.kind == kind).count()
    }

    /// Whether the route drives directly from `src` to `dest` at some point.
    pub fn traverses(&self, src: NodeIdx, dest: NodeIdx) -> bool {
        self.nodes
            .windows(2)
            .any(|pair| pair[0] == src && pair[1] == dest)
    }

    /// Packages dropped within their window, with the drop minute.
    pub fn on_time_deliveries(&self) -> impl Iterator<Item = (PackageIdx, f64)> + '_ {
        self.stops.iter().filter_map(|stop| match stop.kind {
            StopKind::Delivery(package) if !self.missed_window(package) => {
                Some((package, stop.arrival))
            }
            _ => None,
        })
    }

    fn missed_window(&self, package: PackageIdx) -> bool {
        self.violations.iter().any(|violation| {
            matches!(violation, RouteViolation::TimeWindowMissed { package: missed, .. } if *missed == package)
        })
    }
}
