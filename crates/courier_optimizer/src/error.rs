use courier_graph::{
    error::GraphError,
    node::{NodeIdx, NodeType},
};
use serde::Serialize;
use thiserror::Error;

use crate::problem::{package::PackageIdx, vehicle::VehicleIdx};

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(
        "Vehicle {vehicle} cannot carry {weight:.1} kg / {volume:.2} m3 (capacity {weight_capacity:.1} kg / {volume_capacity:.2} m3)"
    )]
    CapacityExceeded {
        vehicle: VehicleIdx,
        weight: f64,
        volume: f64,
        weight_capacity: f64,
        volume_capacity: f64,
    },

    #[error("No available {node_type} can replace failed node {failed}")]
    NoSubstituteNode {
        failed: NodeIdx,
        node_type: NodeType,
        affected: Vec<PackageIdx>,
    },

    #[error("Invalid vehicle reference {vehicle}, fleet has {vehicle_count} vehicles")]
    InvalidVehicleReference { vehicle: usize, vehicle_count: usize },

    #[error("Invalid package reference {package}, there are {package_count} packages")]
    InvalidPackageReference { package: usize, package_count: usize },

    #[error("Package {package} is already delivered")]
    PackageAlreadyDelivered { package: PackageIdx },

    #[error("Day length must be a positive number of minutes, got {day_length}")]
    InvalidDayLength { day_length: f64 },

    #[error("Planning was cancelled")]
    Cancelled,

    #[error("Failed to build the thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Constraint a route could not honor. Recorded on the route, never fatal.
#[derive(Error, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteViolation {
    #[error("No reachable charging station from node {at}: {required_energy:.2} kWh needed, {battery:.2} kWh left")]
    NoFeasibleStation {
        at: NodeIdx,
        required_energy: f64,
        battery: f64,
    },

    #[error("No reachable rest area from node {at} after {driving_time:.2} h of driving")]
    NoFeasibleRestArea { at: NodeIdx, driving_time: f64 },

    #[error("Driving limit exceeded at node {at} after {driving_time:.2} h on a detour")]
    DrivingLimitExceeded { at: NodeIdx, driving_time: f64 },

    #[error("Package {package} delivered at minute {arrival:.0}, window closed at {window_end:.0}")]
    TimeWindowMissed {
        package: PackageIdx,
        arrival: f64,
        window_end: f64,
    },
}
