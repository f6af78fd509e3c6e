use std::sync::Arc;

use courier_graph::{network_graph::NetworkGraph, node::NodeIdx};
use parking_lot::RwLock;

use crate::{
    error::PlanningError,
    json::{export::export_network_state, types::JsonNetworkState},
    solver::routing::route::Route,
};

use super::{
    package::{Package, PackageIdx},
    vehicle::{Vehicle, VehicleIdx},
};

/// Network, fleet and packages planned together.
///
/// Every node reference held by vehicles and packages is validated on construction and kept
/// valid by every mutation.
#[derive(Debug, Clone)]
pub struct NetworkState {
    graph: NetworkGraph,
    vehicles: Vec<Vehicle>,
    packages: Vec<Package>,
    depot: NodeIdx,
    /// Packages per vehicle, in assignment order
    assignments: Vec<Vec<PackageIdx>>,
    routes: Vec<Option<Route>>,
}

/// Live state shared with readers. Readers only ever get [`snapshot`] exports.
pub type SharedNetworkState = Arc<RwLock<NetworkState>>;

pub fn snapshot(state: &SharedNetworkState) -> JsonNetworkState {
    export_network_state(&state.read())
}

impl NetworkState {
    pub fn new(
        graph: NetworkGraph,
        vehicles: Vec<Vehicle>,
        packages: Vec<Package>,
        depot: NodeIdx,
    ) -> Result<Self, PlanningError> {
        graph.check_node(depot)?;
        for vehicle in &vehicles {
            graph.check_node(vehicle.current_location())?;
        }
        for package in &packages {
            graph.check_node(package.source())?;
            graph.check_node(package.destination())?;
        }

        let vehicle_count = vehicles.len();
        let mut state = NetworkState {
            graph,
            vehicles,
            packages,
            depot,
            assignments: vec![vec![]; vehicle_count],
            routes: vec![None; vehicle_count],
        };

        // Delivered packages built with an assignment keep it, others start unassigned
        for package in state.packages.iter_mut() {
            if !package.is_delivered() {
                package.set_assigned_vehicle(None);
            }
        }

        Ok(state)
    }

    pub fn into_shared(self) -> SharedNetworkState {
        Arc::new(RwLock::new(self))
    }

    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut NetworkGraph {
        &mut self.graph
    }

    pub fn depot(&self) -> NodeIdx {
        self.depot
    }

    pub fn set_depot(&mut self, depot: NodeIdx) -> Result<(), PlanningError> {
        self.depot = self.graph.check_node(depot)?;
        Ok(())
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle_indices(&self) -> impl Iterator<Item = VehicleIdx> + use<> {
        (0..self.vehicles.len()).map(VehicleIdx::new)
    }

    pub fn check_vehicle(&self, vehicle: VehicleIdx) -> Result<VehicleIdx, PlanningError> {
        if vehicle.get() < self.vehicles.len() {
            Ok(vehicle)
        } else {
            Err(PlanningError::InvalidVehicleReference {
                vehicle: vehicle.get(),
                vehicle_count: self.vehicles.len(),
            })
        }
    }

    pub fn vehicle(&self, vehicle: VehicleIdx) -> Result<&Vehicle, PlanningError> {
        self.check_vehicle(vehicle)?;
        Ok(&self.vehicles[vehicle])
    }

    pub fn vehicle_mut(&mut self, vehicle: VehicleIdx) -> Result<&mut Vehicle, PlanningError> {
        self.check_vehicle(vehicle)?;
        Ok(&mut self.vehicles[vehicle])
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package_indices(&self) -> impl Iterator<Item = PackageIdx> + use<> {
        (0..self.packages.len()).map(PackageIdx::new)
    }

    pub fn check_package(&self, package: PackageIdx) -> Result<PackageIdx, PlanningError> {
        if package.get() < self.packages.len() {
            Ok(package)
        } else {
            Err(PlanningError::InvalidPackageReference {
                package: package.get(),
                package_count: self.packages.len(),
            })
        }
    }

    pub fn package(&self, package: PackageIdx) -> Result<&Package, PlanningError> {
        self.check_package(package)?;
        Ok(&self.packages[package])
    }

    /// Packages assigned to `vehicle` for the current planning cycle, in assignment order.
    pub fn assigned_packages(&self, vehicle: VehicleIdx) -> Result<&[PackageIdx], PlanningError> {
        self.check_vehicle(vehicle)?;
        Ok(&self.assignments[vehicle.get()])
    }

    pub fn route(&self, vehicle: VehicleIdx) -> Result<Option<&Route>, PlanningError> {
        self.check_vehicle(vehicle)?;
        Ok(self.routes[vehicle.get()].as_ref())
    }

    pub fn routes(&self) -> impl Iterator<Item = (VehicleIdx, &Route)> {
        self.routes
            .iter()
            .enumerate()
            .filter_map(|(index, route)| route.as_ref().map(|route| (VehicleIdx::new(index), route)))
    }

    pub fn set_route(&mut self, vehicle: VehicleIdx, route: Option<Route>) -> Result<(), PlanningError> {
        self.check_vehicle(vehicle)?;
        self.routes[vehicle.get()] = route;
        Ok(())
    }

    /// Assigns `package` to `vehicle`, moving it away from its previous vehicle if any.
    ///
    /// Fails without mutation if the package is delivered or the vehicle cannot carry it.
    pub fn assign_package(
        &mut self,
        package: PackageIdx,
        vehicle: VehicleIdx,
    ) -> Result<(), PlanningError> {
        self.check_package(package)?;
        self.check_vehicle(vehicle)?;

        if self.packages[package].is_delivered() {
            return Err(PlanningError::PackageAlreadyDelivered { package });
        }
        if self.packages[package].assigned_vehicle() == Some(vehicle) {
            return Ok(());
        }

        let load = self.packages[package].load();
        let target = &self.vehicles[vehicle];
        if !target.can_carry(load) {
            let total = target.load() + load;
            return Err(PlanningError::CapacityExceeded {
                vehicle,
                weight: total.weight,
                volume: total.volume,
                weight_capacity: target.weight_capacity(),
                volume_capacity: target.volume_capacity(),
            });
        }

        self.unassign_package(package)?;
        self.vehicles[vehicle].add_load(load);
        self.assignments[vehicle.get()].push(package);
        self.packages[package].set_assigned_vehicle(Some(vehicle));
        Ok(())
    }

    /// Returns the vehicle the package was assigned to.
    pub fn unassign_package(&mut self, package: PackageIdx) -> Result<Option<VehicleIdx>, PlanningError> {
        self.check_package(package)?;

        let previous = self.packages[package].assigned_vehicle();
        if let Some(vehicle) = previous {
            let load = self.packages[package].load();
            self.vehicles[vehicle].remove_load(load);
            self.assignments[vehicle.get()].retain(|&assigned| assigned != package);
            self.packages[package].set_assigned_vehicle(None);
        }

        Ok(previous)
    }

    pub fn mark_delivered(&mut self, package: PackageIdx, minute: f64) -> Result<(), PlanningError> {
        self.check_package(package)?;
        self.packages[package].mark_delivered(minute);
        Ok(())
    }

    pub fn redirect_package(
        &mut self,
        package: PackageIdx,
        failed: NodeIdx,
        substitute: NodeIdx,
    ) -> Result<(), PlanningError> {
        self.check_package(package)?;
        self.graph.check_node(substitute)?;
        self.packages[package].redirect(failed, substitute);
        Ok(())
    }

    /// Starts a new planning cycle: every vehicle is back at the depot with a full battery and
    /// an empty load, routes are dropped and undelivered packages are unassigned.
    pub fn reset_for_new_cycle(&mut self) {
        let depot = self.depot;
        for vehicle in self.vehicles.iter_mut() {
            vehicle.reset_position(depot);
            vehicle.clear_load();
        }
        for assignments in self.assignments.iter_mut() {
            assignments.clear();
        }
        for route in self.routes.iter_mut() {
            *route = None;
        }
        for package in self.packages.iter_mut().filter(|package| !package.is_delivered()) {
            package.set_assigned_vehicle(None);
        }
    }

    /// Packages neither delivered nor assigned.
    pub fn open_packages(&self) -> impl Iterator<Item = PackageIdx> + '_ {
        self.package_indices().filter(|&package| {
            let package = &self.packages[package];
            !package.is_delivered() && !package.is_assigned()
        })
    }

    pub fn delivered_count(&self) -> usize {
        self.packages
            .iter()
            .filter(|package| package.is_delivered())
            .count()
    }

    pub(crate) fn vehicles_mut(&mut self) -> &mut [Vehicle] {
        &mut self.vehicles
    }

    /// Restores the assignment of a package loaded from an external source, without the
    /// delivered check.
    pub(crate) fn restore_assignment(
        &mut self,
        package: PackageIdx,
        vehicle: VehicleIdx,
    ) -> Result<(), PlanningError> {
        if self.packages[self.check_package(package)?].is_delivered() {
            self.check_vehicle(vehicle)?;
            self.packages[package].set_assigned_vehicle(Some(vehicle));
            return Ok(());
        }
        self.assign_package(package, vehicle)
    }
}

#[cfg(test)]
mod tests {
    use courier_graph::node::NodeIdx;

    use super::*;
    use crate::test_utils::{create_line_state, idx};

    #[test]
    fn test_invalid_node_reference_is_rejected() {
        let state = create_line_state(3, &[500.0], &[(0, 5, 10.0)]);

        assert!(matches!(
            state,
            Err(PlanningError::Graph(
                courier_graph::error::GraphError::InvalidNodeReference { node: 5, .. }
            ))
        ));
    }

    #[test]
    fn test_assign_and_unassign() {
        let mut state = create_line_state(3, &[100.0], &[(0, 1, 60.0), (0, 2, 50.0)]).unwrap();
        let vehicle = VehicleIdx::new(0);

        state.assign_package(PackageIdx::new(0), vehicle).unwrap();
        assert_eq!(state.vehicle(vehicle).unwrap().load().weight, 60.0);

        let result = state.assign_package(PackageIdx::new(1), vehicle);
        assert!(matches!(result, Err(PlanningError::CapacityExceeded { .. })));
        assert!(!state.package(PackageIdx::new(1)).unwrap().is_assigned());

        assert_eq!(
            state.unassign_package(PackageIdx::new(0)).unwrap(),
            Some(vehicle)
        );
        assert_eq!(state.vehicle(vehicle).unwrap().load().weight, 0.0);
        assert!(state.assigned_packages(vehicle).unwrap().is_empty());

        state.assign_package(PackageIdx::new(1), vehicle).unwrap();
        assert_eq!(
            state.assigned_packages(vehicle).unwrap(),
            &[PackageIdx::new(1)]
        );
    }

    #[test]
    fn test_invalid_references() {
        let mut state = create_line_state(3, &[100.0], &[(0, 1, 10.0)]).unwrap();

        assert!(matches!(
            state.assign_package(PackageIdx::new(4), VehicleIdx::new(0)),
            Err(PlanningError::InvalidPackageReference { package: 4, .. })
        ));
        assert!(matches!(
            state.assign_package(PackageIdx::new(0), VehicleIdx::new(2)),
            Err(PlanningError::InvalidVehicleReference { vehicle: 2, .. })
        ));
        assert!(matches!(
            state.redirect_package(PackageIdx::new(0), idx(1), NodeIdx::new(9)),
            Err(PlanningError::Graph(_))
        ));
    }

    #[test]
    fn test_reset_for_new_cycle_keeps_deliveries() {
        let mut state = create_line_state(3, &[100.0], &[(0, 1, 10.0), (0, 2, 10.0)]).unwrap();
        let vehicle = VehicleIdx::new(0);
        state.assign_package(PackageIdx::new(0), vehicle).unwrap();
        state.assign_package(PackageIdx::new(1), vehicle).unwrap();
        state.mark_delivered(PackageIdx::new(0), 30.0).unwrap();
        state.vehicle_mut(vehicle).unwrap().set_current_location(idx(2));

        state.reset_for_new_cycle();

        let delivered = state.package(PackageIdx::new(0)).unwrap();
        assert_eq!(delivered.assigned_vehicle(), Some(vehicle));
        assert!(!state.package(PackageIdx::new(1)).unwrap().is_assigned());
        assert_eq!(state.vehicle(vehicle).unwrap().current_location(), idx(0));
        assert!(state.vehicle(vehicle).unwrap().load().is_empty());
        assert_eq!(state.open_packages().collect::<Vec<_>>(), vec![PackageIdx::new(1)]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let state = create_line_state(3, &[100.0], &[(0, 1, 10.0)])
            .unwrap()
            .into_shared();

        let before = snapshot(&state);
        state
            .write()
            .assign_package(PackageIdx::new(0), VehicleIdx::new(0))
            .unwrap();

        assert_eq!(before.packages[0].assigned_vehicle, None);
        assert_eq!(snapshot(&state).packages[0].assigned_vehicle, Some(0));
    }
}
