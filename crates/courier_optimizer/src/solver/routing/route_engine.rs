use tracing::{debug, instrument, warn};

use crate::{
    error::PlanningError,
    problem::{network_state::NetworkState, vehicle::VehicleIdx},
    solver::planning_context::PlanningContext,
};

use super::{
    route::{PlannedStop, Route, StopKind},
    route_params::RouteParams,
    route_simulation::RouteSimulator,
    two_opt::two_opt,
};

/// Initial visiting sequence of a vehicle: its current location, then the pickup and drop of
/// each assigned package in assignment order, then the depot when routes return to it.
pub fn build_stops(
    state: &NetworkState,
    vehicle: VehicleIdx,
    params: &RouteParams,
) -> Result<Vec<PlannedStop>, PlanningError> {
    let assigned = state.assigned_packages(vehicle)?;
    let mut stops = Vec::with_capacity(assigned.len() * 2 + 2);

    stops.push(PlannedStop::new(
        state.vehicle(vehicle)?.current_location(),
        StopKind::Start,
    ));
    for &package in assigned {
        let package_ref = state.package(package)?;
        stops.push(PlannedStop::new(
            package_ref.source(),
            StopKind::Pickup(package),
        ));
        stops.push(PlannedStop::new(
            package_ref.destination(),
            StopKind::Delivery(package),
        ));
    }
    if params.return_to_depot {
        stops.push(PlannedStop::new(state.depot(), StopKind::Return));
    }

    Ok(stops)
}

/// Builds and refines the route of `vehicle` for its assigned packages, departing from its
/// current location at `start_minute`. The state is left untouched, see [`apply_route`].
#[instrument(skip_all, level = "debug", fields(vehicle = vehicle.get()))]
pub fn plan_route(
    state: &NetworkState,
    vehicle: VehicleIdx,
    start_minute: f64,
    params: &RouteParams,
    context: &mut PlanningContext,
) -> Result<Route, PlanningError> {
    let stops = build_stops(state, vehicle, params)?;
    let mut simulator = RouteSimulator::new(state, vehicle, params)?;

    let (_, route) = two_opt(
        &mut simulator,
        stops,
        start_minute,
        params.max_two_opt_passes,
        context,
    )?;

    let statistics = context.statistics_mut();
    statistics.routes_built += 1;
    statistics.charging_stops += route.charging_stops();
    statistics.rest_stops += route.rest_stops();

    for violation in route.violations() {
        warn!(vehicle = vehicle.get(), "{violation}");
    }
    debug!(
        stops = route.stops().len(),
        cost = route.total_cost(),
        time = route.total_time(),
        "Planned route"
    );

    Ok(route)
}

/// Moves the vehicle to the end of `route` with the battery and driving time it ends with, and
/// stores the route as the current one.
pub fn apply_route(state: &mut NetworkState, route: Route) -> Result<(), PlanningError> {
    let vehicle_idx = route.vehicle();
    let vehicle = state.vehicle_mut(vehicle_idx)?;

    if let Some(end) = route.end_node() {
        vehicle.set_current_location(end);
    }
    vehicle.set_current_battery(route.final_battery());
    vehicle.set_driving_time(route.final_driving_time());

    state.set_route(vehicle_idx, Some(route))
}
