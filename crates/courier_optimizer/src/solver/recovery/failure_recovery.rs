use courier_graph::{
    algorithms::dijkstra::dijkstra,
    edge::EdgeAttributes,
    error::GraphError,
    node::NodeIdx,
    weighting::TimeWeighting,
};
use fxhash::FxHashSet;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    error::PlanningError,
    problem::{network_state::NetworkState, package::PackageIdx, vehicle::VehicleIdx},
    solver::{
        assignment::greedy_assignment::assign_greedy,
        planning_context::PlanningContext,
        routing::{
            route_engine::{apply_route, plan_route},
            route_params::RouteParams,
        },
    },
};

#[derive(Debug, Default, Clone, Serialize)]
pub struct RecoveryReport {
    /// Node that replaced the failed one, if a node failed
    pub substitute: Option<NodeIdx>,
    /// Packages that were unassigned because of the failure
    pub affected: Vec<PackageIdx>,
    /// Affected packages assigned again
    pub reassigned: Vec<PackageIdx>,
    /// Packages left without a vehicle after recovery
    pub unassigned: Vec<PackageIdx>,
    pub replanned_vehicles: Vec<VehicleIdx>,
}

/// Re-plans the vehicles in `vehicles` from their current location. Vehicles that cannot reach
/// one of their stops lose their packages, which are returned.
fn replan(
    state: &mut NetworkState,
    vehicles: &[VehicleIdx],
    start_minute: f64,
    params: &RouteParams,
    context: &mut PlanningContext,
) -> Result<Vec<PackageIdx>, PlanningError> {
    let mut dropped = vec![];
    for &vehicle in vehicles {
        if state.assigned_packages(vehicle)?.is_empty() {
            state.set_route(vehicle, None)?;
            continue;
        }

        match plan_route(state, vehicle, start_minute, params, context) {
            Ok(route) => apply_route(state, route)?,
            Err(PlanningError::Graph(GraphError::NoPath { from, to })) => {
                warn!(
                    vehicle = vehicle.get(),
                    from = from.get(),
                    to = to.get(),
                    "Route cannot be rebuilt, unassigning its packages"
                );
                state.set_route(vehicle, None)?;
                let packages = state.assigned_packages(vehicle)?.to_vec();
                for &package in &packages {
                    state.unassign_package(package)?;
                }
                dropped.extend(packages);
            }
            Err(error) => return Err(error),
        }
    }

    Ok(dropped)
}

/// Handles the failure of `failed`.
///
/// The node is marked unavailable and the assigned, undelivered packages touching it are
/// unassigned. The closest available node of the same type, by travel time from the depot,
/// replaces it as endpoint of those packages, which are then assigned again among the available
/// vehicles. Vehicles that lost or received packages, or whose route drives through the failed
/// node, are routed again.
///
/// When no package touches the failed node and it is not the depot, only the routes are rebuilt
/// and the report has no substitute. When no substitute exists the packages stay unassigned and
/// [`PlanningError::NoSubstituteNode`] lists them.
#[instrument(skip_all, level = "debug", fields(failed = failed.get()))]
pub fn handle_node_failure(
    state: &mut NetworkState,
    failed: NodeIdx,
    start_minute: f64,
    params: &RouteParams,
    context: &mut PlanningContext,
) -> Result<RecoveryReport, PlanningError> {
    let node_type = state.graph().node(failed)?.node_type();
    state.graph_mut().node_mut(failed)?.set_available(false);
    context.statistics_mut().recoveries += 1;

    let affected = state
        .package_indices()
        .filter(|&package| {
            let package = &state.packages()[package];
            package.is_assigned() && !package.is_delivered() && package.touches(failed)
        })
        .collect::<Vec<_>>();

    let mut involved = state
        .routes()
        .filter(|(_, route)| route.nodes().contains(&failed))
        .map(|(vehicle, _)| vehicle)
        .collect::<FxHashSet<_>>();
    for &package in &affected {
        if let Some(vehicle) = state.unassign_package(package)? {
            involved.insert(vehicle);
        }
    }

    if affected.is_empty() && state.depot() != failed {
        let mut involved = involved.into_iter().collect::<Vec<_>>();
        involved.sort();
        info!(
            vehicles = involved.len(),
            "No package touches the failed node, rebuilding routes only"
        );
        let unassigned = replan(state, &involved, start_minute, params, context)?;

        return Ok(RecoveryReport {
            substitute: None,
            affected,
            reassigned: vec![],
            unassigned,
            replanned_vehicles: involved,
        });
    }

    if state.depot() == failed {
        warn!("Depot failed, searching for a replacement depot");
    }
    // The search starts from the failed node when it is the depot, it is never entered again
    let origin = state.depot();
    let paths = dijkstra(state.graph(), origin, &TimeWeighting::new(params.conditions))?;
    let substitute = state
        .graph()
        .nodes()
        .filter(|(node, attributes)| {
            *node != failed && attributes.is_available() && attributes.node_type() == node_type
        })
        .filter_map(|(node, _)| paths.distance(node).map(|distance| (node, distance)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(node, _)| node);

    let mut involved = involved.into_iter().collect::<Vec<_>>();
    involved.sort();

    let Some(substitute) = substitute else {
        warn!(
            affected = affected.len(),
            "No substitute node, affected packages stay unassigned"
        );
        replan(state, &involved, start_minute, params, context)?;
        return Err(PlanningError::NoSubstituteNode {
            failed,
            node_type,
            affected,
        });
    };

    info!(substitute = substitute.get(), "Substitute node found");
    if state.depot() == failed {
        state.set_depot(substitute)?;
    }
    for &package in &affected {
        state.redirect_package(package, failed, substitute)?;
    }

    let fleet = state.vehicle_indices().collect::<Vec<_>>();
    let outcome = assign_greedy(state, &affected, &fleet)?;
    for (vehicle, _) in &outcome.loadings {
        if !involved.contains(vehicle) {
            involved.push(*vehicle);
        }
    }
    involved.sort();

    // Vehicles standing on the failed node are moved to the substitute
    for &vehicle in &involved {
        let vehicle_ref = state.vehicle_mut(vehicle)?;
        if vehicle_ref.current_location() == failed {
            vehicle_ref.set_current_location(substitute);
        }
    }

    let dropped = replan(state, &involved, start_minute, params, context)?;

    let reassigned = affected
        .iter()
        .copied()
        .filter(|&package| state.packages()[package].is_assigned())
        .collect::<Vec<_>>();
    let mut unassigned = outcome.unassigned;
    unassigned.extend(dropped);

    Ok(RecoveryReport {
        substitute: Some(substitute),
        affected,
        reassigned,
        unassigned,
        replanned_vehicles: involved,
    })
}

/// Handles the failure of the road from `src` to `dest`.
///
/// The first matching edge is removed and every vehicle whose route drives along it is routed
/// again. Returns the removed road, if there was one, with the recovery report.
#[instrument(skip_all, level = "debug", fields(src = src.get(), dest = dest.get()))]
pub fn handle_edge_failure(
    state: &mut NetworkState,
    src: NodeIdx,
    dest: NodeIdx,
    start_minute: f64,
    params: &RouteParams,
    context: &mut PlanningContext,
) -> Result<(Option<EdgeAttributes>, RecoveryReport), PlanningError> {
    let removed = state.graph_mut().remove_edge(src, dest)?;
    context.statistics_mut().recoveries += 1;

    if removed.is_none() {
        info!("No road to remove");
        return Ok((None, RecoveryReport::default()));
    }

    let impacted = state
        .routes()
        .filter(|(_, route)| route.traverses(src, dest))
        .map(|(vehicle, _)| vehicle)
        .collect::<Vec<_>>();

    let affected = impacted
        .iter()
        .map(|&vehicle| state.assigned_packages(vehicle).map(|packages| packages.to_vec()))
        .collect::<Result<Vec<_>, _>>()?
        .concat();

    let unassigned = replan(state, &impacted, start_minute, params, context)?;
    let reassigned = affected
        .iter()
        .copied()
        .filter(|package| !unassigned.contains(package))
        .collect();

    Ok((
        removed,
        RecoveryReport {
            substitute: None,
            affected,
            reassigned,
            unassigned,
            replanned_vehicles: impacted,
        },
    ))
}
