use courier_graph::error::GraphError;
use fxhash::FxHashMap;
use tracing::{debug, instrument};

use crate::{problem::package::PackageIdx, solver::planning_context::PlanningContext};

use super::{
    route::{PlannedStop, Route, StopKind},
    route_simulation::RouteSimulator,
};

/// Whether every package is picked up before it is dropped.
pub fn respects_precedence(stops: &[PlannedStop]) -> bool {
    let mut pickups: FxHashMap<PackageIdx, usize> = FxHashMap::default();
    for (position, stop) in stops.iter().enumerate() {
        if let StopKind::Pickup(package) = stop.kind {
            pickups.insert(package, position);
        }
    }

    stops
        .iter()
        .enumerate()
        .all(|(position, stop)| match stop.kind {
            StopKind::Delivery(package) => pickups
                .get(&package)
                .is_none_or(|&pickup| pickup < position),
            _ => true,
        })
}

/// Range of positions that may be exchanged: everything but the departure and the final
/// return to the depot.
fn movable_range(stops: &[PlannedStop]) -> std::ops::Range<usize> {
    let end = match stops.last() {
        Some(stop) if stop.kind == StopKind::Return => stops.len() - 1,
        _ => stops.len(),
    };
    1..end.max(1)
}

/// **Intra-Route Exchange**
///
/// Swaps two stops of the sequence and keeps the swap when the simulated route is strictly
/// cheaper. Charging and rest stops are not part of the sequence, the simulation inserts them
/// again for every candidate.
///
/// ```text
/// BEFORE:
///    [start] -> ... -> [i] -> ... -> [j] -> ... -> [return]
///
/// AFTER:
///    [start] -> ... -> [j] -> ... -> [i] -> ... -> [return]
/// ```
///
/// Passes are repeated until one brings no improvement, `max_passes` is reached or the context
/// is cancelled. Candidates that cannot be simulated are treated as non improving.
#[instrument(skip_all, level = "debug")]
pub fn two_opt(
    simulator: &mut RouteSimulator,
    mut stops: Vec<PlannedStop>,
    start_minute: f64,
    max_passes: usize,
    context: &mut PlanningContext,
) -> Result<(Vec<PlannedStop>, Route), GraphError> {
    let mut best = simulator.simulate(&stops, start_minute)?;
    let range = movable_range(&stops);

    let mut passes = 0;
    while passes < max_passes && !context.is_cancelled() {
        let mut improved = false;

        for i in range.clone() {
            for j in (i + 1)..range.end {
                if stops[i] == stops[j] {
                    continue;
                }

                stops.swap(i, j);
                if !respects_precedence(&stops) {
                    stops.swap(i, j);
                    continue;
                }

                match simulator.simulate(&stops, start_minute) {
                    Ok(candidate) if candidate.total_cost < best.total_cost => {
                        best = candidate;
                        improved = true;
                        context.statistics_mut().improving_swaps += 1;
                    }
                    _ => stops.swap(i, j),
                }
            }
        }

        passes += 1;
        context.statistics_mut().two_opt_passes += 1;

        if !improved {
            break;
        }
    }

    debug!(passes, cost = best.total_cost, "2-opt finished");
    Ok((stops, best))
}
