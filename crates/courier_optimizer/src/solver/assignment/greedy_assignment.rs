use tracing::{debug, instrument, warn};

use crate::{
    error::PlanningError,
    problem::{
        network_state::NetworkState,
        package::PackageIdx,
        vehicle::{Load, VehicleIdx},
    },
};

use super::loading::Loading;

#[derive(Debug, Default)]
pub struct AssignmentOutcome {
    pub loadings: Vec<(VehicleIdx, Loading)>,
    /// Packages left without a vehicle, in consideration order
    pub unassigned: Vec<PackageIdx>,
    /// Unassigned packages that exceed the total capacity of every considered vehicle
    pub oversized: Vec<PackageIdx>,
}

impl AssignmentOutcome {
    pub fn assigned_count(&self) -> usize {
        self.loadings.iter().map(|(_, loading)| loading.len()).sum()
    }
}

/// Orders packages by descending priority, earliest window start first on ties.
pub fn sort_packages(state: &NetworkState, packages: &mut [PackageIdx]) {
    let all = state.packages();
    packages.sort_by(|&a, &b| {
        all[b]
            .priority()
            .total_cmp(&all[a].priority())
            .then_with(|| all[a].window().start.total_cmp(&all[b].window().start))
    });
}

/// Orders vehicles by ascending remaining capacity so that the tightest fitting vehicle is
/// loaded first.
fn sort_vehicles(state: &NetworkState, vehicles: &mut [VehicleIdx]) {
    let all = state.vehicles();
    vehicles.sort_by(|&a, &b| {
        let (a_remaining, b_remaining) = (all[a].remaining_capacity(), all[b].remaining_capacity());
        a_remaining
            .weight
            .total_cmp(&b_remaining.weight)
            .then_with(|| a_remaining.volume.total_cmp(&b_remaining.volume))
            .then_with(|| a.cmp(&b))
    });
}

/// Best loading of `candidates` for a vehicle with `capacity` left.
///
/// Each start position seeds a loading that is then extended with every later package that
/// still fits. The loading with the highest value wins, the first one found on ties.
fn best_loading(state: &NetworkState, candidates: &[PackageIdx], capacity: Load) -> Loading {
    let packages = state.packages();
    let mut best = Loading::default();

    for start in 0..candidates.len() {
        let mut loading = Loading::default();
        for &index in &candidates[start..] {
            let package = &packages[index];
            if loading.fits(package, capacity) {
                loading.push(index, package);
            }
        }

        if !loading.is_empty() && (best.is_empty() || loading.value() > best.value()) {
            best = loading;
        }
    }

    best
}

/// Greedy capacity aware assignment of `packages` to `vehicles`.
///
/// Delivered and already assigned packages are ignored, as are unavailable vehicles. Vehicles
/// keep what they already carry and only receive what fits in their remaining capacity.
#[instrument(skip_all, level = "debug")]
pub fn assign_greedy(
    state: &mut NetworkState,
    packages: &[PackageIdx],
    vehicles: &[VehicleIdx],
) -> Result<AssignmentOutcome, PlanningError> {
    let mut candidates = Vec::with_capacity(packages.len());
    for &package in packages {
        let package_ref = state.package(package)?;
        if !package_ref.is_delivered() && !package_ref.is_assigned() {
            candidates.push(package);
        }
    }

    let mut fleet = Vec::with_capacity(vehicles.len());
    for &vehicle in vehicles {
        if state.vehicle(vehicle)?.is_available() {
            fleet.push(vehicle);
        }
    }

    sort_packages(state, &mut candidates);
    sort_vehicles(state, &mut fleet);

    let mut outcome = AssignmentOutcome::default();
    for &vehicle in &fleet {
        if candidates.is_empty() {
            break;
        }

        let capacity = state.vehicle(vehicle)?.remaining_capacity();
        let loading = best_loading(state, &candidates, capacity);
        if loading.is_empty() {
            continue;
        }

        for &package in loading.packages() {
            state.assign_package(package, vehicle)?;
        }
        candidates.retain(|package| !loading.packages().contains(package));

        debug!(
            vehicle = vehicle.get(),
            packages = loading.len(),
            value = loading.value(),
            "Loaded vehicle"
        );
        outcome.loadings.push((vehicle, loading));
    }

    for &package in &candidates {
        let load = state.packages()[package].load();
        let fits_somewhere = fleet.iter().any(|&vehicle| {
            let capacity = state.vehicles()[vehicle].capacity();
            load.weight <= capacity.weight && load.volume <= capacity.volume
        });
        if !fits_somewhere {
            warn!(package = package.get(), "Package exceeds the capacity of every vehicle");
            outcome.oversized.push(package);
        }
    }
    outcome.unassigned = candidates;

    Ok(outcome)
}
