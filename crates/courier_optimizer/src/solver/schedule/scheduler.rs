use courier_graph::error::GraphError;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    error::PlanningError,
    problem::{network_state::NetworkState, package::PackageIdx, vehicle::VehicleIdx},
    solver::{
        assignment::greedy_assignment::assign_greedy,
        genetic::genetic_optimizer::GeneticOptimizer,
        planning_context::PlanningContext,
        routing::route_engine::{apply_route, plan_route},
    },
};

use super::scheduler_params::{AssignmentStrategy, SchedulerParams};

#[derive(Debug, Clone, Serialize)]
pub struct DayReport {
    pub day: usize,
    /// Undelivered packages whose window overlaps the day
    pub considered: usize,
    pub assigned: usize,
    pub delivered: usize,
    /// Delivered packages over the whole horizon at the end of the day
    pub delivered_total: usize,
    pub violations: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleReport {
    pub days: Vec<DayReport>,
    pub delivered: usize,
    pub total: usize,
}

/// Drives assignment and routing over day long planning windows.
pub struct Scheduler<'a> {
    params: &'a SchedulerParams,
}

impl<'a> Scheduler<'a> {
    pub fn new(params: &'a SchedulerParams) -> Self {
        Scheduler { params }
    }

    fn day_length(&self) -> Result<f64, PlanningError> {
        let day_length = self.params.day_length;
        if day_length.is_finite() && day_length > 0.0 {
            Ok(day_length)
        } else {
            Err(PlanningError::InvalidDayLength { day_length })
        }
    }

    /// Last day worth planning: the day of the latest window end, or of the latest window start
    /// for packages without a deadline. Saturates at `usize::MAX` for far away deadlines.
    pub fn max_day(&self, state: &NetworkState) -> Result<usize, PlanningError> {
        let day_length = self.day_length()?;
        let latest = state
            .packages()
            .iter()
            .map(|package| {
                let window = package.window();
                if window.end.is_finite() {
                    window.end
                } else {
                    window.start
                }
            })
            .fold(0.0_f64, f64::max);

        Ok((latest / day_length).floor().max(0.0) as usize)
    }

    /// True when no undelivered package opens after `day_end`. Following days start later with
    /// the same fleet, so they cannot deliver more than a day that delivered nothing.
    fn is_stalled(state: &NetworkState, day_end: f64) -> bool {
        state
            .packages()
            .iter()
            .filter(|package| !package.is_delivered())
            .all(|package| package.window().start <= day_end)
    }

    fn assign(
        &self,
        state: &mut NetworkState,
        packages: &[PackageIdx],
        vehicles: &[VehicleIdx],
        context: &mut PlanningContext,
    ) -> Result<usize, PlanningError> {
        if let AssignmentStrategy::Genetic(genetic_params) = &self.params.strategy {
            let outcome =
                GeneticOptimizer::new(genetic_params).run(state, packages, vehicles, context)?;
            match outcome.assign_best(state) {
                Ok(assigned) => return Ok(assigned),
                Err(PlanningError::CapacityExceeded { vehicle, .. }) => {
                    warn!(
                        vehicle = vehicle.get(),
                        "Best genetic assignment overloads a vehicle, using the greedy assignment"
                    );
                }
                Err(error) => return Err(error),
            }
        }

        let outcome = assign_greedy(state, packages, vehicles)?;
        Ok(outcome.assigned_count())
    }

    /// Plans `day`: every vehicle starts at the depot, the undelivered packages whose window
    /// overlaps the day are assigned and routed, and the packages dropped within their window
    /// are marked delivered.
    #[instrument(skip_all, level = "debug", fields(day = day))]
    pub fn plan_day(
        &self,
        state: &mut NetworkState,
        day: usize,
        context: &mut PlanningContext,
    ) -> Result<DayReport, PlanningError> {
        let day_length = self.day_length()?;
        state.reset_for_new_cycle();

        let day_start = day as f64 * day_length;
        let day_end = day_start + day_length;
        let packages = state
            .package_indices()
            .filter(|&package| {
                let package = &state.packages()[package];
                !package.is_delivered() && package.window().overlaps(day_start, day_end)
            })
            .collect::<Vec<_>>();
        let vehicles = state.vehicle_indices().collect::<Vec<_>>();

        let assigned = if packages.is_empty() {
            0
        } else {
            self.assign(state, &packages, &vehicles, context)?
        };

        let mut delivered = 0;
        let mut violations = 0;
        for &vehicle in &vehicles {
            if state.assigned_packages(vehicle)?.is_empty() {
                continue;
            }

            let route = match plan_route(state, vehicle, day_start, &self.params.route, context) {
                Ok(route) => route,
                Err(PlanningError::Graph(GraphError::NoPath { from, to })) => {
                    warn!(
                        vehicle = vehicle.get(),
                        from = from.get(),
                        to = to.get(),
                        "Vehicle cannot reach its stops, packages postponed"
                    );
                    for package in state.assigned_packages(vehicle)?.to_vec() {
                        state.unassign_package(package)?;
                    }
                    continue;
                }
                Err(error) => return Err(error),
            };

            let deliveries = route.on_time_deliveries().collect::<Vec<_>>();
            violations += route.violations().len();
            apply_route(state, route)?;
            for (package, minute) in deliveries {
                state.mark_delivered(package, minute)?;
                delivered += 1;
            }
        }

        Ok(DayReport {
            day,
            considered: packages.len(),
            assigned,
            delivered,
            delivered_total: state.delivered_count(),
            violations,
        })
    }

    /// Plans day after day until every package is delivered, the last day worth planning is
    /// done, or a day delivers nothing while no package opens later. Fails with
    /// [`PlanningError::Cancelled`] when cancelled between two days.
    #[instrument(skip_all, level = "debug")]
    pub fn plan_horizon(
        &self,
        state: &mut NetworkState,
        context: &mut PlanningContext,
    ) -> Result<ScheduleReport, PlanningError> {
        let max_day = self.max_day(state)?;
        let day_length = self.day_length()?;
        let total = state.packages().len();
        let mut days = Vec::new();

        for day in 0..=max_day {
            if context.is_cancelled() {
                return Err(PlanningError::Cancelled);
            }
            if state.delivered_count() == total {
                break;
            }

            let report = self.plan_day(state, day, context)?;
            info!(
                day,
                considered = report.considered,
                delivered = report.delivered,
                delivered_total = report.delivered_total,
                "Day planned"
            );
            let next_day_start = day.saturating_add(1) as f64 * day_length;
            let stalled = report.delivered == 0 && Self::is_stalled(state, next_day_start);
            days.push(report);

            if stalled {
                info!(day, "Nothing left that a later day could deliver");
                break;
            }
        }

        Ok(ScheduleReport {
            days,
            delivered: state.delivered_count(),
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solver::genetic::genetic_params::{GeneticParams, Threads},
        test_utils::{create_windowed_state, idx},
    };

    #[test]
    fn test_packages_planned_on_their_day() {
        // Windows on day 0, day 1 and day 2
        let mut state = create_windowed_state(&[(60.0, 600.0), (1500.0, 2000.0), (3000.0, 3500.0)]);
        let params = SchedulerParams::default();
        let scheduler = Scheduler::new(&params);
        let mut context = PlanningContext::default();

        assert_eq!(scheduler.max_day(&state).unwrap(), 2);
        let report = scheduler.plan_horizon(&mut state, &mut context).unwrap();

        assert_eq!(report.days.len(), 3);
        assert_eq!(report.delivered, 3);
        assert_eq!(report.total, 3);
        assert!(
            report
                .days
                .windows(2)
                .all(|pair| pair[0].delivered_total <= pair[1].delivered_total)
        );
        for package in state.packages() {
            let delivered_at = package.delivered_at().unwrap();
            assert!(package.window().contains(delivered_at));
        }
    }

    #[test]
    fn test_stops_once_everything_is_delivered() {
        let mut state = create_windowed_state(&[(0.0, 600.0), (0.0, 5000.0)]);
        let params = SchedulerParams::default();
        let scheduler = Scheduler::new(&params);

        let report = scheduler
            .plan_horizon(&mut state, &mut PlanningContext::default())
            .unwrap();

        assert_eq!(scheduler.max_day(&state).unwrap(), 3);
        assert_eq!(report.days.len(), 1);
        assert_eq!(report.delivered, 2);
    }

    #[test]
    fn test_cancelled_horizon() {
        let mut state = create_windowed_state(&[(0.0, 600.0)]);
        let params = SchedulerParams::default();
        let mut context = PlanningContext::default();
        context.token().cancel();

        let result = Scheduler::new(&params).plan_horizon(&mut state, &mut context);

        assert!(matches!(result, Err(PlanningError::Cancelled)));
    }

    #[test]
    fn test_genetic_strategy() {
        let mut state = create_windowed_state(&[(0.0, 1000.0), (0.0, 1000.0), (100.0, 1200.0)]);
        let params = SchedulerParams {
            strategy: AssignmentStrategy::Genetic(GeneticParams {
                population_size: 20,
                generations: 10,
                seed: Some(17),
                threads: Threads::Single,
                ..GeneticParams::default()
            }),
            ..SchedulerParams::default()
        };

        let report = Scheduler::new(&params)
            .plan_horizon(&mut state, &mut PlanningContext::default())
            .unwrap();

        assert_eq!(report.delivered, 3);
    }

    #[test]
    fn test_far_deadline_is_planned_without_preallocating_days() {
        let mut state = create_windowed_state(&[(0.0, 1.0e18)]);
        let params = SchedulerParams::default();
        let scheduler = Scheduler::new(&params);

        assert!(scheduler.max_day(&state).unwrap() > 1_000_000_000);
        let report = scheduler
            .plan_horizon(&mut state, &mut PlanningContext::default())
            .unwrap();

        assert_eq!(report.days.len(), 1);
        assert_eq!(report.delivered, 1);
    }

    #[test]
    fn test_undeliverable_package_stops_the_horizon() {
        let mut state = create_windowed_state(&[(0.0, 1.0e18)]);
        state
            .graph_mut()
            .node_mut(idx(1))
            .unwrap()
            .set_available(false);
        let params = SchedulerParams::default();

        let report = Scheduler::new(&params)
            .plan_horizon(&mut state, &mut PlanningContext::default())
            .unwrap();

        assert_eq!(report.days.len(), 1);
        assert_eq!(report.delivered, 0);
    }

    #[test]
    fn test_invalid_day_length() {
        let mut state = create_windowed_state(&[(0.0, 600.0)]);
        for day_length in [0.0, -60.0, f64::NAN] {
            let params = SchedulerParams {
                day_length,
                ..SchedulerParams::default()
            };
            let scheduler = Scheduler::new(&params);

            assert!(matches!(
                scheduler.max_day(&state),
                Err(PlanningError::InvalidDayLength { .. })
            ));
            assert!(matches!(
                scheduler.plan_horizon(&mut state, &mut PlanningContext::default()),
                Err(PlanningError::InvalidDayLength { .. })
            ));
        }
        assert_eq!(state.delivered_count(), 0);
    }
}
