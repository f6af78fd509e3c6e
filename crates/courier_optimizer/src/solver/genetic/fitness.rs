use crate::{
    error::PlanningError,
    problem::{
        network_state::NetworkState,
        package::PackageIdx,
        vehicle::{Load, VehicleIdx},
    },
};

/// Direct road of a package, from the first matching edge between its endpoints.
#[derive(Debug, Clone, Copy)]
struct DirectRoad {
    distance: f64,
    cost: f64,
    time: f64,
}

#[derive(Debug, Clone)]
struct Gene {
    load: Load,
    priority: f64,
    road: Option<DirectRoad>,
}

/// Read only view of the state used to score assignment vectors.
///
/// Built once per run so that evaluations never touch the live state and can run in parallel.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    genes: Vec<Gene>,
    /// Remaining capacity of every vehicle of the fleet, by vehicle index
    capacities: Vec<Load>,
    cost_per_km: Vec<f64>,
}

impl FitnessEvaluator {
    pub fn new(state: &NetworkState, packages: &[PackageIdx]) -> Result<Self, PlanningError> {
        let graph = state.graph();
        let mut genes = Vec::with_capacity(packages.len());
        for &package in packages {
            let package = state.package(package)?;
            let road = graph
                .first_edge(package.source(), package.destination())?
                .map(|attributes| DirectRoad {
                    distance: attributes.distance,
                    cost: attributes.cost,
                    time: attributes.base_time,
                });
            genes.push(Gene {
                load: package.load(),
                priority: package.priority(),
                road,
            });
        }

        Ok(FitnessEvaluator {
            genes,
            capacities: state
                .vehicles()
                .iter()
                .map(|vehicle| vehicle.remaining_capacity())
                .collect(),
            cost_per_km: state
                .vehicles()
                .iter()
                .map(|vehicle| vehicle.cost_per_km())
                .collect(),
        })
    }

    pub fn gene_count(&self) -> usize {
        self.genes.len()
    }

    fn loads(&self, assignments: &[VehicleIdx]) -> Vec<Load> {
        let mut loads = vec![Load::default(); self.capacities.len()];
        for (gene, vehicle) in self.genes.iter().zip(assignments) {
            loads[vehicle.get()] = loads[vehicle.get()] + gene.load;
        }
        loads
    }

    /// First vehicle whose capacity the assignment exceeds, with the load it would carry.
    pub fn first_overload(&self, assignments: &[VehicleIdx]) -> Option<(VehicleIdx, Load)> {
        let loads = self.loads(assignments);
        loads
            .iter()
            .zip(&self.capacities)
            .position(|(load, capacity)| {
                load.weight > capacity.weight || load.volume > capacity.volume
            })
            .map(|vehicle| (VehicleIdx::new(vehicle), loads[vehicle]))
    }

    /// Zero when a vehicle is overloaded, otherwise the total priority over one plus the total
    /// cost and time of the direct roads.
    pub fn fitness(&self, assignments: &[VehicleIdx]) -> f64 {
        if self.first_overload(assignments).is_some() {
            return 0.0;
        }

        let mut priority = 0.0;
        let mut cost = 0.0;
        let mut time = 0.0;
        for (gene, vehicle) in self.genes.iter().zip(assignments) {
            priority += gene.priority;
            if let Some(road) = gene.road {
                cost += road.cost + road.distance * self.cost_per_km[vehicle.get()];
                time += road.time;
            }
        }

        priority / (1.0 + cost + time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_line_state;

    #[test]
    fn test_overloaded_vehicle_scores_zero() {
        let state = create_line_state(3, &[100.0, 100.0], &[(0, 1, 60.0), (1, 2, 60.0)]).unwrap();
        let packages = state.package_indices().collect::<Vec<_>>();
        let evaluator = FitnessEvaluator::new(&state, &packages).unwrap();

        let overloaded = [VehicleIdx::new(0), VehicleIdx::new(0)];
        assert_eq!(evaluator.fitness(&overloaded), 0.0);
        assert_eq!(
            evaluator.first_overload(&overloaded).map(|(vehicle, _)| vehicle),
            Some(VehicleIdx::new(0))
        );

        let split = [VehicleIdx::new(0), VehicleIdx::new(1)];
        assert!(evaluator.first_overload(&split).is_none());
        assert!(evaluator.fitness(&split) > 0.0);
    }

    #[test]
    fn test_fitness_uses_direct_roads() {
        // Road of 10 km, 10 cost and 0.2 h between consecutive nodes
        let state = create_line_state(3, &[100.0], &[(0, 1, 10.0), (0, 2, 10.0)]).unwrap();
        let packages = state.package_indices().collect::<Vec<_>>();
        let evaluator = FitnessEvaluator::new(&state, &packages).unwrap();
        let cost_per_km = state.vehicles()[0].cost_per_km();

        let fitness = evaluator.fitness(&[VehicleIdx::new(0), VehicleIdx::new(0)]);

        // Only the first package has a direct road
        let expected = 2.0 / (1.0 + 10.0 + 10.0 * cost_per_km + 0.2);
        assert!((fitness - expected).abs() < 1e-9);
    }
}
