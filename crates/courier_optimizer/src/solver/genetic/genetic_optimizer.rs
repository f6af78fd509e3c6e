use rand::{Rng, SeedableRng, rngs::SmallRng, seq::IndexedRandom};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::{
    error::PlanningError,
    problem::{network_state::NetworkState, package::PackageIdx, vehicle::VehicleIdx},
    solver::planning_context::PlanningContext,
    timer_debug,
};

use super::{
    fitness::FitnessEvaluator, genetic_params::GeneticParams, individual::Individual,
    select_tournament::select_tournament,
};

#[derive(Debug, Clone, Serialize)]
pub struct GeneticOutcome {
    packages: Vec<PackageIdx>,
    vehicles: Vec<VehicleIdx>,
    /// `None` when there was nothing to assign or no vehicle to assign to
    best: Option<Individual>,
    /// Best fitness so far after each evaluated generation
    history: Vec<f64>,
    #[serde(skip)]
    evaluator: Option<FitnessEvaluator>,
}

impl GeneticOutcome {
    pub fn packages(&self) -> &[PackageIdx] {
        &self.packages
    }

    pub fn vehicles(&self) -> &[VehicleIdx] {
        &self.vehicles
    }

    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    pub fn best_fitness(&self) -> f64 {
        self.best.as_ref().map_or(0.0, |best| best.fitness())
    }

    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// Applies the best assignment vector to `state` and returns the number of packages
    /// assigned. Fails without mutation when the best individual overloads a vehicle.
    pub fn assign_best(&self, state: &mut NetworkState) -> Result<usize, PlanningError> {
        let (Some(best), Some(evaluator)) = (&self.best, &self.evaluator) else {
            return Ok(0);
        };

        if let Some((vehicle, load)) = evaluator.first_overload(best.assignments()) {
            let vehicle_ref = state.vehicle(vehicle)?;
            let total = vehicle_ref.load() + load;
            return Err(PlanningError::CapacityExceeded {
                vehicle,
                weight: total.weight,
                volume: total.volume,
                weight_capacity: vehicle_ref.weight_capacity(),
                volume_capacity: vehicle_ref.volume_capacity(),
            });
        }

        for (&package, &vehicle) in self.packages.iter().zip(best.assignments()) {
            state.assign_package(package, vehicle)?;
        }

        Ok(self.packages.len())
    }
}

/// Population based search over package to vehicle assignment vectors.
pub struct GeneticOptimizer<'a> {
    params: &'a GeneticParams,
}

impl<'a> GeneticOptimizer<'a> {
    pub fn new(params: &'a GeneticParams) -> Self {
        GeneticOptimizer { params }
    }

    /// Runs with a generator seeded from the params, or from the thread generator when no seed
    /// is set.
    pub fn run(
        &self,
        state: &NetworkState,
        packages: &[PackageIdx],
        vehicles: &[VehicleIdx],
        context: &mut PlanningContext,
    ) -> Result<GeneticOutcome, PlanningError> {
        let mut rng = match self.params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_rng(&mut rand::rng()),
        };

        self.run_with_rng(state, packages, vehicles, context, &mut rng)
    }

    /// Only pending and unassigned packages are considered, and only available vehicles receive
    /// packages. The state is not modified, see [`GeneticOutcome::assign_best`].
    #[instrument(skip_all, level = "debug")]
    pub fn run_with_rng<R: Rng>(
        &self,
        state: &NetworkState,
        packages: &[PackageIdx],
        vehicles: &[VehicleIdx],
        context: &mut PlanningContext,
        rng: &mut R,
    ) -> Result<GeneticOutcome, PlanningError> {
        let mut considered = Vec::with_capacity(packages.len());
        for &package in packages {
            let package_ref = state.package(package)?;
            if !package_ref.is_delivered() && !package_ref.is_assigned() {
                considered.push(package);
            }
        }
        let mut fleet = Vec::with_capacity(vehicles.len());
        for &vehicle in vehicles {
            if state.vehicle(vehicle)?.is_available() {
                fleet.push(vehicle);
            }
        }

        let mut outcome = GeneticOutcome {
            packages: considered,
            vehicles: fleet,
            best: None,
            history: vec![],
            evaluator: None,
        };
        if outcome.packages.is_empty() || outcome.vehicles.is_empty() {
            return Ok(outcome);
        }

        let evaluator = FitnessEvaluator::new(state, &outcome.packages)?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.params.threads.number_of_threads())
            .build()?;

        let population_size = self.params.population_size.max(1);
        let mut population = (0..population_size)
            .map(|_| self.random_individual(evaluator.gene_count(), &outcome.vehicles, rng))
            .collect::<Vec<_>>();

        for generation in 0..self.params.generations {
            let generation_best = timer_debug!(
                "Fitness evaluation",
                pool.install(|| {
                    population
                        .par_iter_mut()
                        .for_each(|individual| {
                            let fitness = evaluator.fitness(individual.assignments());
                            individual.set_fitness(fitness);
                        });

                    population
                        .par_iter()
                        .enumerate()
                        .reduce_with(|a, b| {
                            if b.1.fitness() > a.1.fitness()
                                || (b.1.fitness() == a.1.fitness() && b.0 < a.0)
                            {
                                b
                            } else {
                                a
                            }
                        })
                        .map(|(_, individual)| individual.clone())
                })
            );

            if let Some(candidate) = generation_best
                && outcome
                    .best
                    .as_ref()
                    .is_none_or(|best| candidate.fitness() > best.fitness())
            {
                debug!(generation, fitness = candidate.fitness(), "New best individual");
                outcome.best = Some(candidate);
            }
            outcome.history.push(outcome.best_fitness());
            context.statistics_mut().generations += 1;

            if context.is_cancelled() {
                info!(generation, "Genetic search cancelled");
                break;
            }
            if generation + 1 < self.params.generations {
                population = self.next_generation(&population, &outcome.vehicles, rng);
            }
        }

        info!(
            generations = outcome.history.len(),
            fitness = outcome.best_fitness(),
            "Genetic search finished"
        );
        outcome.evaluator = Some(evaluator);
        Ok(outcome)
    }

    fn random_individual<R: Rng>(
        &self,
        genes: usize,
        fleet: &[VehicleIdx],
        rng: &mut R,
    ) -> Individual {
        Individual::new(
            (0..genes)
                .map(|_| fleet.choose(rng).copied().unwrap_or_default())
                .collect(),
        )
    }

    fn mutate<R: Rng>(&self, individual: &mut Individual, fleet: &[VehicleIdx], rng: &mut R) {
        let rate = self.params.mutation_rate.clamp(0.0, 1.0);
        for gene in individual.assignments_mut() {
            if rng.random_bool(rate)
                && let Some(&vehicle) = fleet.choose(rng)
            {
                *gene = vehicle;
            }
        }
    }

    /// Elites first, then mutated children of tournament winners.
    fn next_generation<R: Rng>(
        &self,
        population: &[Individual],
        fleet: &[VehicleIdx],
        rng: &mut R,
    ) -> Vec<Individual> {
        let mut ranked = population.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        let mut next = Vec::with_capacity(population.len());
        next.extend(
            ranked
                .iter()
                .take(self.params.elite_size.min(population.len()))
                .map(|&individual| individual.clone()),
        );

        while next.len() < population.len() {
            let (Some(first), Some(second)) = (
                select_tournament(population, rng),
                select_tournament(population, rng),
            ) else {
                break;
            };

            let genes = first.assignments().len();
            let point = if genes > 0 { rng.random_range(0..genes) } else { 0 };
            let (mut first_child, mut second_child) = first.crossover(second, point);

            self.mutate(&mut first_child, fleet, rng);
            next.push(first_child);
            if next.len() < population.len() {
                self.mutate(&mut second_child, fleet, rng);
                next.push(second_child);
            }
        }

        next
    }
}
