use rand::{Rng, seq::IteratorRandom};

use super::individual::Individual;

/// Draws two distinct individuals and keeps the fitter one, the first drawn on ties.
pub fn select_tournament<'a>(
    population: &'a [Individual],
    rng: &mut impl Rng,
) -> Option<&'a Individual> {
    if population.len() <= 1 {
        return population.first();
    }

    let candidates = population.iter().choose_multiple(rng, 2);
    let first = candidates[0];
    let second = candidates[1];

    if second.fitness() > first.fitness() {
        Some(second)
    } else {
        Some(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{problem::vehicle::VehicleIdx, test_utils::MockRng};

    fn with_fitness(fitness: f64) -> Individual {
        let mut individual = Individual::new(vec![VehicleIdx::new(0)]);
        individual.set_fitness(fitness);
        individual
    }

    #[test]
    fn test_keeps_fitter_candidate() {
        let population = vec![with_fitness(1.0), with_fitness(5.0), with_fitness(3.0)];
        let mut rng = MockRng::new(vec![0, u64::MAX / 2, u64::MAX]);

        for _ in 0..10 {
            let selected = select_tournament(&population, &mut rng).unwrap();
            // The weakest individual can never win a tournament of two distinct candidates
            assert!(selected.fitness() > 1.0);
        }
    }

    #[test]
    fn test_small_populations() {
        let mut rng = MockRng::new(vec![0]);

        assert!(select_tournament(&[], &mut rng).is_none());
        let single = vec![with_fitness(2.0)];
        assert_eq!(
            select_tournament(&single, &mut rng).unwrap().fitness(),
            2.0
        );
    }
}
