use serde::Serialize;

use crate::problem::vehicle::VehicleIdx;

/// Vehicle of every considered package, in consideration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Individual {
    assignments: Vec<VehicleIdx>,
    fitness: f64,
}

impl Individual {
    pub fn new(assignments: Vec<VehicleIdx>) -> Self {
        Individual {
            assignments,
            fitness: 0.0,
        }
    }

    pub fn assignments(&self) -> &[VehicleIdx] {
        &self.assignments
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub(crate) fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    pub(crate) fn assignments_mut(&mut self) -> &mut [VehicleIdx] {
        &mut self.assignments
    }

    /// Single point crossover: genes before `point` come from `self`, the rest from `other`.
    pub fn crossover(&self, other: &Individual, point: usize) -> (Individual, Individual) {
        let point = point.min(self.assignments.len());
        let mut first = self.assignments[..point].to_vec();
        first.extend_from_slice(&other.assignments[point..]);
        let mut second = other.assignments[..point].to_vec();
        second.extend_from_slice(&self.assignments[point..]);

        (Individual::new(first), Individual::new(second))
    }
}
