use crate::edge::{EdgeAttributes, TravelConditions};

pub type Weight = f64;

/// Turns edge attributes into the scalar weight minimized by the shortest path searches.
pub trait Weighting {
    fn weight(&self, edge: &EdgeAttributes) -> Weight;
}

/// Edge distance in kilometers.
#[derive(Debug, Default, Clone, Copy)]
pub struct DistanceWeighting;

impl Weighting for DistanceWeighting {
    fn weight(&self, edge: &EdgeAttributes) -> Weight {
        edge.distance
    }
}

/// Effective travel time in hours under the given conditions.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeWeighting {
    conditions: TravelConditions,
}

impl TimeWeighting {
    pub fn new(conditions: TravelConditions) -> Self {
        TimeWeighting { conditions }
    }
}

impl Weighting for TimeWeighting {
    fn weight(&self, edge: &EdgeAttributes) -> Weight {
        edge.travel_time(&self.conditions)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CostWeighting;

impl Weighting for CostWeighting {
    fn weight(&self, edge: &EdgeAttributes) -> Weight {
        edge.cost
    }
}
