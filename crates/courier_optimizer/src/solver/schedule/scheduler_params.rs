use courier_graph::node::MINUTES_PER_DAY;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::solver::{genetic::genetic_params::GeneticParams, routing::route_params::RouteParams};

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    #[default]
    Greedy,
    /// Genetic search, falling back to the greedy assignment when the best individual is not
    /// feasible
    Genetic(GeneticParams),
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SchedulerParams {
    pub strategy: AssignmentStrategy,
    pub route: RouteParams,
    /// Length of a planning day in minutes
    pub day_length: f64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        SchedulerParams {
            strategy: AssignmentStrategy::default(),
            route: RouteParams::default(),
            day_length: MINUTES_PER_DAY,
        }
    }
}
