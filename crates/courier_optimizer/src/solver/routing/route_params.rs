use courier_graph::edge::TravelConditions;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RouteParams {
    /// Break taken at a rest area once the driving limit is reached, in hours
    pub break_duration: f64,
    /// Whether routes end back at the depot
    pub return_to_depot: bool,
    pub max_two_opt_passes: usize,
    pub conditions: TravelConditions,
}

impl Default for RouteParams {
    fn default() -> Self {
        RouteParams {
            break_duration: 0.75,
            return_to_depot: true,
            max_two_opt_passes: 100,
            conditions: TravelConditions::default(),
        }
    }
}
