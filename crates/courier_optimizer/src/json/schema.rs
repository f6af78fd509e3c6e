use schemars::schema_for;

use crate::{json::types, solver::schedule::scheduler_params::SchedulerParams};

pub fn generate_json_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schema_for!(types::JsonNetworkState))
}

pub fn generate_params_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schema_for!(SchedulerParams))
}
