use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct GeneticParams {
    pub population_size: usize,
    pub generations: usize,
    /// Individuals carried over unchanged to the next generation
    pub elite_size: usize,
    /// Per package probability of moving to a random vehicle
    pub mutation_rate: f64,
    pub seed: Option<u64>,
    pub threads: Threads,
}

impl Default for GeneticParams {
    fn default() -> Self {
        GeneticParams {
            population_size: 100,
            generations: 50,
            elite_size: 10,
            mutation_rate: 0.1,
            seed: None,
            threads: Threads::Auto,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Threads {
    Single,
    #[default]
    Auto,
    Multi(usize),
}

impl Threads {
    pub fn number_of_threads(&self) -> usize {
        match self {
            Threads::Single => 1,
            Threads::Multi(num) => (*num).max(1),
            Threads::Auto => std::thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}
