pub mod fitness;
pub mod genetic_optimizer;
pub mod genetic_params;
pub mod individual;
pub mod select_tournament;
