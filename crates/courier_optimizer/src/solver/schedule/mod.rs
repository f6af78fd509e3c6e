pub mod scheduler;
pub mod scheduler_params;
