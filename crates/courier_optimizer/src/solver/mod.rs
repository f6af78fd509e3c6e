pub mod assignment;
pub mod genetic;
pub mod planning_context;
pub mod recovery;
pub mod routing;
pub mod schedule;
pub mod statistics;
