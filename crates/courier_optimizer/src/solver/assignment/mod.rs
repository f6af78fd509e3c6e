pub mod greedy_assignment;
pub mod loading;
