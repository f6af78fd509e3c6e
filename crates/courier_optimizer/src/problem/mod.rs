pub mod network_state;
pub mod package;
pub mod vehicle;
