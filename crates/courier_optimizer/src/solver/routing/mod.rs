pub mod route;
pub mod route_engine;
pub mod route_params;
pub mod route_simulation;
pub mod two_opt;
