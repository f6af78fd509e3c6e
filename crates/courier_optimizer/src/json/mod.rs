pub mod export;
pub mod import;
pub mod schema;
pub mod types;
