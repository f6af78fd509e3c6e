pub mod algorithms;
pub mod edge;
pub mod error;
pub mod network_graph;
pub mod node;
mod newtype_index;
pub mod weighting;

#[cfg(test)]
pub(crate) mod test_graph_utils;
