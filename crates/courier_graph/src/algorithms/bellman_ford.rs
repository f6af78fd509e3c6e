use tracing::{debug, instrument};

use crate::{
    error::GraphError, network_graph::NetworkGraph, node::NodeIdx, weighting::Weighting,
};

use super::shortest_paths::ShortestPaths;

/// Single-source shortest paths allowing negative weights.
///
/// Relaxes every edge `V - 1` times. If any edge still relaxes on the extra pass, a negative
/// cycle is reachable from `source` and no distances are returned.
#[instrument(skip_all, level = "debug")]
pub fn bellman_ford<W>(
    graph: &NetworkGraph,
    source: NodeIdx,
    weighting: &W,
) -> Result<ShortestPaths, GraphError>
where
    W: Weighting,
{
    graph.check_node(source)?;

    let node_count = graph.node_count();
    let mut paths = ShortestPaths::new(source, node_count);

    for pass in 1..node_count {
        let mut changed = false;
        for (from, edge) in graph.edges() {
            if paths.distance(from).is_some() {
                changed |= paths.relax(from, edge.dest(), weighting.weight(edge.attributes()));
            }
        }

        if !changed {
            debug!(pass, "Bellman-Ford converged early");
            break;
        }
    }

    for (from, edge) in graph.edges() {
        if let Some(distance) = paths.distance(from) {
            let candidate = distance + weighting.weight(edge.attributes());
            if candidate < paths.distances()[edge.dest().get()] {
                return Err(GraphError::NegativeCycleDetected);
            }
        }
    }

    Ok(paths)
}
