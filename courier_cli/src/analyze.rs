use std::path::PathBuf;

use clap::Args;
use comfy_table::Table;
use courier_graph::{
    algorithms::{
        bellman_ford::bellman_ford, components::connected_components, cycle::has_cycle,
        dijkstra::shortest_path, floyd_warshall::floyd_warshall,
        nearest_neighbor::nearest_neighbor_tour, traversal::is_accessible,
    },
    error::GraphError,
    node::NodeIdx,
    weighting::{CostWeighting, DistanceWeighting},
};
use courier_optimizer::{json::export::export_network_state, problem::network_state::NetworkState};
use tracing::{info, warn};

use crate::{file_utils::read_state, tables::statistics_table};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// The state file to analyze
    #[arg(short, long, env = "COURIER_STATE")]
    input: PathBuf,

    /// Source node of a shortest path query
    #[arg(long, requires = "to")]
    from: Option<usize>,

    /// Target node of a shortest path query
    #[arg(long, requires = "from")]
    to: Option<usize>,

    /// Builds a nearest-neighbor tour from the depot
    #[arg(long)]
    tour: bool,

    /// Prints every node with its outgoing roads
    #[arg(long)]
    print_graph: bool,
}

fn summary_table(state: &NetworkState) -> Table {
    let graph = state.graph();
    let distances = floyd_warshall(graph);
    let longest = (0..graph.node_count())
        .flat_map(|from| distances.row(NodeIdx::new(from)).iter().copied())
        .filter(|distance| distance.is_finite())
        .fold(0.0_f64, f64::max);
    let negative_cycle = matches!(
        bellman_ford(graph, state.depot(), &CostWeighting),
        Err(GraphError::NegativeCycleDetected)
    );
    let charging_stations = graph.nodes().filter(|(_, node)| node.can_charge()).count();
    let unavailable = graph.nodes().filter(|(_, node)| !node.is_available()).count();

    let mut table = Table::new();
    table.set_header(vec!["Network", "Value"]);
    for (label, value) in [
        ("Nodes", graph.node_count().to_string()),
        ("Roads", graph.edge_count().to_string()),
        ("Depot", state.depot().to_string()),
        ("Unavailable nodes", unavailable.to_string()),
        ("Charging stations", charging_stations.to_string()),
        ("Has cycle", has_cycle(graph).to_string()),
        ("Components", connected_components(graph).count().to_string()),
        ("Negative cost cycle", negative_cycle.to_string()),
        ("Longest shortest distance (km)", format!("{longest:.1}")),
    ] {
        table.add_row(vec![label.to_owned(), value]);
    }
    table
}

pub fn run(args: AnalyzeArgs) -> Result<(), anyhow::Error> {
    let state = read_state(&args.input)?;
    let graph = state.graph();

    if args.print_graph {
        println!("{graph}");
    }
    println!("{}", summary_table(&state));
    println!("{}", statistics_table(&export_network_state(&state).statistics));

    if let (Some(from), Some(to)) = (args.from, args.to) {
        let (from, to) = (NodeIdx::new(from), NodeIdx::new(to));
        if is_accessible(graph, from, to)? {
            let (path, distance) = shortest_path(graph, from, to, &DistanceWeighting)?;
            let path = path
                .iter()
                .map(|node| node.to_string())
                .collect::<Vec<_>>()
                .join(" -> ");
            info!("Shortest path {from} -> {to}: {path} ({distance:.1} km)");
        } else {
            warn!("Node {to} is not reachable from node {from}");
        }
    }

    if args.tour {
        match nearest_neighbor_tour(graph, state.depot()) {
            Ok(tour) => info!(
                "Nearest-neighbor tour: {} nodes, {:.1} km",
                tour.nodes().len(),
                tour.total_distance()
            ),
            Err(error @ GraphError::GraphDisconnected { .. }) => warn!("No tour: {error}"),
            Err(error) => return Err(error.into()),
        }
    }

    Ok(())
}
