use std::path::PathBuf;

use clap::{Args, Subcommand};
use courier_graph::{error::GraphError, node::NodeIdx};
use courier_optimizer::{
    error::PlanningError,
    problem::network_state::NetworkState,
    solver::{
        planning_context::PlanningContext,
        recovery::failure_recovery::{handle_edge_failure, handle_node_failure},
        routing::{
            route_engine::{apply_route, plan_route},
            route_params::RouteParams,
        },
    },
};
use tracing::{info, warn};

use crate::{
    file_utils::{read_state, write_state},
    tables::{fleet_table, recovery_table},
};

#[derive(Args)]
pub struct RecoverArgs {
    /// The state file holding the current assignments
    #[arg(short, long, env = "COURIER_STATE")]
    input: PathBuf,

    /// Where to write the recovered state, stdout when missing
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Minute of the horizon at which vehicles leave again
    #[arg(long, default_value_t = 0.0)]
    start_minute: f64,
}

#[derive(Subcommand)]
pub enum RecoverSubcommands {
    /// A node became unavailable
    Node {
        #[arg(short, long)]
        node: usize,

        #[command(flatten)]
        args: RecoverArgs,
    },
    /// A road became unusable
    Edge {
        #[arg(long)]
        src: usize,

        #[arg(long)]
        dest: usize,

        #[command(flatten)]
        args: RecoverArgs,
    },
}

enum Failure {
    Node(NodeIdx),
    Edge(NodeIdx, NodeIdx),
}

/// Routes are not part of state files, they are rebuilt from the assignments before the
/// failure is applied.
fn rebuild_routes(
    state: &mut NetworkState,
    start_minute: f64,
    params: &RouteParams,
    context: &mut PlanningContext,
) -> Result<(), PlanningError> {
    for vehicle in state.vehicle_indices() {
        if state.assigned_packages(vehicle)?.is_empty() {
            continue;
        }

        match plan_route(state, vehicle, start_minute, params, context) {
            Ok(route) => apply_route(state, route)?,
            Err(PlanningError::Graph(GraphError::NoPath { from, to })) => {
                warn!("Vehicle {vehicle} has no route from {from} to {to}");
            }
            Err(error) => return Err(error),
        }
    }

    Ok(())
}

pub fn run(commands: RecoverSubcommands) -> Result<(), anyhow::Error> {
    let params = RouteParams::default();
    let mut context = PlanningContext::default();

    let (args, failure) = match commands {
        RecoverSubcommands::Node { node, args } => (args, Failure::Node(NodeIdx::new(node))),
        RecoverSubcommands::Edge { src, dest, args } => {
            (args, Failure::Edge(NodeIdx::new(src), NodeIdx::new(dest)))
        }
    };

    let mut state = read_state(&args.input)?;
    rebuild_routes(&mut state, args.start_minute, &params, &mut context)?;

    let report = match failure {
        Failure::Node(node) => match handle_node_failure(
            &mut state,
            node,
            args.start_minute,
            &params,
            &mut context,
        ) {
            Ok(report) => Some(report),
            Err(PlanningError::NoSubstituteNode {
                node_type,
                affected,
                ..
            }) => {
                warn!(
                    "No {node_type} can replace node {node}, {} packages stay unassigned",
                    affected.len()
                );
                None
            }
            Err(error) => return Err(error.into()),
        },
        Failure::Edge(src, dest) => {
            let (removed, report) = handle_edge_failure(
                &mut state,
                src,
                dest,
                args.start_minute,
                &params,
                &mut context,
            )?;
            if removed.is_none() {
                warn!("No road from {src} to {dest}");
            }
            Some(report)
        }
    };

    if let Some(report) = &report {
        println!("{}", recovery_table(report));
    }
    println!("{}", fleet_table(&state));
    info!("Recovered in {}", context.elapsed());

    write_state(&state, args.output.as_deref())
}
