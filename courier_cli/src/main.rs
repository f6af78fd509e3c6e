use clap::{Parser, Subcommand};

use mimalloc::MiMalloc;

use crate::{
    analyze::AnalyzeArgs,
    plan::PlanArgs,
    recover::RecoverSubcommands,
    schema::SchemaArgs,
};

mod analyze;
mod file_utils;
mod parsers;
mod plan;
mod recover;
mod schema;
mod tables;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long, env = "COURIER_DEBUG")]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints structural facts about the network of a state file
    #[command(visible_alias = "a")]
    Analyze {
        #[command(flatten)]
        args: AnalyzeArgs,
    },
    /// Assigns and routes the undelivered packages of a state file
    #[command(visible_alias = "p")]
    Plan {
        #[command(flatten)]
        args: PlanArgs,
    },
    /// Recovers from a node or road failure
    #[command(visible_alias = "r")]
    Recover {
        #[command(subcommand)]
        commands: RecoverSubcommands,
    },
    /// Prints the JSON schema of the state file or of the planning parameters
    Schema {
        #[command(flatten)]
        args: SchemaArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Analyze { args }) => analyze::run(args)?,
        Some(Commands::Plan { args }) => plan::run(args)?,
        Some(Commands::Recover { commands }) => recover::run(commands)?,
        Some(Commands::Schema { args }) => schema::run(args)?,
        None => {}
    }

    Ok(())
}
