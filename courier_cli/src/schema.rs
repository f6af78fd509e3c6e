use std::path::PathBuf;

use clap::Args;
use courier_optimizer::json::schema::{generate_json_schema, generate_params_schema};
use tracing::info;

#[derive(Args)]
pub struct SchemaArgs {
    /// Print the planning parameters schema instead of the state file schema
    #[arg(long)]
    params: bool,

    #[arg(short, long)]
    output: Option<PathBuf>,
}

pub fn run(args: SchemaArgs) -> Result<(), anyhow::Error> {
    let schema = if args.params {
        generate_params_schema()?
    } else {
        generate_json_schema()?
    };

    match args.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            std::fs::write(&path, schema)?;
            info!("Schema written to {}", path.display());
        }
        None => println!("{schema}"),
    }

    Ok(())
}
