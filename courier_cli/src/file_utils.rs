use std::{
    fs::{self, File},
    io::BufReader,
    path::Path,
};

use courier_optimizer::{
    json::{export::export_to_string, import::import_network_state, types::JsonNetworkState},
    problem::network_state::NetworkState,
};
use tracing::info;

pub fn read_state(path: &Path) -> Result<NetworkState, anyhow::Error> {
    let file = File::open(path)?;
    let json: JsonNetworkState = serde_json::from_reader(BufReader::new(file))?;
    let state = import_network_state(&json)?;

    info!(
        "Loaded {:?}: nodes = {}, vehicles = {}, packages = {}",
        path,
        state.graph().node_count(),
        state.vehicles().len(),
        state.packages().len()
    );
    Ok(state)
}

/// Writes the exported state to `path`, or to stdout when no path is given.
pub fn write_state(state: &NetworkState, path: Option<&Path>) -> Result<(), anyhow::Error> {
    let content = export_to_string(state)?;
    match path {
        Some(path) => {
            fs::write(path, content)?;
            info!("Wrote {:?}", path);
        }
        None => println!("{content}"),
    }

    Ok(())
}
