use courier_graph::node::NodeIdx;
use tracing::instrument;

use crate::{problem::network_state::NetworkState, solver::statistics::NetworkStatistics};

use super::types::{
    FromNetworkState, JsonEdge, JsonNetwork, JsonNetworkState, JsonNode, JsonPackage, JsonVehicle,
};

/// Owned snapshot of `state`, detached from any later mutation.
#[instrument(skip_all, level = "debug")]
pub fn export_network_state(state: &NetworkState) -> JsonNetworkState {
    let graph = state.graph();

    JsonNetworkState {
        vehicles: state
            .vehicle_indices()
            .zip(state.vehicles())
            .map(|vehicle| JsonVehicle::from_network_state(vehicle, state))
            .collect(),
        packages: state
            .package_indices()
            .zip(state.packages())
            .map(|package| JsonPackage::from_network_state(package, state))
            .collect(),
        network: JsonNetwork {
            nodes: (0..graph.node_count())
                .map(|node| JsonNode::from_network_state(NodeIdx::new(node), state))
                .collect(),
            edges: graph
                .edges_in_insertion_order()
                .map(|edge| JsonEdge::from_network_state(edge, state))
                .collect(),
        },
        statistics: NetworkStatistics::compute(state),
    }
}

pub fn export_to_string(state: &NetworkState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&export_network_state(state))
}

#[cfg(test)]
mod tests {
    use courier_graph::node::NodeType;

    use super::*;
    use crate::{
        json::types::JsonVehicleStatus,
        problem::{package::PackageIdx, vehicle::VehicleIdx},
        test_utils::create_line_state,
    };

    #[test]
    fn test_export_shape() {
        let mut state = create_line_state(3, &[500.0, 800.0], &[(0, 2, 40.0)]).unwrap();
        state
            .assign_package(PackageIdx::new(0), VehicleIdx::new(1))
            .unwrap();

        let json = export_network_state(&state);

        assert_eq!(json.vehicles.len(), 2);
        assert_eq!(json.vehicles[0].status, JsonVehicleStatus::Idle);
        assert_eq!(json.vehicles[1].status, JsonVehicleStatus::Active);
        assert_eq!(json.vehicles[1].packages, vec![0]);
        assert_eq!(json.packages[0].assigned_vehicle, Some(1));
        assert_eq!(json.packages[0].window_end, None);

        let depot = &json.network.nodes[0];
        assert_eq!(depot.node_type, NodeType::Depot);
        assert!(depot.capacity.is_some());
        assert_eq!(depot.demand, None);
        assert_eq!(json.network.nodes[2].current_demand, Some(40.0));
        // Two way roads between consecutive nodes
        assert_eq!(json.network.edges.len(), 4);
        assert_eq!(
            (json.network.edges[0].source, json.network.edges[0].target),
            (0, 1)
        );
        assert_eq!(json.statistics.active_vehicles, 1);
    }

    #[test]
    fn test_unassigned_written_as_minus_one() {
        let state = create_line_state(2, &[500.0], &[(0, 1, 10.0)]).unwrap();

        let text = export_to_string(&state).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["packages"][0]["assigned_vehicle"], -1);
        assert_eq!(value["network"]["nodes"][0]["type"], "depot");
    }
}
