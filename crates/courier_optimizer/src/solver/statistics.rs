use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::problem::network_state::NetworkState;

/// Summary of the delivery progress of a state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct NetworkStatistics {
    pub delivered_packages: usize,
    /// Available vehicles holding packages or a route
    pub active_vehicles: usize,
    /// Mean minutes between the opening of the window and the drop of delivered packages
    #[serde(alias = "avg_delivery_time")]
    pub average_delivery_time: f64,
    /// Share of delivered packages, in percent
    pub network_efficiency: f64,
}

impl NetworkStatistics {
    pub fn compute(state: &NetworkState) -> Self {
        let delivered_packages = state.delivered_count();

        let active_vehicles = state
            .vehicle_indices()
            .filter(|&vehicle| {
                let vehicle_ref = &state.vehicles()[vehicle];
                let busy = state
                    .assigned_packages(vehicle)
                    .is_ok_and(|packages| !packages.is_empty())
                    || state.route(vehicle).is_ok_and(|route| route.is_some());
                vehicle_ref.is_available() && busy
            })
            .count();

        let delivery_times = state
            .packages()
            .iter()
            .filter_map(|package| {
                package
                    .delivered_at()
                    .map(|minute| (minute - package.window().start).max(0.0))
            })
            .collect::<Vec<_>>();
        let average_delivery_time = if delivery_times.is_empty() {
            0.0
        } else {
            delivery_times.iter().sum::<f64>() / delivery_times.len() as f64
        };

        let network_efficiency = if state.packages().is_empty() {
            0.0
        } else {
            delivered_packages as f64 * 100.0 / state.packages().len() as f64
        };

        NetworkStatistics {
            delivered_packages,
            active_vehicles,
            average_delivery_time,
            network_efficiency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        problem::{package::PackageIdx, vehicle::VehicleIdx},
        test_utils::create_windowed_state,
    };

    #[test]
    fn test_statistics() {
        let mut state = create_windowed_state(&[(60.0, 600.0), (100.0, 900.0)]);
        state
            .assign_package(PackageIdx::new(0), VehicleIdx::new(0))
            .unwrap();
        state.mark_delivered(PackageIdx::new(0), 90.0).unwrap();

        let statistics = NetworkStatistics::compute(&state);

        assert_eq!(statistics.delivered_packages, 1);
        assert_eq!(statistics.active_vehicles, 1);
        assert_eq!(statistics.average_delivery_time, 30.0);
        assert_eq!(statistics.network_efficiency, 50.0);
    }

    #[test]
    fn test_empty_state() {
        let state = create_windowed_state(&[]);

        assert_eq!(NetworkStatistics::compute(&state), NetworkStatistics::default());
    }
}
