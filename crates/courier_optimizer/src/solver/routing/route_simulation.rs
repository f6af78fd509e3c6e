use std::rc::Rc;

use courier_graph::{
    algorithms::dijkstra::{nearest_matching, shortest_path},
    edge::EdgeAttributes,
    error::GraphError,
    network_graph::NetworkGraph,
    node::{NodeIdx, NodeType},
    weighting::{DistanceWeighting, TimeWeighting, Weight, Weighting},
};
use fxhash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::{
    error::{PlanningError, RouteViolation},
    problem::{
        network_state::NetworkState,
        package::Package,
        vehicle::{Vehicle, VehicleIdx},
    },
};

use super::{
    route::{PlannedStop, Route, RouteStop, StopKind},
    route_params::RouteParams,
};

const ENERGY_EPSILON: f64 = 1e-9;

/// Energy a vehicle consumes on an edge.
#[derive(Debug, Clone, Copy)]
pub struct EnergyWeighting {
    consumption_rate: f64,
}

impl EnergyWeighting {
    pub fn new(consumption_rate: f64) -> Self {
        EnergyWeighting { consumption_rate }
    }
}

impl Weighting for EnergyWeighting {
    fn weight(&self, edge: &EdgeAttributes) -> Weight {
        edge.energy(self.consumption_rate)
    }
}

#[derive(Debug, Clone)]
struct Hop {
    to: NodeIdx,
    attributes: EdgeAttributes,
}

/// Lowest weight edge between two adjacent nodes, the first in traversal order on ties.
fn lightest_edge<'g, W: Weighting>(
    graph: &'g NetworkGraph,
    from: NodeIdx,
    to: NodeIdx,
    weighting: &W,
) -> Result<Option<&'g EdgeAttributes>, GraphError> {
    Ok(graph
        .neighbors(from)?
        .filter(|edge| edge.dest() == to)
        .map(|edge| edge.attributes())
        .min_by(|a, b| weighting.weight(a).total_cmp(&weighting.weight(b))))
}

fn path_hops<W: Weighting>(
    graph: &NetworkGraph,
    path: &[NodeIdx],
    weighting: &W,
) -> Result<Vec<Hop>, GraphError> {
    path.windows(2)
        .map(|pair| {
            let attributes = lightest_edge(graph, pair[0], pair[1], weighting)?.ok_or(
                GraphError::NoPath {
                    from: pair[0],
                    to: pair[1],
                },
            )?;
            Ok(Hop {
                to: pair[1],
                attributes: attributes.clone(),
            })
        })
        .collect()
}

/// Position and resources of the vehicle while a sequence is simulated.
struct Traversal {
    node: NodeIdx,
    time: f64,
    cost: f64,
    distance: f64,
    battery: f64,
    driving_time: f64,
    nodes: Vec<NodeIdx>,
    stops: Vec<RouteStop>,
    violations: Vec<RouteViolation>,
}

/// Simulates visiting sequences for one vehicle.
///
/// Legs between stops use the first direct edge when one exists and the distance shortest
/// path otherwise. Charging stations and rest areas are inserted when the battery or the
/// driving limit requires it. Legs are cached, so a simulator is meant to be reused across the
/// candidates of a local search.
pub struct RouteSimulator<'a> {
    graph: &'a NetworkGraph,
    packages: &'a [Package],
    vehicle: &'a Vehicle,
    vehicle_idx: VehicleIdx,
    params: &'a RouteParams,
    legs: FxHashMap<(NodeIdx, NodeIdx), Rc<[Hop]>>,
}

impl<'a> RouteSimulator<'a> {
    pub fn new(
        state: &'a NetworkState,
        vehicle: VehicleIdx,
        params: &'a RouteParams,
    ) -> Result<Self, PlanningError> {
        Ok(RouteSimulator {
            graph: state.graph(),
            packages: state.packages(),
            vehicle: state.vehicle(vehicle)?,
            vehicle_idx: vehicle,
            params,
            legs: FxHashMap::default(),
        })
    }

    pub fn vehicle(&self) -> &Vehicle {
        self.vehicle
    }

    /// Simulates `stops`, the first of which is where the vehicle departs from at
    /// `start_minute`. Fails only when two consecutive stops are not connected.
    pub fn simulate(
        &mut self,
        stops: &[PlannedStop],
        start_minute: f64,
    ) -> Result<Route, GraphError> {
        let Some(first) = stops.first() else {
            return Ok(self.empty_route(start_minute));
        };
        self.graph.check_node(first.node)?;

        let mut traversal = Traversal {
            node: first.node,
            time: 0.0,
            cost: 0.0,
            distance: 0.0,
            battery: self.vehicle.current_battery(),
            driving_time: self.vehicle.driving_time(),
            nodes: vec![first.node],
            stops: vec![],
            violations: vec![],
        };
        traversal.stops.push(RouteStop {
            node: first.node,
            kind: first.kind,
            arrival: start_minute,
            battery: traversal.battery,
        });

        for stop in &stops[1..] {
            self.travel(&mut traversal, stop.node, start_minute)?;
            self.visit(&mut traversal, stop, start_minute)?;
        }

        Ok(Route {
            vehicle: self.vehicle_idx,
            start_minute,
            stops: traversal.stops,
            nodes: traversal.nodes,
            total_time: traversal.time,
            total_cost: traversal.cost,
            total_distance: traversal.distance,
            violations: traversal.violations,
            final_battery: traversal.battery,
            final_driving_time: traversal.driving_time,
        })
    }

    fn empty_route(&self, start_minute: f64) -> Route {
        Route {
            vehicle: self.vehicle_idx,
            start_minute,
            stops: vec![],
            nodes: vec![],
            total_time: 0.0,
            total_cost: 0.0,
            total_distance: 0.0,
            violations: vec![],
            final_battery: self.vehicle.current_battery(),
            final_driving_time: self.vehicle.driving_time(),
        }
    }

    fn visit(
        &self,
        traversal: &mut Traversal,
        stop: &PlannedStop,
        start_minute: f64,
    ) -> Result<(), GraphError> {
        let mut arrival = start_minute + traversal.time * 60.0;

        if let StopKind::Delivery(package) = stop.kind {
            let window = self.packages[package].window();
            if arrival < window.start {
                traversal.time += (window.start - arrival) / 60.0;
                arrival = window.start;
            } else if arrival > window.end {
                debug!(
                    package = package.get(),
                    arrival,
                    window_end = window.end,
                    "Delivery window missed"
                );
                traversal.violations.push(RouteViolation::TimeWindowMissed {
                    package,
                    arrival,
                    window_end: window.end,
                });
            }
        }

        traversal.stops.push(RouteStop {
            node: stop.node,
            kind: stop.kind,
            arrival,
            battery: traversal.battery,
        });

        if stop.kind.package().is_some() {
            traversal.time += self.graph.node(stop.node)?.service_time() / 60.0;
        }

        Ok(())
    }

    fn leg(&mut self, from: NodeIdx, to: NodeIdx) -> Result<Rc<[Hop]>, GraphError> {
        if let Some(hops) = self.legs.get(&(from, to)) {
            return Ok(Rc::clone(hops));
        }

        let hops: Rc<[Hop]> = if from == to {
            Rc::from(vec![])
        } else if !self.graph.node(to)?.is_available() {
            return Err(GraphError::NoPath { from, to });
        } else if let Some(attributes) = self.graph.first_edge(from, to)? {
            Rc::from(vec![Hop {
                to,
                attributes: attributes.clone(),
            }])
        } else {
            let (path, _) = shortest_path(self.graph, from, to, &DistanceWeighting)?;
            Rc::from(path_hops(self.graph, &path, &DistanceWeighting)?)
        };

        self.legs.insert((from, to), Rc::clone(&hops));
        Ok(hops)
    }

    /// Drives from the current node to `target`, detouring to charge or rest when needed.
    fn travel(
        &mut self,
        traversal: &mut Traversal,
        target: NodeIdx,
        start_minute: f64,
    ) -> Result<(), GraphError> {
        let mut used_stations = FxHashSet::default();
        let mut used_rest_areas = FxHashSet::default();
        let max_driving_time = self.vehicle.max_driving_time();

        'leg: loop {
            let hops = self.leg(traversal.node, target)?;
            for hop in hops.iter() {
                let energy = hop.attributes.energy(self.vehicle.consumption_rate());
                if energy > traversal.battery + ENERGY_EPSILON
                    && self.charge(traversal, energy, start_minute, &mut used_stations)?
                {
                    continue 'leg;
                }

                let hop_time = hop.attributes.travel_time(&self.params.conditions);
                if traversal.driving_time > 0.0
                    && traversal.driving_time + hop_time > max_driving_time
                    && self.rest(traversal, start_minute, &mut used_rest_areas)?
                {
                    continue 'leg;
                }

                self.drive(traversal, hop);
            }

            return Ok(());
        }
    }

    fn drive(&self, traversal: &mut Traversal, hop: &Hop) {
        let attributes = &hop.attributes;
        let hop_time = attributes.travel_time(&self.params.conditions);

        traversal.battery =
            (traversal.battery - attributes.energy(self.vehicle.consumption_rate())).max(0.0);
        traversal.time += hop_time;
        traversal.driving_time += hop_time;
        traversal.cost += attributes.travel_cost(&self.params.conditions)
            + attributes.distance * self.vehicle.cost_per_km();
        traversal.distance += attributes.distance;
        traversal.node = hop.to;
        traversal.nodes.push(hop.to);
    }

    /// Drives the hops of a detour. There is no break on the way, so overrunning the driving
    /// limit is recorded once per detour.
    fn drive_detour(&self, traversal: &mut Traversal, hops: &[Hop]) {
        let max_driving_time = self.vehicle.max_driving_time();
        let mut exceeded = false;

        for hop in hops {
            self.drive(traversal, hop);
            if !exceeded && traversal.driving_time > max_driving_time {
                exceeded = true;
                debug!(
                    vehicle = self.vehicle_idx.get(),
                    at = hop.to.get(),
                    driving_time = traversal.driving_time,
                    "Driving limit exceeded on a detour"
                );
                traversal.violations.push(RouteViolation::DrivingLimitExceeded {
                    at: hop.to,
                    driving_time: traversal.driving_time,
                });
            }
        }
    }

    /// Drives to the closest charging station reachable on the remaining battery and charges
    /// to full. Returns false and records a violation when there is none.
    fn charge(
        &mut self,
        traversal: &mut Traversal,
        required_energy: f64,
        start_minute: f64,
        used_stations: &mut FxHashSet<NodeIdx>,
    ) -> Result<bool, GraphError> {
        let battery_capacity = self.vehicle.battery_capacity();
        let weighting = EnergyWeighting::new(self.vehicle.consumption_rate());

        let station = if traversal.battery + ENERGY_EPSILON >= battery_capacity {
            None
        } else {
            nearest_matching(self.graph, traversal.node, &weighting, |node, attributes| {
                attributes.can_charge() && !used_stations.contains(&node)
            })?
            .filter(|(_, _, energy)| *energy <= traversal.battery + ENERGY_EPSILON)
        };

        let Some((station, path, _)) = station else {
            debug!(
                vehicle = self.vehicle_idx.get(),
                at = traversal.node.get(),
                required_energy,
                battery = traversal.battery,
                "No reachable charging station"
            );
            traversal.violations.push(RouteViolation::NoFeasibleStation {
                at: traversal.node,
                required_energy,
                battery: traversal.battery,
            });
            return Ok(false);
        };

        let hops = path_hops(self.graph, &path, &weighting)?;
        self.drive_detour(traversal, &hops);

        traversal.stops.push(RouteStop {
            node: station,
            kind: StopKind::Charging,
            arrival: start_minute + traversal.time * 60.0,
            battery: traversal.battery,
        });
        if self.vehicle.charging_rate() > 0.0 {
            traversal.time += (battery_capacity - traversal.battery) / self.vehicle.charging_rate();
        }
        traversal.battery = battery_capacity;
        used_stations.insert(station);

        Ok(true)
    }

    /// Drives to the closest rest area by travel time and takes a break. Returns false and
    /// records a violation when no rest area is reachable on the remaining battery.
    fn rest(
        &mut self,
        traversal: &mut Traversal,
        start_minute: f64,
        used_rest_areas: &mut FxHashSet<NodeIdx>,
    ) -> Result<bool, GraphError> {
        let weighting = TimeWeighting::new(self.params.conditions);
        let consumption_rate = self.vehicle.consumption_rate();

        let found = nearest_matching(self.graph, traversal.node, &weighting, |node, attributes| {
            attributes.node_type() == NodeType::RestArea && !used_rest_areas.contains(&node)
        })?;

        let reachable = match found {
            Some((rest_area, path, _)) => {
                let hops = path_hops(self.graph, &path, &weighting)?;
                let energy: f64 = hops
                    .iter()
                    .map(|hop| hop.attributes.energy(consumption_rate))
                    .sum();
                (energy <= traversal.battery + ENERGY_EPSILON).then_some((rest_area, hops))
            }
            None => None,
        };

        let Some((rest_area, hops)) = reachable else {
            debug!(
                vehicle = self.vehicle_idx.get(),
                at = traversal.node.get(),
                driving_time = traversal.driving_time,
                "No reachable rest area"
            );
            traversal.violations.push(RouteViolation::NoFeasibleRestArea {
                at: traversal.node,
                driving_time: traversal.driving_time,
            });
            return Ok(false);
        };

        self.drive_detour(traversal, &hops);

        traversal.stops.push(RouteStop {
            node: rest_area,
            kind: StopKind::Rest,
            arrival: start_minute + traversal.time * 60.0,
            battery: traversal.battery,
        });
        traversal.time += self.params.break_duration;
        traversal.driving_time = 0.0;
        used_rest_areas.insert(rest_area);

        Ok(true)
    }
}
