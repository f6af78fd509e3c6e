use courier_graph::{define_index_newtype, node::NodeIdx};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::vehicle::{Load, VehicleIdx};

define_index_newtype!(PackageIdx, Package);

/// Delivery window in minutes since the start of the planning horizon.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq)]
pub struct DeliveryWindow {
    pub start: f64,
    pub end: f64,
}

impl Default for DeliveryWindow {
    fn default() -> Self {
        DeliveryWindow {
            start: 0.0,
            end: f64::INFINITY,
        }
    }
}

impl DeliveryWindow {
    pub fn new(start: f64, end: f64) -> Self {
        DeliveryWindow { start, end }
    }

    pub fn contains(&self, minute: f64) -> bool {
        minute >= self.start && minute <= self.end
    }

    /// Whether the window intersects `[from, to)`.
    pub fn overlaps(&self, from: f64, to: f64) -> bool {
        self.start < to && self.end >= from
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackageStatus {
    #[default]
    #[serde(alias = "assigned", alias = "in_transit")]
    Pending,
    Delivered,
}

#[derive(Serialize, Debug, Clone)]
pub struct Package {
    external_id: String,
    source: NodeIdx,
    destination: NodeIdx,
    weight: f64,
    volume: f64,
    priority: f64,
    window: DeliveryWindow,
    assigned_vehicle: Option<VehicleIdx>,
    status: PackageStatus,
    /// Minute the package was dropped at its destination
    delivered_at: Option<f64>,
}

impl Package {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn source(&self) -> NodeIdx {
        self.source
    }

    pub fn destination(&self) -> NodeIdx {
        self.destination
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn load(&self) -> Load {
        Load::new(self.weight, self.volume)
    }

    pub fn priority(&self) -> f64 {
        self.priority
    }

    pub fn window(&self) -> &DeliveryWindow {
        &self.window
    }

    pub fn assigned_vehicle(&self) -> Option<VehicleIdx> {
        self.assigned_vehicle
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned_vehicle.is_some()
    }

    pub fn status(&self) -> PackageStatus {
        self.status
    }

    pub fn is_delivered(&self) -> bool {
        self.status == PackageStatus::Delivered
    }

    pub fn delivered_at(&self) -> Option<f64> {
        self.delivered_at
    }

    pub fn touches(&self, node: NodeIdx) -> bool {
        self.source == node || self.destination == node
    }

    pub(crate) fn set_assigned_vehicle(&mut self, vehicle: Option<VehicleIdx>) {
        self.assigned_vehicle = vehicle;
    }

    pub(crate) fn mark_delivered(&mut self, minute: f64) {
        self.status = PackageStatus::Delivered;
        self.delivered_at = Some(minute);
    }

    /// Replaces every endpoint equal to `failed` by `substitute`.
    pub(crate) fn redirect(&mut self, failed: NodeIdx, substitute: NodeIdx) {
        if self.source == failed {
            self.source = substitute;
        }
        if self.destination == failed {
            self.destination = substitute;
        }
    }
}

#[derive(Default)]
pub struct PackageBuilder {
    external_id: Option<String>,
    source: Option<NodeIdx>,
    destination: Option<NodeIdx>,
    weight: Option<f64>,
    volume: Option<f64>,
    priority: Option<f64>,
    window: Option<DeliveryWindow>,
    delivered_at: Option<f64>,
}

impl PackageBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut PackageBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_source(&mut self, source: NodeIdx) -> &mut PackageBuilder {
        self.source = Some(source);
        self
    }

    pub fn set_destination(&mut self, destination: NodeIdx) -> &mut PackageBuilder {
        self.destination = Some(destination);
        self
    }

    pub fn set_weight(&mut self, weight: f64) -> &mut PackageBuilder {
        self.weight = Some(weight);
        self
    }

    pub fn set_volume(&mut self, volume: f64) -> &mut PackageBuilder {
        self.volume = Some(volume);
        self
    }

    pub fn set_priority(&mut self, priority: f64) -> &mut PackageBuilder {
        self.priority = Some(priority);
        self
    }

    pub fn set_window(&mut self, start: f64, end: f64) -> &mut PackageBuilder {
        self.window = Some(DeliveryWindow::new(start, end));
        self
    }

    /// Builds the package as already delivered at `minute`.
    pub fn set_delivered_at(&mut self, minute: f64) -> &mut PackageBuilder {
        self.delivered_at = Some(minute);
        self
    }

    pub fn build(&self) -> Package {
        Package {
            external_id: self.external_id.clone().unwrap_or_default(),
            source: self.source.unwrap_or_default(),
            destination: self.destination.unwrap_or_default(),
            weight: self.weight.unwrap_or(0.0),
            volume: self.volume.unwrap_or(0.0),
            priority: self.priority.unwrap_or(1.0),
            window: self.window.unwrap_or_default(),
            assigned_vehicle: None,
            status: if self.delivered_at.is_some() {
                PackageStatus::Delivered
            } else {
                PackageStatus::Pending
            },
            delivered_at: self.delivered_at,
        }
    }
}
