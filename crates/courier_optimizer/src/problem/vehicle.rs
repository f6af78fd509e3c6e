use courier_graph::{define_index_newtype, node::NodeIdx};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

define_index_newtype!(VehicleIdx, Vehicle);

/// Default maximum continuous driving time, in hours.
pub const DEFAULT_MAX_DRIVING_TIME: f64 = 4.5;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    #[serde(alias = "van")]
    Small,
    #[default]
    Medium,
    #[serde(alias = "truck")]
    Large,
}

impl VehicleClass {
    /// Weight (kg) and volume (m3) capacities.
    pub fn default_capacity(&self) -> (f64, f64) {
        match self {
            VehicleClass::Small => (500.0, 5.0),
            VehicleClass::Medium => (1000.0, 12.0),
            VehicleClass::Large => (2000.0, 25.0),
        }
    }

    /// Battery capacity (kWh), consumption (kWh/km) and charging rate (kW).
    pub fn default_energy_profile(&self) -> (f64, f64, f64) {
        match self {
            VehicleClass::Small => (60.0, 0.15, 22.0),
            VehicleClass::Medium => (100.0, 0.25, 50.0),
            VehicleClass::Large => (200.0, 0.4, 100.0),
        }
    }

    /// Average speed (km/h) and cost per km.
    pub fn default_running_costs(&self) -> (f64, f64) {
        match self {
            VehicleClass::Small => (50.0, 0.5),
            VehicleClass::Medium => (45.0, 0.8),
            VehicleClass::Large => (40.0, 1.2),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleClass::Small => "small",
            VehicleClass::Medium => "medium",
            VehicleClass::Large => "large",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Load {
    pub weight: f64,
    pub volume: f64,
}

impl Load {
    pub fn new(weight: f64, volume: f64) -> Self {
        Load { weight, volume }
    }

    pub fn is_empty(&self) -> bool {
        self.weight <= 0.0 && self.volume <= 0.0
    }
}

impl std::ops::Add for Load {
    type Output = Load;

    fn add(self, rhs: Self) -> Self::Output {
        Load {
            weight: self.weight + rhs.weight,
            volume: self.volume + rhs.volume,
        }
    }
}

impl std::ops::Sub for Load {
    type Output = Load;

    fn sub(self, rhs: Self) -> Self::Output {
        Load {
            weight: self.weight - rhs.weight,
            volume: self.volume - rhs.volume,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct Vehicle {
    external_id: String,
    class: VehicleClass,
    weight_capacity: f64,
    volume_capacity: f64,
    /// Average speed in km/h
    speed: f64,
    cost_per_km: f64,
    /// Battery capacity in kWh
    battery_capacity: f64,
    current_battery: f64,
    /// Energy consumption in kWh/km
    consumption_rate: f64,
    /// Charging rate in kW
    charging_rate: f64,
    current_location: NodeIdx,
    /// Hours driven since the last break
    driving_time: f64,
    max_driving_time: f64,
    available: bool,
    load: Load,
}

impl Vehicle {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn class(&self) -> VehicleClass {
        self.class
    }

    pub fn weight_capacity(&self) -> f64 {
        self.weight_capacity
    }

    pub fn volume_capacity(&self) -> f64 {
        self.volume_capacity
    }

    pub fn capacity(&self) -> Load {
        Load::new(self.weight_capacity, self.volume_capacity)
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn cost_per_km(&self) -> f64 {
        self.cost_per_km
    }

    pub fn battery_capacity(&self) -> f64 {
        self.battery_capacity
    }

    pub fn current_battery(&self) -> f64 {
        self.current_battery
    }

    pub fn consumption_rate(&self) -> f64 {
        self.consumption_rate
    }

    pub fn charging_rate(&self) -> f64 {
        self.charging_rate
    }

    pub fn current_location(&self) -> NodeIdx {
        self.current_location
    }

    pub fn driving_time(&self) -> f64 {
        self.driving_time
    }

    pub fn max_driving_time(&self) -> f64 {
        self.max_driving_time
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn load(&self) -> Load {
        self.load
    }

    pub fn remaining_capacity(&self) -> Load {
        self.capacity() - self.load
    }

    pub fn can_carry(&self, additional: Load) -> bool {
        let total = self.load + additional;
        total.weight <= self.weight_capacity && total.volume <= self.volume_capacity
    }

    /// Hours needed to charge from the current level to full.
    pub fn charging_duration(&self) -> f64 {
        if self.charging_rate <= 0.0 {
            return 0.0;
        }
        (self.battery_capacity - self.current_battery) / self.charging_rate
    }

    pub fn set_current_battery(&mut self, battery: f64) {
        self.current_battery = battery.clamp(0.0, self.battery_capacity);
    }

    pub fn set_current_location(&mut self, location: NodeIdx) {
        self.current_location = location;
    }

    pub fn set_driving_time(&mut self, driving_time: f64) {
        self.driving_time = driving_time.max(0.0);
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Back at `depot` with a full battery and a rested driver. The load is kept.
    pub fn reset_position(&mut self, depot: NodeIdx) {
        self.current_location = depot;
        self.current_battery = self.battery_capacity;
        self.driving_time = 0.0;
    }

    pub(crate) fn add_load(&mut self, load: Load) {
        self.load = self.load + load;
    }

    pub(crate) fn remove_load(&mut self, load: Load) {
        let remaining = self.load - load;
        self.load = Load::new(remaining.weight.max(0.0), remaining.volume.max(0.0));
    }

    pub(crate) fn clear_load(&mut self) {
        self.load = Load::default();
    }
}

#[derive(Default)]
pub struct VehicleBuilder {
    external_id: Option<String>,
    class: Option<VehicleClass>,
    weight_capacity: Option<f64>,
    volume_capacity: Option<f64>,
    speed: Option<f64>,
    cost_per_km: Option<f64>,
    battery_capacity: Option<f64>,
    current_battery: Option<f64>,
    consumption_rate: Option<f64>,
    charging_rate: Option<f64>,
    current_location: Option<NodeIdx>,
    max_driving_time: Option<f64>,
    available: Option<bool>,
}

impl VehicleBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut VehicleBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_class(&mut self, class: VehicleClass) -> &mut VehicleBuilder {
        self.class = Some(class);
        self
    }

    pub fn set_capacity(&mut self, weight: f64, volume: f64) -> &mut VehicleBuilder {
        self.weight_capacity = Some(weight);
        self.volume_capacity = Some(volume);
        self
    }

    pub fn set_weight_capacity(&mut self, weight: f64) -> &mut VehicleBuilder {
        self.weight_capacity = Some(weight);
        self
    }

    pub fn set_volume_capacity(&mut self, volume: f64) -> &mut VehicleBuilder {
        self.volume_capacity = Some(volume);
        self
    }

    pub fn set_speed(&mut self, speed: f64) -> &mut VehicleBuilder {
        self.speed = Some(speed);
        self
    }

    pub fn set_cost_per_km(&mut self, cost_per_km: f64) -> &mut VehicleBuilder {
        self.cost_per_km = Some(cost_per_km);
        self
    }

    pub fn set_battery_capacity(&mut self, battery_capacity: f64) -> &mut VehicleBuilder {
        self.battery_capacity = Some(battery_capacity);
        self
    }

    pub fn set_current_battery(&mut self, current_battery: f64) -> &mut VehicleBuilder {
        self.current_battery = Some(current_battery);
        self
    }

    pub fn set_consumption_rate(&mut self, consumption_rate: f64) -> &mut VehicleBuilder {
        self.consumption_rate = Some(consumption_rate);
        self
    }

    pub fn set_charging_rate(&mut self, charging_rate: f64) -> &mut VehicleBuilder {
        self.charging_rate = Some(charging_rate);
        self
    }

    pub fn set_current_location(&mut self, location: NodeIdx) -> &mut VehicleBuilder {
        self.current_location = Some(location);
        self
    }

    pub fn set_max_driving_time(&mut self, max_driving_time: f64) -> &mut VehicleBuilder {
        self.max_driving_time = Some(max_driving_time);
        self
    }

    pub fn set_available(&mut self, available: bool) -> &mut VehicleBuilder {
        self.available = Some(available);
        self
    }

    pub fn build(&self) -> Vehicle {
        let class = self.class.unwrap_or_default();
        let (weight_capacity, volume_capacity) = class.default_capacity();
        let (battery_capacity, consumption_rate, charging_rate) = class.default_energy_profile();
        let (speed, cost_per_km) = class.default_running_costs();

        let battery_capacity = self.battery_capacity.unwrap_or(battery_capacity).max(0.0);

        Vehicle {
            external_id: self.external_id.clone().unwrap_or_default(),
            class,
            weight_capacity: self.weight_capacity.unwrap_or(weight_capacity),
            volume_capacity: self.volume_capacity.unwrap_or(volume_capacity),
            speed: self.speed.unwrap_or(speed),
            cost_per_km: self.cost_per_km.unwrap_or(cost_per_km),
            battery_capacity,
            current_battery: self
                .current_battery
                .unwrap_or(battery_capacity)
                .clamp(0.0, battery_capacity),
            consumption_rate: self.consumption_rate.unwrap_or(consumption_rate),
            charging_rate: self.charging_rate.unwrap_or(charging_rate),
            current_location: self.current_location.unwrap_or_default(),
            driving_time: 0.0,
            max_driving_time: self.max_driving_time.unwrap_or(DEFAULT_MAX_DRIVING_TIME),
            available: self.available.unwrap_or(true),
            load: Load::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_defaults() {
        let vehicle = VehicleBuilder::default()
            .set_class(VehicleClass::Large)
            .build();

        assert_eq!(vehicle.weight_capacity(), 2000.0);
        assert_eq!(vehicle.battery_capacity(), 200.0);
        assert_eq!(vehicle.current_battery(), 200.0);
        assert_eq!(vehicle.max_driving_time(), DEFAULT_MAX_DRIVING_TIME);
    }

    #[test]
    fn test_battery_is_clamped() {
        let mut vehicle = VehicleBuilder::default()
            .set_battery_capacity(50.0)
            .set_current_battery(80.0)
            .build();
        assert_eq!(vehicle.current_battery(), 50.0);

        vehicle.set_current_battery(-4.0);
        assert_eq!(vehicle.current_battery(), 0.0);
    }

    #[test]
    fn test_charging_duration() {
        let vehicle = VehicleBuilder::default()
            .set_battery_capacity(100.0)
            .set_current_battery(40.0)
            .set_charging_rate(30.0)
            .build();

        assert_eq!(vehicle.charging_duration(), 2.0);
    }

    #[test]
    fn test_capacity_tracking() {
        let mut vehicle = VehicleBuilder::default().set_capacity(100.0, 1.0).build();

        assert!(vehicle.can_carry(Load::new(100.0, 1.0)));
        vehicle.add_load(Load::new(60.0, 0.5));
        assert!(!vehicle.can_carry(Load::new(50.0, 0.1)));
        assert!(vehicle.can_carry(Load::new(40.0, 0.5)));

        vehicle.remove_load(Load::new(60.0, 0.5));
        assert!(vehicle.load().is_empty());
    }

    #[test]
    fn test_reset_position_keeps_load() {
        let mut vehicle = VehicleBuilder::default()
            .set_current_location(NodeIdx::new(3))
            .set_battery_capacity(10.0)
            .set_current_battery(1.0)
            .build();
        vehicle.set_driving_time(3.0);
        vehicle.add_load(Load::new(5.0, 0.1));

        vehicle.reset_position(NodeIdx::new(0));

        assert_eq!(vehicle.current_location(), NodeIdx::new(0));
        assert_eq!(vehicle.current_battery(), 10.0);
        assert_eq!(vehicle.driving_time(), 0.0);
        assert_eq!(vehicle.load(), Load::new(5.0, 0.1));
    }
}
