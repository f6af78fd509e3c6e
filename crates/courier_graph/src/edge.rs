use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::node::NodeIdx;

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoadCondition {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Impassable,
}

impl RoadCondition {
    /// Multiplier applied to the energy consumed per kilometer.
    pub fn energy_multiplier(&self) -> f64 {
        match self {
            RoadCondition::Excellent => 1.0,
            RoadCondition::Good => 1.1,
            RoadCondition::Fair => 1.25,
            RoadCondition::Poor => 1.5,
            RoadCondition::Impassable => 3.0,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrafficLevel {
    #[default]
    Light,
    Moderate,
    Heavy,
}

impl TrafficLevel {
    pub fn energy_multiplier(&self) -> f64 {
        match self {
            TrafficLevel::Light => 1.0,
            TrafficLevel::Moderate => 1.15,
            TrafficLevel::Heavy => 1.3,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    #[default]
    Morning,
    Afternoon,
    Night,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => DayPeriod::Morning,
            12..=19 => DayPeriod::Afternoon,
            _ => DayPeriod::Night,
        }
    }

    fn factor_index(&self) -> usize {
        match self {
            DayPeriod::Morning => 0,
            DayPeriod::Afternoon => 1,
            DayPeriod::Night => 2,
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Dry,
    Rainy,
    #[default]
    Temperate,
}

impl Season {
    pub fn travel_factor(&self) -> f64 {
        match self {
            Season::Dry => 0.9,
            Season::Rainy => 1.2,
            Season::Temperate => 1.0,
        }
    }
}

/// Conditions under which travel times and reliabilities are evaluated.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq, Default)]
pub struct TravelConditions {
    pub period: DayPeriod,
    pub season: Season,
    /// Hour of day, used for the rush-hour multipliers when set.
    pub hour: Option<u32>,
}

impl TravelConditions {
    fn rush_hour_factor(&self) -> f64 {
        match self.hour {
            Some(7..=9) => 1.5,
            Some(17..=19) => 1.3,
            _ => 1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EdgeAttributes {
    /// Distance in kilometers
    pub distance: f64,
    /// Travel time in hours under nominal conditions
    pub base_time: f64,
    pub cost: f64,
    pub condition: RoadCondition,
    pub traffic: TrafficLevel,
    /// Probability in `[0, 1]` that the road is usable as planned
    pub reliability: f64,
    /// Time multipliers for morning, afternoon and night
    pub time_factors: [f64; 3],
}

impl Default for EdgeAttributes {
    fn default() -> Self {
        EdgeAttributes {
            distance: 0.0,
            base_time: 0.0,
            cost: 0.0,
            condition: RoadCondition::default(),
            traffic: TrafficLevel::default(),
            reliability: 1.0,
            time_factors: [1.0; 3],
        }
    }
}

impl EdgeAttributes {
    pub fn new(distance: f64, base_time: f64, cost: f64) -> Self {
        EdgeAttributes {
            distance,
            base_time,
            cost,
            ..EdgeAttributes::default()
        }
    }

    pub fn with_condition(mut self, condition: RoadCondition) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_traffic(mut self, traffic: TrafficLevel) -> Self {
        self.traffic = traffic;
        self
    }

    pub fn with_reliability(mut self, reliability: f64) -> Self {
        self.reliability = reliability;
        self
    }

    pub fn with_time_factors(mut self, time_factors: [f64; 3]) -> Self {
        self.time_factors = time_factors;
        self
    }

    /// Energy needed to traverse this edge for a vehicle consuming `consumption_rate` per km.
    pub fn energy(&self, consumption_rate: f64) -> f64 {
        consumption_rate
            * self.condition.energy_multiplier()
            * self.traffic.energy_multiplier()
            * self.distance
    }

    pub fn travel_time(&self, conditions: &TravelConditions) -> f64 {
        self.base_time
            * self.time_factors[conditions.period.factor_index()]
            * conditions.rush_hour_factor()
            * conditions.season.travel_factor()
    }

    pub fn travel_cost(&self, conditions: &TravelConditions) -> f64 {
        self.cost * conditions.rush_hour_factor()
    }

    pub fn effective_reliability(&self, conditions: &TravelConditions) -> f64 {
        (self.reliability / conditions.season.travel_factor()).clamp(0.0, 1.0)
    }

    pub fn is_passable(&self) -> bool {
        self.condition != RoadCondition::Impassable
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Edge {
    dest: NodeIdx,
    attributes: EdgeAttributes,
}

impl Edge {
    pub fn new(dest: NodeIdx, attributes: EdgeAttributes) -> Self {
        Edge { dest, attributes }
    }

    pub fn dest(&self) -> NodeIdx {
        self.dest
    }

    pub fn attributes(&self) -> &EdgeAttributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut EdgeAttributes {
        &mut self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_energy_uses_condition_and_traffic() {
        let attributes = EdgeAttributes::new(10.0, 0.5, 4.0)
            .with_condition(RoadCondition::Poor)
            .with_traffic(TrafficLevel::Heavy);

        let energy = attributes.energy(0.2);
        assert!((energy - 0.2 * 1.5 * 1.3 * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_travel_time_conditions() {
        let attributes = EdgeAttributes::new(10.0, 2.0, 4.0).with_time_factors([1.0, 1.2, 0.8]);

        let nominal = TravelConditions::default();
        assert_eq!(attributes.travel_time(&nominal), 2.0);

        let rainy_afternoon = TravelConditions {
            period: DayPeriod::Afternoon,
            season: Season::Rainy,
            hour: Some(18),
        };
        let expected = 2.0 * 1.2 * 1.3 * 1.2;
        assert!((attributes.travel_time(&rainy_afternoon) - expected).abs() < 1e-9);
        assert!((attributes.travel_cost(&rainy_afternoon) - 4.0 * 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_reliability_by_season() {
        let attributes = EdgeAttributes::new(1.0, 1.0, 1.0).with_reliability(0.95);
        let rainy = TravelConditions {
            season: Season::Rainy,
            ..TravelConditions::default()
        };
        let dry = TravelConditions {
            season: Season::Dry,
            ..TravelConditions::default()
        };

        assert!((attributes.effective_reliability(&rainy) - 0.95 / 1.2).abs() < 1e-9);
        assert_eq!(attributes.effective_reliability(&dry), 1.0);
    }
}
