//! Configuration types for the simulation.

use crate::{Error, Result, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Distance below which an infected node transmits to another node
pub const DEFAULT_CONTACT_RADIUS: f64 = 4.0;

/// World configuration parameters
///
/// Infection timing, survival rate and the reinfection flag are recorded in
/// the run header and on every node, but no transition reads them yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Number of nodes in the population
    pub num_nodes: u32,
    /// Minimum number of ticks a node stays infected
    pub min_inf_time: u32,
    /// Maximum number of ticks a node stays infected
    pub max_inf_time: u32,
    /// Probability of surviving an infection (0.0 to 1.0)
    pub survival_rate: f64,
    /// Whether recovered nodes can be infected again
    pub reinfect: bool,
    /// Lower bound of the per-node travel radius
    pub min_max_travel: f64,
    /// Upper bound of the per-node travel radius
    pub max_max_travel: f64,
    /// Lower corner of the placement region
    pub min_pos: Vec2,
    /// Upper corner of the placement region
    pub max_pos: Vec2,
    /// Maximum per-tick displacement
    pub max_speed: f64,
    /// Contact distance for transmission
    pub contact_radius: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            num_nodes: 3000,
            min_inf_time: 5,
            max_inf_time: 20,
            survival_rate: 0.8,
            reinfect: false,
            min_max_travel: 3.0,
            max_max_travel: 10.0,
            min_pos: Vec2::new(0.0, 0.0),
            max_pos: Vec2::new(500.0, 500.0),
            max_speed: 1.0,
            contact_radius: DEFAULT_CONTACT_RADIUS,
            seed: 0,
        }
    }
}

impl WorldConfig {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check the preconditions the engine relies on
    pub fn validate(&self) -> Result<()> {
        if self.num_nodes == 0 {
            return Err(invalid("num_nodes must be at least 1"));
        }
        if !self.min_max_travel.is_finite() || !self.max_max_travel.is_finite() {
            return Err(invalid("travel bounds must be finite"));
        }
        if self.min_max_travel < 0.0 {
            return Err(invalid("min_max_travel must not be negative"));
        }
        if self.min_max_travel > self.max_max_travel {
            return Err(invalid(format!(
                "min_max_travel ({}) exceeds max_max_travel ({})",
                self.min_max_travel, self.max_max_travel
            )));
        }
        if self.min_inf_time > self.max_inf_time {
            return Err(invalid(format!(
                "min_inf_time ({}) exceeds max_inf_time ({})",
                self.min_inf_time, self.max_inf_time
            )));
        }
        if !(0.0..=1.0).contains(&self.survival_rate) {
            return Err(invalid(format!(
                "survival_rate ({}) must be within [0, 1]",
                self.survival_rate
            )));
        }
        if !self.max_speed.is_finite() || self.max_speed < 0.0 {
            return Err(invalid(format!(
                "max_speed ({}) must be a finite non-negative number",
                self.max_speed
            )));
        }
        if !self.contact_radius.is_finite() || self.contact_radius <= 0.0 {
            return Err(invalid(format!(
                "contact_radius ({}) must be a finite positive number",
                self.contact_radius
            )));
        }
        if !self.min_pos.is_finite() || !self.max_pos.is_finite() {
            return Err(invalid("position bounds must be finite"));
        }
        if self.min_pos.x > self.max_pos.x || self.min_pos.y > self.max_pos.y {
            return Err(invalid(format!(
                "min_pos ({}) exceeds max_pos ({})",
                self.min_pos, self.max_pos
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidConfig(msg.into())
}
