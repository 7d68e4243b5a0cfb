//! Per-tick population summary.

use crate::node::Node;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldStats {
    /// Completed ticks
    pub tick: u64,
    pub total: usize,
    pub infected: usize,
    /// Nodes that are infectable and not yet infected
    pub susceptible: usize,
}

impl WorldStats {
    pub fn collect(tick: u64, nodes: &[Node]) -> Self {
        let infected = nodes.iter().filter(|n| n.is_infected()).count();
        let susceptible = nodes
            .iter()
            .filter(|n| n.is_infectable() && !n.is_infected())
            .count();

        Self {
            tick,
            total: nodes.len(),
            infected,
            susceptible,
        }
    }

    /// Share of the population currently infected
    pub fn infected_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.infected as f64 / self.total as f64
        }
    }
}
