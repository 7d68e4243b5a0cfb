//! Population of nodes and the per-tick driver.

use crate::log::{self, LogSink, NullSink};
use crate::node::Node;
use crate::stats::WorldStats;
use dsim_core::{Error, NodeId, Result, Vec2, WorldConfig};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument, trace};

/// The simulated population.
///
/// Every tick reseeds the generator from a seed drawn at the end of the
/// previous tick, so tick `n` can be replayed from the node states and the
/// seed captured after tick `n - 1`.
pub struct World<S = NullSink> {
    nodes: Vec<Node>,
    config: WorldConfig,
    rng: ChaCha8Rng,
    next_seed: u64,
    tick: u64,
    sink: S,
}

impl<S: LogSink> World<S> {
    /// Build a population with positions drawn uniformly inside
    /// `[min_pos, max_pos]`
    #[instrument(skip_all, fields(seed = config.seed, num_nodes = config.num_nodes))]
    pub fn new(config: WorldConfig, sink: S) -> Result<Self> {
        config.validate()?;
        let span = config.max_pos - config.min_pos;
        let min_pos = config.min_pos;

        Self::build(config, sink, |rng| {
            let x = rng.gen::<f64>() * span.x;
            let y = rng.gen::<f64>() * span.y;
            min_pos + Vec2::new(x, y)
        })
    }

    /// Build a population with given home positions, one per node in id
    /// order. Travel radii are still drawn from the configured range.
    #[instrument(skip_all, fields(seed = config.seed, num_nodes = config.num_nodes))]
    pub fn with_positions(config: WorldConfig, positions: &[Vec2], sink: S) -> Result<Self> {
        config.validate()?;
        if positions.len() != config.num_nodes as usize {
            return Err(Error::InvalidConfig(format!(
                "{} positions given for {} nodes",
                positions.len(),
                config.num_nodes
            )));
        }
        if let Some(bad) = positions.iter().find(|p| !p.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "non-finite position {:?}",
                bad
            )));
        }

        let mut placements = positions.iter().copied();
        Self::build(config, sink, move |_| {
            placements.next().unwrap_or(Vec2::ZERO)
        })
    }

    fn build<F>(config: WorldConfig, mut sink: S, mut place: F) -> Result<Self>
    where
        F: FnMut(&mut ChaCha8Rng) -> Vec2,
    {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        for record in log::run_header(&config) {
            sink.write_record(&record)?;
        }
        sink.write_record(&log::column_header())?;

        let travel_span = config.max_max_travel - config.min_max_travel;
        let mut nodes = Vec::with_capacity(config.num_nodes as usize);
        for i in 0..config.num_nodes {
            let position = place(&mut rng);
            let max_travel = config.min_max_travel + rng.gen::<f64>() * travel_span;
            let node = Node::new(
                NodeId(i),
                position,
                max_travel,
                config.max_speed,
                config.reinfect,
            );
            sink.write_record(&node.record())?;
            nodes.push(node);
        }

        let next_seed = rng.gen::<u64>();

        info!(
            seed = config.seed,
            num_nodes = config.num_nodes,
            next_seed,
            "World created"
        );

        Ok(Self {
            nodes,
            config,
            rng,
            next_seed,
            tick: 0,
            sink,
        })
    }

    /// Advance the simulation by one tick: move every node, then check and
    /// log every node in population order.
    ///
    /// Infection checks see the infection state as it was when the checks
    /// began, so transmission does not chain within a single tick.
    pub fn advance_tick(&mut self) -> Result<()> {
        self.rng = ChaCha8Rng::seed_from_u64(self.next_seed);
        self.sink.write_record(&log::column_header())?;

        for node in &mut self.nodes {
            node.wander(&mut self.rng);
        }

        let snapshot = self.nodes.clone();
        let radius = self.config.contact_radius;
        let mut newly_infected = 0usize;
        for node in &mut self.nodes {
            if node.check_infection(&snapshot, radius) {
                newly_infected += 1;
                trace!(node = %node.id(), tick = self.tick + 1, "Node infected");
            }
            self.sink.write_record(&node.record())?;
        }

        self.next_seed = self.rng.gen::<u64>();
        self.tick += 1;

        debug!(
            tick = self.tick,
            newly_infected,
            infected = self.infected_count(),
            next_seed = self.next_seed,
            "Tick complete"
        );

        Ok(())
    }

    /// Mark a node infected, e.g. patient zero before the first tick
    pub fn infect(&mut self, id: NodeId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id.index())
            .ok_or_else(|| Error::NotFound(format!("node {}", id)))?;
        node.set_infected();
        info!(node = %id, tick = self.tick, "Node marked infected");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }
}

impl<S> World<S> {
    /// Nodes in population order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Seed the next tick will start from
    pub fn next_seed(&self) -> u64 {
        self.next_seed
    }

    pub fn infected_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_infected()).count()
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats::collect(self.tick, &self.nodes)
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
