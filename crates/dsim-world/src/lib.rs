//! Epidemic simulation engine.
//!
//! Nodes wander around fixed home positions inside a bounded region; a node
//! within the contact radius of an infected node becomes infected. Each tick
//! writes every node's state to a record log.

pub mod log;
pub mod node;
pub mod stats;
pub mod world;

pub use log::{CsvSink, LogSink, NullSink};
pub use node::Node;
pub use stats::WorldStats;
pub use world::World;
