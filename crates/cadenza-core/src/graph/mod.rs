//! Node-based audio graph for cadenza.
//!
//! The [`AudioEngine`] owns every node in an arena and keeps the adjacency
//! lists centrally, so nodes never hold references to each other. Topology
//! edits mark the cached schedule dirty; the next [`process_block`] (or an
//! explicit [`topological_sort`]) recomputes it with Kahn's algorithm.
//!
//! A cycle is a configuration error. It is reported as
//! [`GraphError::CycleDetected`] and no node is processed for that block,
//! since a partial schedule would produce wrong audio.
//!
//! # Example
//!
//! ```rust
//! use cadenza_core::AudioBuffer;
//! use cadenza_core::graph::{AudioEngine, GraphError};
//!
//! # fn main() -> Result<(), GraphError> {
//! let mut engine = AudioEngine::new(48000.0, 64);
//! let input = engine.add_input("in");
//! let bus = engine.add_bus("bus", 0.5);
//! let output = engine.add_output("out");
//! engine.connect(input, bus)?;
//! engine.connect(bus, output)?;
//!
//! engine.set_input(input, &AudioBuffer::from_stereo(vec![1.0; 64], vec![1.0; 64]))?;
//! engine.start();
//! engine.process_block()?;
//! assert_eq!(engine.output(output).map(|b| b.left()[0]), Some(0.5));
//! # Ok(())
//! # }
//! ```
//!
//! [`process_block`]: AudioEngine::process_block
//! [`topological_sort`]: AudioEngine::topological_sort

mod engine;
mod node;
mod schedule;

pub use engine::AudioEngine;
pub use node::{Node, NodeId, NodeKind};
pub use schedule::{Schedule, kahn_sort};

use thiserror::Error;

/// Errors from graph topology operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The node was never added or has been removed.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// The graph contains a cycle; `unscheduled` nodes could not be ordered.
    #[error("graph contains a cycle ({unscheduled} of {total} nodes unschedulable)")]
    CycleDetected {
        /// Nodes left out of the partial schedule.
        unscheduled: usize,
        /// Total live nodes.
        total: usize,
    },
    /// External input was written to a node that is not an `AudioInput`.
    #[error("node {0} is not an audio input")]
    NotAnInput(NodeId),
}
