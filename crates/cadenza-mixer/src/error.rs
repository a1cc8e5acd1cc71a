//! Mixer error type.

use thiserror::Error;

/// Errors from track and routing edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MixerError {
    /// No track with this id.
    #[error("track '{0}' not found")]
    TrackNotFound(String),
    /// A track with this id already exists.
    #[error("track '{0}' already exists")]
    DuplicateTrack(String),
    /// Only one master bus is allowed.
    #[error("master bus already exists as '{0}'")]
    MasterExists(String),
    /// The track has no send to the destination.
    #[error("track '{track}' has no send to '{destination}'")]
    SendNotFound {
        /// Sending track.
        track: String,
        /// Requested destination.
        destination: String,
    },
    /// Insert slot index past the end of the chain.
    #[error("insert index {index} out of range ({len} inserts)")]
    InsertOutOfRange {
        /// Requested index.
        index: usize,
        /// Chain length.
        len: usize,
    },
    /// Routes and sends form a feedback loop through this track.
    #[error("routing cycle through track '{0}'")]
    RoutingCycle(String),
}
