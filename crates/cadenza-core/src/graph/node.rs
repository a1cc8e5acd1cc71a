//! Graph node types.
//!
//! A [`Node`] is a display name plus a closed [`NodeKind`]. Connections live
//! in the engine's adjacency lists, not in the node.

use core::fmt;

use crate::{AudioBuffer, Effect};

/// Opaque arena handle. Ids are never reused after removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Raw arena index.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// What a node does with the block it receives.
pub enum NodeKind {
    /// Entry point; emits the block written by
    /// [`AudioEngine::set_input`](super::AudioEngine::set_input).
    AudioInput,
    /// Runs an effect in place.
    Fx(Box<dyn Effect>),
    /// Sums its inputs and applies a linear gain.
    MixerBus {
        /// Linear gain applied after summing.
        gain: f32,
    },
    /// Terminal node; its buffer is read back with
    /// [`AudioEngine::output`](super::AudioEngine::output).
    Output,
}

impl NodeKind {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::AudioInput => "audio_input",
            Self::Fx(_) => "fx",
            Self::MixerBus { .. } => "mixer_bus",
            Self::Output => "output",
        }
    }
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fx(effect) => write!(f, "Fx({})", effect.kind()),
            Self::MixerBus { gain } => write!(f, "MixerBus {{ gain: {gain} }}"),
            other => f.write_str(other.label()),
        }
    }
}

/// A processing unit in the graph.
#[derive(Debug)]
pub struct Node {
    name: String,
    kind: NodeKind,
}

impl Node {
    /// Creates a node.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Node kind.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Mutable node kind, e.g. to change a bus gain.
    pub fn kind_mut(&mut self) -> &mut NodeKind {
        &mut self.kind
    }

    /// The wrapped effect, for `Fx` nodes.
    pub fn effect_mut(&mut self) -> Option<&mut dyn Effect> {
        match &mut self.kind {
            NodeKind::Fx(effect) => Some(effect.as_mut()),
            _ => None,
        }
    }

    /// Processes `buffer` in place.
    ///
    /// `buffer` already holds the sum of upstream outputs (plus external input
    /// for `AudioInput`).
    pub fn process(&mut self, buffer: &mut AudioBuffer) {
        match &mut self.kind {
            NodeKind::AudioInput | NodeKind::Output => {}
            NodeKind::Fx(effect) => effect.process_block(buffer),
            NodeKind::MixerBus { gain } => buffer.apply_gain(*gain),
        }
    }

    /// Resets effect state, if any.
    pub fn reset(&mut self) {
        if let NodeKind::Fx(effect) = &mut self.kind {
            effect.reset();
        }
    }
}
