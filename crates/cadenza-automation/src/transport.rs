//! Playback transport: position, tempo and loop region.
//!
//! The transport is the clock automation reads from. Position is kept as an
//! integer sample count; seconds and beats are derived from it after every
//! change so the published [`TransportState`] is always consistent.

use cadenza_core::{Stateful, decode_or_warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Slowest accepted tempo.
pub const MIN_BPM: f64 = 20.0;
/// Fastest accepted tempo.
pub const MAX_BPM: f64 = 999.0;

/// Snapshot of the transport, shared with presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportState {
    /// True while advancing.
    pub playing: bool,
    /// Position in seconds.
    pub time_seconds: f64,
    /// Position in samples.
    pub sample_pos: u64,
    /// Tempo.
    pub bpm: f64,
    /// Position in beats.
    pub beat_pos: f64,
    /// Whether playback wraps at `loop_end`.
    pub loop_enabled: bool,
    /// Loop start in seconds.
    pub loop_start: f64,
    /// Loop end in seconds.
    pub loop_end: f64,
}

impl Default for TransportState {
    fn default() -> Self {
        Self {
            playing: false,
            time_seconds: 0.0,
            sample_pos: 0,
            bpm: 120.0,
            beat_pos: 0.0,
            loop_enabled: false,
            loop_start: 0.0,
            loop_end: 0.0,
        }
    }
}

/// Sample-accurate transport clock.
///
/// # Example
///
/// ```rust
/// use cadenza_automation::Transport;
///
/// let mut transport = Transport::new(48000.0);
/// transport.play();
/// transport.advance(48000);
/// assert_eq!(transport.state().time_seconds, 1.0);
/// assert_eq!(transport.state().beat_pos, 2.0); // 120 BPM
///
/// transport.pause();
/// transport.advance(48000);
/// assert_eq!(transport.sample_pos(), 48000);
/// ```
#[derive(Debug, Clone)]
pub struct Transport {
    sample_rate: f64,
    state: TransportState,
}

impl Transport {
    /// Creates a stopped transport at 120 BPM.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate: f64::from(sample_rate),
            state: TransportState::default(),
        }
    }

    /// Current snapshot.
    pub fn state(&self) -> &TransportState {
        &self.state
    }

    /// Position in samples.
    pub fn sample_pos(&self) -> u64 {
        self.state.sample_pos
    }

    /// True while advancing.
    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    /// Starts playback from the current position.
    pub fn play(&mut self) {
        self.state.playing = true;
    }

    /// Stops playback and returns to zero.
    pub fn stop(&mut self) {
        self.state.playing = false;
        self.set_position(0);
    }

    /// Halts playback, keeping the position.
    pub fn pause(&mut self) {
        self.state.playing = false;
    }

    /// Continues playback after [`pause`](Self::pause).
    pub fn resume(&mut self) {
        self.state.playing = true;
    }

    /// Jumps to `seconds`; negative targets land on zero.
    pub fn seek(&mut self, seconds: f64) {
        self.set_position(self.seconds_to_samples(seconds));
    }

    /// Sets the tempo, clamped to `[20, 999]` BPM.
    pub fn set_tempo(&mut self, bpm: f64) {
        self.state.bpm = if bpm.is_nan() { 120.0 } else { bpm.clamp(MIN_BPM, MAX_BPM) };
        self.refresh();
    }

    /// Configures the loop region in seconds.
    ///
    /// A region with `end <= start` cannot loop and leaves looping disabled.
    pub fn set_loop(&mut self, enabled: bool, start: f64, end: f64) {
        let start = start.max(0.0);
        let end = end.max(0.0);
        if enabled && end <= start {
            tracing::warn!(start, end, "empty loop region, looping disabled");
        }
        self.state.loop_enabled = enabled && end > start;
        self.state.loop_start = start;
        self.state.loop_end = end;
    }

    /// Moves forward `samples` while playing, wrapping at the loop end.
    ///
    /// Returns the new position.
    pub fn advance(&mut self, samples: u64) -> u64 {
        if !self.state.playing {
            return self.state.sample_pos;
        }
        let mut pos = self.state.sample_pos.saturating_add(samples);
        if self.state.loop_enabled {
            let start = self.seconds_to_samples(self.state.loop_start);
            let end = self.seconds_to_samples(self.state.loop_end);
            if end > start && pos >= end && self.state.sample_pos < end {
                pos = start + (pos - start) % (end - start);
            }
        }
        self.set_position(pos);
        pos
    }

    fn seconds_to_samples(&self, seconds: f64) -> u64 {
        (seconds.max(0.0) * self.sample_rate).round() as u64
    }

    fn set_position(&mut self, sample_pos: u64) {
        self.state.sample_pos = sample_pos;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.state.time_seconds = self.state.sample_pos as f64 / self.sample_rate;
        self.state.beat_pos = self.state.time_seconds * self.state.bpm / 60.0;
    }
}

impl Stateful for Transport {
    fn to_dict(&self) -> Value {
        serde_json::to_value(self.state).unwrap_or_default()
    }

    /// Restores tempo, loop and position; playback always resumes stopped.
    fn load_dict(&mut self, dict: &Value) {
        let state: TransportState = decode_or_warn("transport", dict).unwrap_or_default();
        self.state.playing = false;
        self.set_loop(state.loop_enabled, state.loop_start, state.loop_end);
        self.set_tempo(state.bpm);
        self.set_position(state.sample_pos);
    }
}
