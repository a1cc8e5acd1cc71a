//! Mixer channel strip.
//!
//! Signal flow through a [`Track`]:
//!
//! ```text
//! input ─► input gain ─► inserts ─┬─► volume ─► pan ─► mute ─► phase ─┬─► output
//!                                 │                                   │
//!                          pre-fader sends                     post-fader sends
//! ```
//!
//! Pan is constant power, `L = sqrt(0.5 * (1 - pan))`, `R = sqrt(0.5 * (1 + pan))`,
//! so a centred track sits 3 dB down on each side. Mono blocks skip the pan
//! stage.

use cadenza_core::{
    AudioBuffer, Effect, SharedParam, Stateful, constant_power_pan, db_to_linear, decode_or_warn,
};
use cadenza_effects::effect_from_dict;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::MixerError;

/// Lowest fader and send level, dB.
pub const MIN_VOLUME_DB: f32 = -96.0;
/// Highest fader and send level, dB.
pub const MAX_VOLUME_DB: f32 = 12.0;
/// Input trim range, dB either side of unity.
pub const MAX_INPUT_GAIN_DB: f32 = 24.0;

/// Role of a track in the mix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    /// Recorded audio.
    #[default]
    Audio,
    /// Output of a virtual instrument.
    Instrument,
    /// Return bus fed by sends.
    Aux,
    /// Control-only group fader.
    Vca,
    /// Final summing bus.
    Master,
}

impl TrackType {
    /// Source tracks are silenced by another track's solo; buses are not.
    pub fn is_source(self) -> bool {
        matches!(self, Self::Audio | Self::Instrument)
    }
}

/// A send from a track to another track (usually an aux bus).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSend {
    /// Id of the receiving track.
    pub destination_id: String,
    /// Send level, dB.
    pub level_db: f32,
    /// Taps after the inserts instead of after the fader.
    pub pre_fader: bool,
    /// Disabled sends contribute nothing and are ignored by routing checks.
    #[serde(default = "enabled_default")]
    pub enabled: bool,
}

fn enabled_default() -> bool {
    true
}

impl TrackSend {
    /// Creates an enabled send.
    pub fn new(destination_id: impl Into<String>, level_db: f32, pre_fader: bool) -> Self {
        Self {
            destination_id: destination_id.into(),
            level_db: sanitize(level_db, MIN_VOLUME_DB, MAX_VOLUME_DB, 0.0),
            pre_fader,
            enabled: true,
        }
    }

    /// Sets the level, clamped to the fader range.
    pub fn set_level_db(&mut self, db: f32) {
        self.level_db = sanitize(db, MIN_VOLUME_DB, MAX_VOLUME_DB, 0.0);
    }

    /// Linear send gain; zero when disabled.
    pub fn gain(&self) -> f32 {
        if self.enabled {
            db_to_linear(sanitize(self.level_db, MIN_VOLUME_DB, MAX_VOLUME_DB, 0.0))
        } else {
            0.0
        }
    }
}

/// Lock-free handles to a track's fader, pan and mute.
///
/// Clones share the cells read by the audio thread, so a control surface can
/// move the fader while [`Track::process_block`] runs elsewhere. Values are
/// clamped when read.
#[derive(Debug, Clone)]
pub struct TrackControls {
    /// Fader level, dB.
    pub volume_db: SharedParam,
    /// Pan position, -1 (left) to 1 (right).
    pub pan: SharedParam,
    /// Mute flag.
    pub muted: SharedParam,
}

impl Default for TrackControls {
    fn default() -> Self {
        Self {
            volume_db: SharedParam::new(0.0),
            pan: SharedParam::new(0.0),
            muted: SharedParam::new(0.0),
        }
    }
}

/// A channel strip: input trim, insert chain, fader, pan and sends.
pub struct Track {
    id: String,
    name: String,
    track_type: TrackType,
    controls: TrackControls,
    input_gain_db: f32,
    soloed: bool,
    armed: bool,
    phase_invert: bool,
    inserts: Vec<Box<dyn Effect>>,
    sends: Vec<TrackSend>,
    output: Option<String>,
    sample_rate: f32,
    /// Block written by the router, consumed on the next block.
    pub(crate) input: AudioBuffer,
    pre_fader: AudioBuffer,
    post_fader: AudioBuffer,
}

impl core::fmt::Debug for Track {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inserts: Vec<&str> = self.inserts.iter().map(|fx| fx.kind()).collect();
        f.debug_struct("Track")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("track_type", &self.track_type)
            .field("inserts", &inserts)
            .field("sends", &self.sends)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl Track {
    /// Creates a track at unity gain, centred, with empty chains.
    ///
    /// Tap buffers are stereo and start at `block_size`; they follow the
    /// length of whatever block is processed.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        track_type: TrackType,
        sample_rate: f32,
        block_size: usize,
    ) -> Self {
        let block_size = block_size.max(1);
        Self {
            id: id.into(),
            name: name.into(),
            track_type,
            controls: TrackControls::default(),
            input_gain_db: 0.0,
            soloed: false,
            armed: false,
            phase_invert: false,
            inserts: Vec::new(),
            sends: Vec::new(),
            output: None,
            sample_rate,
            input: AudioBuffer::stereo(block_size),
            pre_fader: AudioBuffer::stereo(block_size),
            post_fader: AudioBuffer::stereo(block_size),
        }
    }

    /// Unique id within the router.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the track.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Track role.
    pub fn track_type(&self) -> TrackType {
        self.track_type
    }

    /// Shared handles for cross-thread fader moves.
    pub fn controls(&self) -> TrackControls {
        self.controls.clone()
    }

    /// Fader level, dB.
    pub fn volume_db(&self) -> f32 {
        sanitize(self.controls.volume_db.get(), MIN_VOLUME_DB, MAX_VOLUME_DB, 0.0)
    }

    /// Sets the fader level, clamped to [`MIN_VOLUME_DB`]..[`MAX_VOLUME_DB`].
    pub fn set_volume(&mut self, db: f32) {
        self.controls
            .volume_db
            .set(sanitize(db, MIN_VOLUME_DB, MAX_VOLUME_DB, 0.0));
    }

    /// Pan position.
    pub fn pan(&self) -> f32 {
        sanitize(self.controls.pan.get(), -1.0, 1.0, 0.0)
    }

    /// Sets the pan position, clamped to `[-1, 1]`.
    pub fn set_pan(&mut self, pan: f32) {
        self.controls.pan.set(sanitize(pan, -1.0, 1.0, 0.0));
    }

    /// Input trim, dB.
    pub fn input_gain_db(&self) -> f32 {
        self.input_gain_db
    }

    /// Sets the input trim, clamped to ±[`MAX_INPUT_GAIN_DB`].
    pub fn set_input_gain(&mut self, db: f32) {
        self.input_gain_db = sanitize(db, -MAX_INPUT_GAIN_DB, MAX_INPUT_GAIN_DB, 0.0);
    }

    /// Mute state.
    pub fn is_muted(&self) -> bool {
        self.controls.muted.get_bool()
    }

    /// Mutes or unmutes.
    pub fn set_muted(&mut self, muted: bool) {
        self.controls.muted.set_bool(muted);
    }

    /// Solo state.
    pub fn is_soloed(&self) -> bool {
        self.soloed
    }

    /// Solos or unsolos.
    pub fn set_soloed(&mut self, soloed: bool) {
        self.soloed = soloed;
    }

    /// Record-arm state. Has no effect on the signal.
    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Arms or disarms recording.
    pub fn set_armed(&mut self, armed: bool) {
        self.armed = armed;
    }

    /// Polarity inversion state.
    pub fn phase_invert(&self) -> bool {
        self.phase_invert
    }

    /// Inverts or restores polarity.
    pub fn set_phase_flip(&mut self, invert: bool) {
        self.phase_invert = invert;
    }

    /// Routing target, as set by the router.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub(crate) fn set_output(&mut self, output: Option<String>) {
        self.output = output;
    }

    // --- inserts ---

    /// Appends an effect to the insert chain and returns its slot.
    pub fn add_insert(&mut self, effect: Box<dyn Effect>) -> usize {
        tracing::debug!(track = %self.id, kind = effect.kind(), "insert_add");
        self.inserts.push(effect);
        self.inserts.len() - 1
    }

    /// Removes the effect in `index`.
    pub fn remove_insert(&mut self, index: usize) -> Option<Box<dyn Effect>> {
        (index < self.inserts.len()).then(|| self.inserts.remove(index))
    }

    /// Moves the insert at `from` to `to`, shifting the ones between.
    pub fn reorder_inserts(&mut self, from: usize, to: usize) -> Result<(), MixerError> {
        let len = self.inserts.len();
        for index in [from, to] {
            if index >= len {
                return Err(MixerError::InsertOutOfRange { index, len });
            }
        }
        let effect = self.inserts.remove(from);
        self.inserts.insert(to, effect);
        Ok(())
    }

    /// Number of inserts.
    pub fn insert_count(&self) -> usize {
        self.inserts.len()
    }

    /// Effect in slot `index`.
    pub fn insert(&self, index: usize) -> Option<&dyn Effect> {
        self.inserts.get(index).map(AsRef::as_ref)
    }

    /// Mutable effect in slot `index`.
    pub fn insert_mut(&mut self, index: usize) -> Option<&mut (dyn Effect + 'static)> {
        self.inserts.get_mut(index).map(AsMut::as_mut)
    }

    /// Registry tags of the chain, in processing order.
    pub fn insert_kinds(&self) -> Vec<&'static str> {
        self.inserts.iter().map(|fx| fx.kind()).collect()
    }

    /// Total latency of the enabled inserts, in samples.
    pub fn latency_samples(&self) -> usize {
        self.inserts
            .iter()
            .filter(|fx| fx.is_enabled())
            .map(|fx| fx.latency_samples())
            .sum()
    }

    // --- sends ---

    /// Adds a send and returns its index.
    pub fn add_send(
        &mut self,
        destination_id: impl Into<String>,
        level_db: f32,
        pre_fader: bool,
    ) -> usize {
        let send = TrackSend::new(destination_id, level_db, pre_fader);
        tracing::debug!(
            track = %self.id,
            destination = %send.destination_id,
            pre_fader,
            "send_add"
        );
        self.sends.push(send);
        self.sends.len() - 1
    }

    /// Removes the send at `index`.
    pub fn remove_send(&mut self, index: usize) -> Option<TrackSend> {
        (index < self.sends.len()).then(|| self.sends.remove(index))
    }

    /// All sends, in creation order.
    pub fn sends(&self) -> &[TrackSend] {
        &self.sends
    }

    /// Mutable send at `index`.
    pub fn send_mut(&mut self, index: usize) -> Option<&mut TrackSend> {
        self.sends.get_mut(index)
    }

    pub(crate) fn retain_sends(&mut self, keep: impl FnMut(&TrackSend) -> bool) {
        self.sends.retain(keep);
    }

    // --- processing ---

    /// Runs one block through the strip in place.
    ///
    /// Afterwards [`pre_fader`](Self::pre_fader) holds the post-insert
    /// signal and [`post_fader`](Self::post_fader) a copy of the result, both
    /// at the length of `buffer`.
    pub fn process_block(&mut self, buffer: &mut AudioBuffer) {
        self.render(buffer, false);
    }

    /// Strip processing with an external solo mute applied at the mute stage.
    pub(crate) fn render(&mut self, buffer: &mut AudioBuffer, solo_muted: bool) {
        if self.input_gain_db != 0.0 {
            buffer.apply_gain(db_to_linear(self.input_gain_db));
        }
        for effect in &mut self.inserts {
            effect.process_block(buffer);
        }
        fit_tap(&mut self.pre_fader, buffer.len());
        fit_tap(&mut self.post_fader, buffer.len());
        self.pre_fader.copy_from(buffer);

        let gain = db_to_linear(self.volume_db());
        let (pan_l, pan_r) = constant_power_pan(self.pan());
        let mute = if self.is_muted() || solo_muted { 0.0 } else { 1.0 };
        let polarity = if self.phase_invert { -1.0 } else { 1.0 };
        let scale = gain * mute * polarity;

        match buffer.channels_mut() {
            (left, Some(right)) => {
                left.iter_mut().for_each(|s| *s *= scale * pan_l);
                right.iter_mut().for_each(|s| *s *= scale * pan_r);
            }
            (left, None) => left.iter_mut().for_each(|s| *s *= scale),
        }
        self.post_fader.copy_from(buffer);
    }

    /// Post-insert, pre-fader signal of the last block.
    pub fn pre_fader(&self) -> &AudioBuffer {
        &self.pre_fader
    }

    /// Final output of the last block.
    pub fn post_fader(&self) -> &AudioBuffer {
        &self.post_fader
    }

    /// The tap a send reads from.
    pub fn send_tap(&self, send: &TrackSend) -> &AudioBuffer {
        if send.pre_fader {
            &self.pre_fader
        } else {
            &self.post_fader
        }
    }

    /// Clears taps and pending input and resets every insert.
    pub fn reset(&mut self) {
        self.input.clear();
        self.pre_fader.clear();
        self.post_fader.clear();
        for effect in &mut self.inserts {
            effect.reset();
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct TrackState {
    id: String,
    name: String,
    #[serde(rename = "type")]
    track_type: TrackType,
    volume_db: f32,
    pan: f32,
    input_gain_db: f32,
    muted: bool,
    soloed: bool,
    armed: bool,
    phase_invert: bool,
    output: Option<String>,
    sends: Vec<TrackSend>,
    inserts: Vec<Value>,
}

impl Stateful for Track {
    fn to_dict(&self) -> Value {
        let state = TrackState {
            id: self.id.clone(),
            name: self.name.clone(),
            track_type: self.track_type,
            volume_db: self.volume_db(),
            pan: self.pan(),
            input_gain_db: self.input_gain_db,
            muted: self.is_muted(),
            soloed: self.soloed,
            armed: self.armed,
            phase_invert: self.phase_invert,
            output: self.output.clone(),
            sends: self.sends.clone(),
            inserts: self.inserts.iter().map(|fx| fx.to_dict()).collect(),
        };
        match serde_json::to_value(state) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(track = %self.id, %err, "failed to serialize track");
                Value::Object(Map::new())
            }
        }
    }

    /// Restores everything but the id. Inserts are rebuilt through the
    /// effect registry; unknown effect types are skipped.
    fn load_dict(&mut self, dict: &Value) {
        let state: TrackState = decode_or_warn("track", dict).unwrap_or_default();
        if !state.name.is_empty() {
            self.name = state.name;
        }
        self.track_type = state.track_type;
        self.set_volume(state.volume_db);
        self.set_pan(state.pan);
        self.set_input_gain(state.input_gain_db);
        self.set_muted(state.muted);
        self.soloed = state.soloed;
        self.armed = state.armed;
        self.phase_invert = state.phase_invert;
        self.output = state.output;
        self.sends = state.sends;
        for send in &mut self.sends {
            send.set_level_db(send.level_db);
        }

        let sample_rate = self.sample_rate;
        self.inserts = state
            .inserts
            .iter()
            .filter_map(|dict| effect_from_dict(dict, sample_rate))
            .collect();
        self.reset();
    }
}

/// Clamps `value` into `[lo, hi]`, replacing NaN with `fallback`.
fn sanitize(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(lo, hi)
    }
}

/// Reallocates a stereo tap when the block length changes.
fn fit_tap(tap: &mut AudioBuffer, len: usize) {
    if tap.len() != len {
        *tap = AudioBuffer::stereo(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_effects::{Gain, create_effect};
    use serde_json::json;

    fn track() -> Track {
        Track::new("t1", "Track 1", TrackType::Audio, 48000.0, 4)
    }

    fn boost(db: f32) -> Box<dyn Effect> {
        let mut gain = Gain::new(48000.0);
        gain.set_gain_db(db);
        Box::new(gain)
    }

    #[test]
    fn test_centre_pan_is_constant_power() {
        let mut t = track();
        let mut block = AudioBuffer::from_stereo(vec![1.0; 4], vec![1.0; 4]);
        t.process_block(&mut block);
        let expected = 0.5f32.sqrt();
        assert!((block.left()[0] - expected).abs() < 1e-6);
        assert!((block.right().unwrap()[0] - expected).abs() < 1e-6);
    }

    #[test]
    fn test_hard_pan_and_volume() {
        let mut t = track();
        t.set_pan(1.0);
        t.set_volume(-6.0);
        let mut block = AudioBuffer::from_stereo(vec![1.0; 4], vec![1.0; 4]);
        t.process_block(&mut block);
        assert!(block.left()[0].abs() < 1e-6);
        assert!((block.right().unwrap()[0] - db_to_linear(-6.0)).abs() < 1e-6);
    }

    #[test]
    fn test_mute_then_phase() {
        let mut t = track();
        t.set_phase_flip(true);
        let mut block = AudioBuffer::from_mono(vec![0.5; 4]);
        t.process_block(&mut block);
        assert_eq!(block.left()[0], -0.5);

        t.set_muted(true);
        let mut block = AudioBuffer::from_mono(vec![0.5; 4]);
        t.process_block(&mut block);
        assert_eq!(block.left()[0], 0.0);
    }

    #[test]
    fn test_taps_split_at_fader() {
        let mut t = track();
        t.add_insert(boost(6.0));
        t.set_volume(-96.0);
        let mut block = AudioBuffer::from_mono(vec![0.25; 4]);
        t.process_block(&mut block);
        let boosted = 0.25 * db_to_linear(6.0);
        assert!((t.pre_fader().left()[0] - boosted).abs() < 1e-6);
        assert!(t.post_fader().left()[0].abs() < 1e-4);

        let pre = TrackSend::new("fx", 0.0, true);
        let post = TrackSend::new("fx", 0.0, false);
        assert_eq!(t.send_tap(&pre), t.pre_fader());
        assert_eq!(t.send_tap(&post), t.post_fader());
    }

    #[test]
    fn test_taps_follow_block_length() {
        let mut t = track();
        let mut long = AudioBuffer::from_stereo(vec![0.5; 16], vec![0.5; 16]);
        t.process_block(&mut long);
        assert_eq!(t.pre_fader().len(), 16);
        assert_eq!(t.post_fader().len(), 16);
        assert_eq!(t.pre_fader().left()[15], 0.5);
        assert_eq!(t.post_fader().left()[15], long.left()[15]);
        assert!(t.post_fader().left()[15] != 0.0);

        let mut short = AudioBuffer::from_mono(vec![0.25; 2]);
        t.process_block(&mut short);
        assert_eq!(t.post_fader().len(), 2);
        assert_eq!(t.pre_fader().right().unwrap()[1], 0.25);
    }

    #[test]
    fn test_input_gain_before_inserts() {
        let mut t = track();
        t.set_input_gain(-6.0);
        t.add_insert(boost(6.0));
        let mut block = AudioBuffer::from_mono(vec![0.5; 4]);
        t.process_block(&mut block);
        assert!((t.pre_fader().left()[0] - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_insert_edits() {
        let mut t = track();
        t.add_insert(boost(1.0));
        t.add_insert(create_effect("compressor", 48000.0).unwrap());
        t.add_insert(create_effect("simple_delay", 48000.0).unwrap());
        assert_eq!(t.insert_kinds(), ["gain", "compressor", "simple_delay"]);

        t.reorder_inserts(2, 0).unwrap();
        assert_eq!(t.insert_kinds(), ["simple_delay", "gain", "compressor"]);
        assert_eq!(
            t.reorder_inserts(0, 3),
            Err(MixerError::InsertOutOfRange { index: 3, len: 3 })
        );

        assert_eq!(t.remove_insert(1).map(|fx| fx.kind()), Some("gain"));
        assert!(t.remove_insert(5).is_none());
        assert_eq!(t.insert_count(), 2);
    }

    #[test]
    fn test_send_gain() {
        let mut t = track();
        let idx = t.add_send("reverb", -6.0, false);
        assert!((t.sends()[idx].gain() - db_to_linear(-6.0)).abs() < 1e-6);
        t.send_mut(idx).unwrap().enabled = false;
        assert_eq!(t.sends()[idx].gain(), 0.0);
        assert!(t.remove_send(idx).is_some());
        assert!(t.sends().is_empty());
    }

    #[test]
    fn test_remote_controls() {
        let mut t = track();
        let remote = t.controls();
        remote.volume_db.set(-200.0);
        remote.pan.set(f32::NAN);
        remote.muted.set_bool(true);
        assert_eq!(t.volume_db(), MIN_VOLUME_DB);
        assert_eq!(t.pan(), 0.0);
        assert!(t.is_muted());

        let mut block = AudioBuffer::from_mono(vec![1.0; 4]);
        t.process_block(&mut block);
        assert_eq!(block.peak(), 0.0);
    }

    #[test]
    fn test_state_round_trip() {
        let mut t = track();
        t.set_volume(-3.0);
        t.set_pan(-0.25);
        t.set_armed(true);
        t.add_insert(boost(4.0));
        t.add_send("aux", -12.0, true);

        let dict = t.to_dict();
        assert_eq!(dict["type"], "audio");
        assert_eq!(dict["inserts"][0]["type"], "gain");

        let mut restored = Track::new("t1", "", TrackType::Aux, 48000.0, 4);
        restored.load_dict(&dict);
        assert_eq!(restored.to_dict(), dict);
    }

    #[test]
    fn test_malformed_dict_defaults() {
        let mut t = track();
        t.set_volume(-10.0);
        t.add_insert(boost(2.0));
        t.load_dict(&json!({ "volume_db": "loud" }));
        assert_eq!(t.volume_db(), 0.0);
        assert_eq!(t.insert_count(), 0);
        assert_eq!(t.id(), "t1");
        assert_eq!(t.name(), "Track 1");

        t.load_dict(&json!({ "inserts": [{ "type": "no_such_fx" }, { "type": "gain" }] }));
        assert_eq!(t.insert_kinds(), ["gain"]);
    }
}
