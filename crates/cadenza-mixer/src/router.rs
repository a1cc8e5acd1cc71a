//! Track routing and the mix loop.
//!
//! The [`Router`] owns every [`Track`] and an adjacency matrix keyed by track
//! id. Each block a track's input is its externally written block plus the
//! post-fader output of every track routed into it plus every enabled send
//! aimed at it. Tracks run in Kahn order over routes and enabled sends; the
//! mix is the sum of every track that routes nowhere (normally the master
//! bus).
//!
//! Edits never reject cycles. [`Router::validate_routing`] reports them and
//! [`Router::process_block`] refuses to run while one exists.

use std::collections::BTreeMap;

use cadenza_core::graph::kahn_sort;
use cadenza_core::{AudioBuffer, Stateful, decode_or_warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{MixerError, Track, TrackType};

/// Id given to the bus made by [`Router::create_master_bus`].
pub const MASTER_ID: &str = "master";

/// Outcome of [`Router::validate_routing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingReport {
    /// True when the routing can be scheduled.
    pub valid: bool,
    /// Human-readable verdict naming the first offending track.
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
enum Feed {
    /// Post-fader output of a routed track.
    Route(usize),
    /// A send on `source`, by index.
    Send { source: usize, send: usize },
}

#[derive(Debug, Default)]
struct MixPlan {
    order: Vec<usize>,
    /// Inputs of each track, indexed like `tracks`.
    feeds: Vec<Vec<Feed>>,
    /// Tracks summed into the mix.
    terminals: Vec<usize>,
}

/// Owner of the tracks and their routing.
///
/// # Example
///
/// ```rust
/// use cadenza_core::AudioBuffer;
/// use cadenza_mixer::{Router, TrackType};
///
/// let mut router = Router::new(48000.0, 4);
/// router.create_master_bus().unwrap();
/// router.add_track("gtr", "Guitar", TrackType::Audio).unwrap();
///
/// router.set_input("gtr", &AudioBuffer::from_mono(vec![1.0; 4])).unwrap();
/// router.process_block().unwrap();
/// // Two centred pan stages: 0.707 * 0.707
/// assert!((router.output().left()[0] - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug)]
pub struct Router {
    sample_rate: f32,
    block_size: usize,
    tracks: Vec<Track>,
    routes: BTreeMap<String, Vec<String>>,
    master: Option<String>,
    plan: Option<MixPlan>,
    dirty: bool,
    scratch: AudioBuffer,
    mix: AudioBuffer,
}

impl Router {
    /// Creates an empty router.
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        let block_size = block_size.max(1);
        Self {
            sample_rate,
            block_size,
            tracks: Vec::new(),
            routes: BTreeMap::new(),
            master: None,
            plan: None,
            dirty: true,
            scratch: AudioBuffer::stereo(block_size),
            mix: AudioBuffer::stereo(block_size),
        }
    }

    /// Sample rate handed to every track.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    // --- tracks ---

    /// Adds a track.
    ///
    /// When a master bus exists, new non-master tracks are routed to it.
    pub fn add_track(
        &mut self,
        id: &str,
        name: &str,
        track_type: TrackType,
    ) -> Result<&mut Track, MixerError> {
        if self.index_of(id).is_some() {
            return Err(MixerError::DuplicateTrack(id.to_owned()));
        }
        if track_type == TrackType::Master {
            if let Some(master) = &self.master {
                return Err(MixerError::MasterExists(master.clone()));
            }
            self.master = Some(id.to_owned());
        }
        self.tracks.push(Track::new(
            id,
            name,
            track_type,
            self.sample_rate,
            self.block_size,
        ));
        self.dirty = true;
        tracing::debug!(track = id, ?track_type, "track_add");

        if let Some(master) = self.master.clone() {
            if master != id {
                self.route_track(id, &master)?;
            }
        }
        let last = self.tracks.len() - 1;
        Ok(&mut self.tracks[last])
    }

    /// Creates the master bus, or returns the existing one's id.
    ///
    /// Every track that routes nowhere yet is routed to the new bus.
    pub fn create_master_bus(&mut self) -> Result<String, MixerError> {
        if let Some(master) = &self.master {
            return Ok(master.clone());
        }
        self.add_track(MASTER_ID, "Master", TrackType::Master)?;
        let orphans: Vec<String> = self
            .tracks
            .iter()
            .map(|t| t.id().to_owned())
            .filter(|id| id != MASTER_ID && self.routes_from(id).is_empty())
            .collect();
        for id in orphans {
            self.route_track(&id, MASTER_ID)?;
        }
        Ok(MASTER_ID.to_owned())
    }

    /// Id of the master bus, if one exists.
    pub fn master_id(&self) -> Option<&str> {
        self.master.as_deref()
    }

    /// Removes a track and every route, send and output target naming it.
    pub fn remove_track(&mut self, id: &str) -> Result<Track, MixerError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| MixerError::TrackNotFound(id.to_owned()))?;
        let track = self.tracks.remove(index);

        self.routes.remove(id);
        for dests in self.routes.values_mut() {
            dests.retain(|d| d != id);
        }
        let mut pruned_sends = 0usize;
        for other in &mut self.tracks {
            let before = other.sends().len();
            other.retain_sends(|send| send.destination_id != id);
            pruned_sends += before - other.sends().len();
            if other.output() == Some(id) {
                let fallback = self.routes.get(other.id()).and_then(|d| d.last()).cloned();
                other.set_output(fallback);
            }
        }
        if self.master.as_deref() == Some(id) {
            self.master = None;
        }
        self.dirty = true;
        tracing::debug!(track = id, pruned_sends, "track_remove");
        Ok(track)
    }

    /// Track by id.
    pub fn track(&self, id: &str) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    /// Mutable track by id. Invalidates the cached mix order.
    pub fn track_mut(&mut self, id: &str) -> Option<&mut Track> {
        self.dirty = true;
        self.tracks.iter_mut().find(|t| t.id() == id)
    }

    /// Tracks in creation order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Track ids in creation order.
    pub fn track_ids(&self) -> Vec<&str> {
        self.tracks.iter().map(Track::id).collect()
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Returns true if there are no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    // --- routing ---

    /// Routes `source`'s output into `destination`.
    ///
    /// Returns `Ok(false)` when the route already exists. The source's
    /// output target becomes `destination` either way.
    pub fn route_track(&mut self, source: &str, destination: &str) -> Result<bool, MixerError> {
        self.require(destination)?;
        let index = self.require(source)?;
        self.tracks[index].set_output(Some(destination.to_owned()));

        let dests = self.routes.entry(source.to_owned()).or_default();
        if dests.iter().any(|d| d == destination) {
            return Ok(false);
        }
        dests.push(destination.to_owned());
        self.dirty = true;
        tracing::debug!(source, destination, "route_add");
        Ok(true)
    }

    /// Removes a route. Returns `Ok(false)` if it did not exist.
    pub fn unroute_track(&mut self, source: &str, destination: &str) -> Result<bool, MixerError> {
        let index = self.require(source)?;
        let Some(dests) = self.routes.get_mut(source) else {
            return Ok(false);
        };
        let before = dests.len();
        dests.retain(|d| d != destination);
        if dests.len() == before {
            return Ok(false);
        }
        let fallback = dests.last().cloned();
        if self.tracks[index].output() == Some(destination) {
            self.tracks[index].set_output(fallback);
        }
        self.dirty = true;
        tracing::debug!(source, destination, "route_remove");
        Ok(true)
    }

    /// Destinations `id` is routed to, in routing order.
    pub fn routes_from(&self, id: &str) -> &[String] {
        self.routes.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Adds a send from `source` to `destination` and returns its index.
    pub fn add_send(
        &mut self,
        source: &str,
        destination: &str,
        level_db: f32,
        pre_fader: bool,
    ) -> Result<usize, MixerError> {
        self.require(destination)?;
        let index = self.require(source)?;
        self.dirty = true;
        Ok(self.tracks[index].add_send(destination, level_db, pre_fader))
    }

    /// Sets the level of `source`'s first send to `destination`.
    pub fn set_send_level(
        &mut self,
        source: &str,
        destination: &str,
        level_db: f32,
    ) -> Result<(), MixerError> {
        let index = self.require(source)?;
        let track = &mut self.tracks[index];
        let slot = track
            .sends()
            .iter()
            .position(|s| s.destination_id == destination)
            .ok_or_else(|| MixerError::SendNotFound {
                track: source.to_owned(),
                destination: destination.to_owned(),
            })?;
        if let Some(send) = track.send_mut(slot) {
            send.set_level_db(level_db);
        }
        Ok(())
    }

    /// Checks routes and enabled sends for feedback loops and dangling sends.
    ///
    /// Depth-first search from each track in creation order; the first track
    /// found on a cycle is named in the message.
    pub fn validate_routing(&self) -> RoutingReport {
        for track in &self.tracks {
            if let Some(send) = track
                .sends()
                .iter()
                .find(|s| s.enabled && self.index_of(&s.destination_id).is_none())
            {
                return RoutingReport {
                    valid: false,
                    message: format!(
                        "track '{}' sends to unknown track '{}'",
                        track.id(),
                        send.destination_id
                    ),
                };
            }
        }
        match self.find_cycle() {
            Some(id) => RoutingReport {
                valid: false,
                message: format!("routing cycle through track '{id}'"),
            },
            None => RoutingReport {
                valid: true,
                message: "routing is valid".to_owned(),
            },
        }
    }

    // --- processing ---

    /// Writes the next input block for a track. Consumed by the next
    /// [`process_block`](Self::process_block).
    pub fn set_input(&mut self, id: &str, block: &AudioBuffer) -> Result<(), MixerError> {
        let index = self.require(id)?;
        self.tracks[index].input.copy_from(block);
        Ok(())
    }

    /// Mixes one block.
    ///
    /// On a routing cycle nothing is processed and the previous mix stays in
    /// [`output`](Self::output).
    pub fn process_block(&mut self) -> Result<(), MixerError> {
        self.ensure_plan()?;
        let Some(plan) = self.plan.take() else {
            return Ok(());
        };
        let solo_active = self.tracks.iter().any(Track::is_soloed);
        let mut buffer = std::mem::take(&mut self.scratch);

        for &idx in &plan.order {
            buffer.copy_from(&self.tracks[idx].input);
            for feed in &plan.feeds[idx] {
                match *feed {
                    Feed::Route(source) => {
                        buffer.accumulate_from(self.tracks[source].post_fader(), 1.0);
                    }
                    Feed::Send { source, send } => {
                        let track = &self.tracks[source];
                        if let Some(send) = track.sends().get(send) {
                            buffer.accumulate_from(track.send_tap(send), send.gain());
                        }
                    }
                }
            }
            let track = &mut self.tracks[idx];
            let solo_muted = solo_active && !track.is_soloed() && track.track_type().is_source();
            track.render(&mut buffer, solo_muted);
            track.input.clear();
        }

        self.mix.clear();
        for &idx in &plan.terminals {
            self.mix.accumulate_from(self.tracks[idx].post_fader(), 1.0);
        }

        self.scratch = buffer;
        self.plan = Some(plan);
        Ok(())
    }

    /// The last mixed block.
    pub fn output(&self) -> &AudioBuffer {
        &self.mix
    }

    /// Clears every buffer and resets every insert.
    pub fn reset(&mut self) {
        for track in &mut self.tracks {
            track.reset();
        }
        self.mix.clear();
    }

    // --- internals ---

    fn index_of(&self, id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id() == id)
    }

    fn require(&self, id: &str) -> Result<usize, MixerError> {
        self.index_of(id)
            .ok_or_else(|| MixerError::TrackNotFound(id.to_owned()))
    }

    /// Successors of each track over routes and enabled sends.
    fn adjacency(&self) -> Vec<Vec<usize>> {
        self.tracks
            .iter()
            .map(|track| {
                let routed = self
                    .routes_from(track.id())
                    .iter()
                    .filter_map(|d| self.index_of(d));
                let sent = track
                    .sends()
                    .iter()
                    .filter(|s| s.enabled)
                    .filter_map(|s| self.index_of(&s.destination_id));
                let mut next: Vec<usize> = routed.chain(sent).collect();
                next.sort_unstable();
                next.dedup();
                next
            })
            .collect()
    }

    fn find_cycle(&self) -> Option<&str> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            New,
            Active,
            Done,
        }

        fn visit(node: usize, adjacency: &[Vec<usize>], marks: &mut [Mark]) -> Option<usize> {
            marks[node] = Mark::Active;
            for &next in &adjacency[node] {
                match marks[next] {
                    Mark::Active => return Some(next),
                    Mark::New => {
                        if let Some(found) = visit(next, adjacency, marks) {
                            return Some(found);
                        }
                    }
                    Mark::Done => {}
                }
            }
            marks[node] = Mark::Done;
            None
        }

        let adjacency = self.adjacency();
        let mut marks = vec![Mark::New; adjacency.len()];
        (0..adjacency.len())
            .find_map(|start| {
                if marks[start] == Mark::New {
                    visit(start, &adjacency, &mut marks)
                } else {
                    None
                }
            })
            .map(|idx| self.tracks[idx].id())
    }

    fn ensure_plan(&mut self) -> Result<(), MixerError> {
        if !self.dirty && self.plan.is_some() {
            return Ok(());
        }
        let adjacency = self.adjacency();
        let order = kahn_sort(&adjacency).map_err(|partial| {
            let id = self.find_cycle().unwrap_or_default().to_owned();
            tracing::warn!(
                track = %id,
                scheduled = partial.len(),
                total = adjacency.len(),
                "mix_schedule: routing cycle"
            );
            MixerError::RoutingCycle(id)
        })?;

        let mut feeds = vec![Vec::new(); self.tracks.len()];
        for (source, track) in self.tracks.iter().enumerate() {
            for dest in self.routes_from(track.id()) {
                if let Some(d) = self.index_of(dest) {
                    feeds[d].push(Feed::Route(source));
                }
            }
            for (send, s) in track.sends().iter().enumerate() {
                if let (true, Some(d)) = (s.enabled, self.index_of(&s.destination_id)) {
                    feeds[d].push(Feed::Send { source, send });
                }
            }
        }
        let terminals = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| self.routes_from(t.id()).is_empty())
            .map(|(i, _)| i)
            .collect();

        tracing::debug!(tracks = order.len(), "mix_schedule: recomputed");
        self.plan = Some(MixPlan {
            order,
            feeds,
            terminals,
        });
        self.dirty = false;
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RouterState {
    master: Option<String>,
    tracks: Vec<Value>,
    routes: BTreeMap<String, Vec<String>>,
}

impl Stateful for Router {
    fn to_dict(&self) -> Value {
        let state = RouterState {
            master: self.master.clone(),
            tracks: self.tracks.iter().map(Stateful::to_dict).collect(),
            routes: self.routes.clone(),
        };
        match serde_json::to_value(state) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "failed to serialize router");
                Value::Object(Map::new())
            }
        }
    }

    /// Replaces every track and route. Tracks without an id or with a
    /// duplicate id are skipped, as are routes naming unknown tracks.
    fn load_dict(&mut self, dict: &Value) {
        let state: RouterState = decode_or_warn("router", dict).unwrap_or_default();
        self.tracks.clear();
        self.routes.clear();
        self.master = None;

        for track_dict in &state.tracks {
            let id = track_dict.get("id").and_then(Value::as_str).unwrap_or_default();
            if id.is_empty() || self.index_of(id).is_some() {
                tracing::warn!(track = id, "skipping track without a unique id");
                continue;
            }
            let mut track = Track::new(id, "", TrackType::Audio, self.sample_rate, self.block_size);
            track.load_dict(track_dict);
            self.tracks.push(track);
        }

        for (source, dests) in state.routes {
            if self.index_of(&source).is_none() {
                tracing::warn!(track = %source, "dropping routes from unknown track");
                continue;
            }
            let known: Vec<String> = dests
                .into_iter()
                .filter(|d| self.index_of(d).is_some())
                .collect();
            if !known.is_empty() {
                self.routes.insert(source, known);
            }
        }

        self.master = state
            .master
            .filter(|id| self.index_of(id).is_some())
            .or_else(|| {
                self.tracks
                    .iter()
                    .find(|t| t.track_type() == TrackType::Master)
                    .map(|t| t.id().to_owned())
            });
        self.plan = None;
        self.dirty = true;
        self.mix.clear();
        tracing::debug!(tracks = self.tracks.len(), "router_load");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::db_to_linear;
    use serde_json::json;

    fn router() -> Router {
        Router::new(48000.0, 4)
    }

    fn ones() -> AudioBuffer {
        AudioBuffer::from_stereo(vec![1.0; 4], vec![1.0; 4])
    }

    #[test]
    fn test_add_and_duplicate() {
        let mut r = router();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        assert_eq!(
            r.add_track("a", "again", TrackType::Aux).unwrap_err(),
            MixerError::DuplicateTrack("a".into())
        );
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn test_master_bus_collects_orphans() {
        let mut r = router();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.add_track("b", "B", TrackType::Audio).unwrap();
        r.route_track("b", "a").unwrap();

        assert_eq!(r.create_master_bus().unwrap(), MASTER_ID);
        assert_eq!(r.create_master_bus().unwrap(), MASTER_ID);
        assert_eq!(r.routes_from("a"), [MASTER_ID]);
        assert_eq!(r.routes_from("b"), ["a"]);

        r.add_track("c", "C", TrackType::Instrument).unwrap();
        assert_eq!(r.track("c").unwrap().output(), Some(MASTER_ID));
        assert!(matches!(
            r.add_track("m2", "M2", TrackType::Master),
            Err(MixerError::MasterExists(_))
        ));
    }

    #[test]
    fn test_route_is_idempotent() {
        let mut r = router();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.add_track("bus", "Bus", TrackType::Aux).unwrap();
        assert!(r.route_track("a", "bus").unwrap());
        assert!(!r.route_track("a", "bus").unwrap());
        assert_eq!(r.routes_from("a").len(), 1);
        assert_eq!(
            r.route_track("a", "nope"),
            Err(MixerError::TrackNotFound("nope".into()))
        );
    }

    #[test]
    fn test_unroute_restores_previous_output() {
        let mut r = router();
        for id in ["a", "x", "y"] {
            r.add_track(id, id, TrackType::Audio).unwrap();
        }
        r.route_track("a", "x").unwrap();
        r.route_track("a", "y").unwrap();
        assert_eq!(r.track("a").unwrap().output(), Some("y"));
        assert!(r.unroute_track("a", "y").unwrap());
        assert_eq!(r.track("a").unwrap().output(), Some("x"));
        assert!(!r.unroute_track("a", "y").unwrap());
    }

    #[test]
    fn test_remove_prunes_references() {
        let mut r = router();
        r.create_master_bus().unwrap();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.add_track("fx", "FX", TrackType::Aux).unwrap();
        r.add_send("a", "fx", -6.0, false).unwrap();

        let removed = r.remove_track("fx").unwrap();
        assert_eq!(removed.id(), "fx");
        assert!(r.track("a").unwrap().sends().is_empty());
        assert!(r.validate_routing().valid);

        r.remove_track(MASTER_ID).unwrap();
        assert_eq!(r.master_id(), None);
        assert!(r.routes_from("a").is_empty());
        assert_eq!(r.track("a").unwrap().output(), None);
        assert!(r.remove_track("zzz").is_err());
    }

    #[test]
    fn test_cycle_reported_and_refused() {
        let mut r = router();
        for id in ["a", "b", "c"] {
            r.add_track(id, id, TrackType::Aux).unwrap();
        }
        r.route_track("a", "b").unwrap();
        r.route_track("b", "c").unwrap();
        assert!(r.validate_routing().valid);

        r.route_track("c", "a").unwrap();
        let report = r.validate_routing();
        assert!(!report.valid);
        assert!(report.message.contains("'a'"), "{}", report.message);
        assert_eq!(r.process_block(), Err(MixerError::RoutingCycle("a".into())));
    }

    #[test]
    fn test_send_loop_is_a_cycle() {
        let mut r = router();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.add_track("fx", "FX", TrackType::Aux).unwrap();
        r.route_track("fx", "a").unwrap();
        let idx = r.add_send("a", "fx", 0.0, true).unwrap();
        assert!(!r.validate_routing().valid);

        r.track_mut("a").unwrap().send_mut(idx).unwrap().enabled = false;
        assert!(r.validate_routing().valid);
    }

    #[test]
    fn test_dangling_send_reported() {
        let mut r = router();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.track_mut("a").unwrap().add_send("ghost", 0.0, false);
        let report = r.validate_routing();
        assert!(!report.valid);
        assert!(report.message.contains("'ghost'"));
    }

    #[test]
    fn test_send_levels_reach_aux() {
        let mut r = router();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.add_track("fx", "FX", TrackType::Aux).unwrap();
        r.track_mut("a").unwrap().set_muted(true);
        r.add_send("a", "fx", -6.0, true).unwrap();
        r.route_track("a", "fx").unwrap();

        r.set_input("a", &ones()).unwrap();
        r.process_block().unwrap();
        // Pre-fader send survives the mute; the muted route adds nothing.
        let pan = 0.5f32.sqrt();
        let expected = db_to_linear(-6.0) * pan;
        assert!((r.track("fx").unwrap().post_fader().left()[0] - expected).abs() < 1e-6);

        r.set_send_level("a", "fx", -96.0).unwrap();
        r.set_input("a", &ones()).unwrap();
        r.process_block().unwrap();
        assert!(r.output().peak() < 1e-4);
        assert!(matches!(
            r.set_send_level("fx", "a", 0.0),
            Err(MixerError::SendNotFound { .. })
        ));
    }

    #[test]
    fn test_solo_silences_other_sources() {
        let mut r = router();
        r.create_master_bus().unwrap();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.add_track("b", "B", TrackType::Audio).unwrap();
        r.track_mut("a").unwrap().set_soloed(true);

        r.set_input("a", &ones()).unwrap();
        r.set_input("b", &AudioBuffer::from_stereo(vec![0.0; 4], vec![5.0; 4]))
            .unwrap();
        r.process_block().unwrap();
        assert_eq!(r.track("b").unwrap().post_fader().peak(), 0.0);
        assert!((r.output().right().unwrap()[0] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_input_consumed_each_block() {
        let mut r = router();
        r.add_track("a", "A", TrackType::Audio).unwrap();
        r.set_input("a", &ones()).unwrap();
        r.process_block().unwrap();
        assert!(r.output().peak() > 0.0);
        r.process_block().unwrap();
        assert_eq!(r.output().peak(), 0.0);
    }

    #[test]
    fn test_state_round_trip() {
        let mut r = router();
        r.create_master_bus().unwrap();
        r.add_track("gtr", "Guitar", TrackType::Audio).unwrap();
        r.add_track("verb", "Verb", TrackType::Aux).unwrap();
        r.add_send("gtr", "verb", -9.0, false).unwrap();
        r.track_mut("gtr").unwrap().set_pan(0.4);

        let dict = r.to_dict();
        let mut restored = Router::new(48000.0, 4);
        restored.load_dict(&dict);
        assert_eq!(restored.track_ids(), ["master", "gtr", "verb"]);
        assert_eq!(restored.master_id(), Some(MASTER_ID));
        assert_eq!(restored.to_dict(), dict);
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let mut r = router();
        r.load_dict(&json!({
            "tracks": [{ "id": "a" }, { "name": "no id" }, { "id": "a" }],
            "routes": { "a": ["ghost"], "ghost": ["a"] },
        }));
        assert_eq!(r.track_ids(), ["a"]);
        assert!(r.routes_from("a").is_empty());
        assert!(r.validate_routing().valid);
    }
}
