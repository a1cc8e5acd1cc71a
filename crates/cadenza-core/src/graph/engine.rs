//! The audio graph engine.
//!
//! [`AudioEngine`] is the sole owner of graph topology: an arena of node slots,
//! each carrying its node, its ordered downstream list and a pre-allocated
//! output buffer. Topology edits set a dirty flag; the schedule is recomputed
//! only when needed and then reused block after block.

use super::schedule::{Schedule, kahn_sort};
use super::{GraphError, Node, NodeId, NodeKind};
use crate::{AudioBuffer, Effect};

struct NodeSlot {
    node: Node,
    /// Successors in connection order.
    downstream: Vec<NodeId>,
    /// Output of the last processed block.
    buffer: AudioBuffer,
    /// Externally written block, `AudioInput` nodes only.
    external: Option<AudioBuffer>,
}

/// Block-synchronous graph processor.
///
/// Each block, every node's input is the sum of its upstream nodes' outputs.
/// Nodes run in topological order, so an upstream buffer is always complete
/// before anything reads it. All buffers are stereo and sized to
/// `block_size` at node creation; [`process_block`](Self::process_block)
/// does not allocate once the schedule is cached.
pub struct AudioEngine {
    slots: Vec<Option<NodeSlot>>,
    schedule: Option<Schedule>,
    dirty: bool,
    running: bool,
    sample_rate: f32,
    block_size: usize,
}

impl AudioEngine {
    /// Creates an empty, stopped engine.
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            slots: Vec::new(),
            schedule: None,
            dirty: true,
            running: false,
            sample_rate,
            block_size: block_size.max(1),
        }
    }

    /// Sample rate the engine was created with.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Samples per block.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Adds a node and returns its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        let external = matches!(node.kind(), NodeKind::AudioInput)
            .then(|| AudioBuffer::stereo(self.block_size));
        tracing::debug!("graph_add: {} '{}' as {id}", node.kind().label(), node.name());
        self.slots.push(Some(NodeSlot {
            node,
            downstream: Vec::new(),
            buffer: AudioBuffer::stereo(self.block_size),
            external,
        }));
        self.dirty = true;
        id
    }

    /// Adds an `AudioInput` node.
    pub fn add_input(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(Node::new(name, NodeKind::AudioInput))
    }

    /// Adds an `Fx` node wrapping `effect`.
    pub fn add_effect(&mut self, name: impl Into<String>, effect: Box<dyn Effect>) -> NodeId {
        self.add_node(Node::new(name, NodeKind::Fx(effect)))
    }

    /// Adds a `MixerBus` node with a linear gain.
    pub fn add_bus(&mut self, name: impl Into<String>, gain: f32) -> NodeId {
        self.add_node(Node::new(name, NodeKind::MixerBus { gain }))
    }

    /// Adds an `Output` node.
    pub fn add_output(&mut self, name: impl Into<String>) -> NodeId {
        self.add_node(Node::new(name, NodeKind::Output))
    }

    /// Removes a node together with every edge into or out of it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node, GraphError> {
        let slot = self
            .slots
            .get_mut(id.0 as usize)
            .and_then(Option::take)
            .ok_or(GraphError::NodeNotFound(id))?;

        let mut pruned = 0usize;
        for other in self.slots.iter_mut().flatten() {
            let before = other.downstream.len();
            other.downstream.retain(|&to| to != id);
            pruned += before - other.downstream.len();
        }

        self.dirty = true;
        tracing::debug!(
            "graph_remove: {id} ('{}'), pruned {pruned} incoming edges",
            slot.node.name()
        );
        Ok(slot.node)
    }

    /// Connects `from → to`.
    ///
    /// Returns `Ok(false)` when the edge already exists. Cycles are not
    /// rejected here; they surface from the next schedule computation.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<bool, GraphError> {
        self.slot(to)?;
        let slot = self.slot_mut(from)?;
        if slot.downstream.contains(&to) {
            return Ok(false);
        }
        slot.downstream.push(to);
        self.dirty = true;
        tracing::debug!("graph_connect: {from} → {to}");
        Ok(true)
    }

    /// Removes the edge `from → to`. Returns `Ok(false)` if it did not exist.
    pub fn disconnect(&mut self, from: NodeId, to: NodeId) -> Result<bool, GraphError> {
        self.slot(to)?;
        let slot = self.slot_mut(from)?;
        let before = slot.downstream.len();
        slot.downstream.retain(|&t| t != to);
        let removed = slot.downstream.len() != before;
        if removed {
            self.dirty = true;
            tracing::debug!("graph_disconnect: {from} → {to}");
        }
        Ok(removed)
    }

    /// Successors of `id` in connection order.
    pub fn downstream(&self, id: NodeId) -> Option<&[NodeId]> {
        self.slots
            .get(id.0 as usize)?
            .as_ref()
            .map(|slot| slot.downstream.as_slice())
    }

    /// Returns true if the node exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_ok()
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.slots.iter().flatten().map(|s| s.downstream.len()).sum()
    }

    /// Shared access to a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.slot(id).ok().map(|slot| &slot.node)
    }

    /// Mutable access to a node.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slot_mut(id).ok().map(|slot| &mut slot.node)
    }

    /// Mutable access to the effect inside an `Fx` node.
    pub fn effect_mut(&mut self, id: NodeId) -> Option<&mut dyn Effect> {
        self.node_mut(id).and_then(Node::effect_mut)
    }

    /// Iterates live nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|s| (NodeId(i as u32), &s.node)))
    }

    /// Computes (or returns the cached) processing order.
    ///
    /// # Errors
    ///
    /// [`GraphError::CycleDetected`] if the graph is not a DAG.
    pub fn topological_sort(&mut self) -> Result<Vec<NodeId>, GraphError> {
        self.ensure_schedule()?;
        Ok(self
            .schedule
            .as_ref()
            .map(|s| s.order.clone())
            .unwrap_or_default())
    }

    /// The cached schedule, if it is current.
    pub fn schedule(&self) -> Option<&Schedule> {
        if self.dirty { None } else { self.schedule.as_ref() }
    }

    /// Writes the next block for an `AudioInput` node.
    ///
    /// Mono input is duplicated to both channels.
    pub fn set_input(&mut self, id: NodeId, block: &AudioBuffer) -> Result<(), GraphError> {
        let slot = self.slot_mut(id)?;
        match slot.external.as_mut() {
            Some(external) => {
                external.copy_from(block);
                Ok(())
            }
            None => Err(GraphError::NotAnInput(id)),
        }
    }

    /// The most recent block produced by a node.
    pub fn output(&self, id: NodeId) -> Option<&AudioBuffer> {
        self.slot(id).ok().map(|slot| &slot.buffer)
    }

    /// Sets the running flag; processing resumes at the next block.
    pub fn start(&mut self) {
        self.running = true;
        tracing::debug!("engine_start");
    }

    /// Clears the running flag; takes effect at the next block boundary.
    pub fn stop(&mut self) {
        self.running = false;
        tracing::debug!("engine_stop");
    }

    /// Returns true between [`start`](Self::start) and [`stop`](Self::stop).
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Processes one block through the whole graph.
    ///
    /// A no-op while stopped. On a cycle nothing is processed and the error
    /// is returned; node outputs keep their previous contents.
    pub fn process_block(&mut self) -> Result<(), GraphError> {
        if !self.running {
            return Ok(());
        }
        self.ensure_schedule()?;
        let Some(schedule) = self.schedule.take() else {
            return Ok(());
        };

        for (step, id) in schedule.order.iter().enumerate() {
            let idx = id.0 as usize;
            let Some(slot) = self.slots[idx].as_mut() else {
                continue;
            };
            let mut buffer = std::mem::take(&mut slot.buffer);
            buffer.clear();
            if let Some(external) = slot.external.as_ref() {
                buffer.accumulate_from(external, 1.0);
            }

            for &up in &schedule.upstream[step] {
                if let Some(source) = self.slots[up].as_ref() {
                    buffer.accumulate_from(&source.buffer, 1.0);
                }
            }

            if let Some(slot) = self.slots[idx].as_mut() {
                slot.node.process(&mut buffer);
                slot.buffer = buffer;
            }
        }

        self.schedule = Some(schedule);
        Ok(())
    }

    /// Clears every buffer and resets all effects.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut().flatten() {
            slot.buffer.clear();
            if let Some(external) = slot.external.as_mut() {
                external.clear();
            }
            slot.node.reset();
        }
    }

    fn ensure_schedule(&mut self) -> Result<(), GraphError> {
        if !self.dirty && self.schedule.is_some() {
            return Ok(());
        }

        let live: Vec<usize> = (0..self.slots.len())
            .filter(|&i| self.slots[i].is_some())
            .collect();
        let mut dense = vec![usize::MAX; self.slots.len()];
        for (d, &i) in live.iter().enumerate() {
            dense[i] = d;
        }

        let adjacency: Vec<Vec<usize>> = live
            .iter()
            .map(|&i| {
                self.slots[i].as_ref().map_or_else(Vec::new, |slot| {
                    slot.downstream
                        .iter()
                        .map(|to| dense[to.0 as usize])
                        .collect()
                })
            })
            .collect();

        let order = kahn_sort(&adjacency).map_err(|partial| {
            tracing::debug!(
                "graph_sort: cycle, {} of {} nodes scheduled",
                partial.len(),
                live.len()
            );
            GraphError::CycleDetected {
                unscheduled: live.len() - partial.len(),
                total: live.len(),
            }
        })?;

        let mut upstream: Vec<Vec<usize>> = vec![Vec::new(); self.slots.len()];
        for &i in &live {
            if let Some(slot) = self.slots[i].as_ref() {
                for to in &slot.downstream {
                    upstream[to.0 as usize].push(i);
                }
            }
        }

        let order: Vec<NodeId> = order.into_iter().map(|d| NodeId(live[d] as u32)).collect();
        let upstream = order
            .iter()
            .map(|id| std::mem::take(&mut upstream[id.0 as usize]))
            .collect();

        tracing::debug!("graph_sort: {} nodes in topo order", order.len());
        self.schedule = Some(Schedule { order, upstream });
        self.dirty = false;
        Ok(())
    }

    fn slot(&self, id: NodeId) -> Result<&NodeSlot, GraphError> {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .ok_or(GraphError::NodeNotFound(id))
    }

    fn slot_mut(&mut self, id: NodeId) -> Result<&mut NodeSlot, GraphError> {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .ok_or(GraphError::NodeNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stateful;
    use serde_json::{Value, json};

    struct Invert {
        enabled: bool,
    }

    impl Stateful for Invert {
        fn to_dict(&self) -> Value {
            json!({ "type": "invert", "enabled": self.enabled, "params": {} })
        }

        fn load_dict(&mut self, _dict: &Value) {}
    }

    impl Effect for Invert {
        fn kind(&self) -> &'static str {
            "invert"
        }

        fn process(&mut self, input: f32) -> f32 {
            -input
        }

        fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
            (-left, -right)
        }

        fn is_enabled(&self) -> bool {
            self.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn reset(&mut self) {}
    }

    fn chain() -> (AudioEngine, [NodeId; 4]) {
        let mut engine = AudioEngine::new(48000.0, 4);
        // Insert out of order so id order differs from topo order
        let output = engine.add_output("out");
        let bus = engine.add_bus("bus", 0.5);
        let fx = engine.add_effect("fx", Box::new(Invert { enabled: true }));
        let input = engine.add_input("in");
        engine.connect(input, fx).unwrap();
        engine.connect(fx, bus).unwrap();
        engine.connect(bus, output).unwrap();
        (engine, [input, fx, bus, output])
    }

    #[test]
    fn test_topological_order() {
        let (mut engine, [input, fx, bus, output]) = chain();
        let order = engine.topological_sort().unwrap();
        let pos = |id| order.iter().position(|&n| n == id).unwrap();
        assert!(pos(input) < pos(fx));
        assert!(pos(fx) < pos(bus));
        assert!(pos(bus) < pos(output));
    }

    #[test]
    fn test_connect_idempotent() {
        let (mut engine, [input, fx, ..]) = chain();
        assert_eq!(engine.connect(input, fx), Ok(false));
        assert_eq!(engine.downstream(input), Some(&[fx][..]));
        assert_eq!(engine.edge_count(), 3);
    }

    #[test]
    fn test_connect_unknown_node() {
        let mut engine = AudioEngine::new(48000.0, 4);
        let a = engine.add_input("a");
        let b = engine.add_output("b");
        engine.remove_node(b).unwrap();
        assert_eq!(engine.connect(a, b), Err(GraphError::NodeNotFound(b)));
    }

    #[test]
    fn test_cycle_detected() {
        let (mut engine, [_, fx, bus, _]) = chain();
        engine.connect(bus, fx).unwrap();
        assert!(matches!(
            engine.topological_sort(),
            Err(GraphError::CycleDetected { .. })
        ));

        engine.start();
        assert!(engine.process_block().is_err());

        engine.disconnect(bus, fx).unwrap();
        assert!(engine.topological_sort().is_ok());
    }

    #[test]
    fn test_remove_prunes_incoming() {
        let (mut engine, [input, fx, bus, _]) = chain();
        engine.remove_node(fx).unwrap();
        assert_eq!(engine.downstream(input), Some(&[][..]));
        assert!(!engine.contains(fx));
        assert_eq!(engine.node_count(), 3);
        assert!(engine.topological_sort().unwrap().contains(&bus));
        assert_eq!(engine.remove_node(fx).err(), Some(GraphError::NodeNotFound(fx)));
    }

    #[test]
    fn test_process_chain() {
        let (mut engine, [input, _, _, output]) = chain();
        engine
            .set_input(input, &AudioBuffer::from_mono(vec![1.0, 0.5, 0.0, -1.0]))
            .unwrap();
        engine.start();
        engine.process_block().unwrap();

        let out = engine.output(output).unwrap();
        assert_eq!(out.left(), &[-0.5, -0.25, 0.0, 0.5]);
        assert_eq!(out.right(), Some(&[-0.5, -0.25, 0.0, 0.5][..]));
    }

    #[test]
    fn test_stopped_engine_is_noop() {
        let (mut engine, [input, _, _, output]) = chain();
        engine
            .set_input(input, &AudioBuffer::from_mono(vec![1.0; 4]))
            .unwrap();
        engine.process_block().unwrap();
        assert_eq!(engine.output(output).unwrap().peak(), 0.0);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_fan_in_sums() {
        let mut engine = AudioEngine::new(48000.0, 2);
        let a = engine.add_input("a");
        let b = engine.add_input("b");
        let out = engine.add_output("out");
        engine.connect(a, out).unwrap();
        engine.connect(b, out).unwrap();
        engine.set_input(a, &AudioBuffer::from_mono(vec![0.25, 0.25])).unwrap();
        engine.set_input(b, &AudioBuffer::from_mono(vec![0.5, -0.25])).unwrap();
        engine.start();
        engine.process_block().unwrap();
        assert_eq!(engine.output(out).unwrap().left(), &[0.75, 0.0]);
    }

    #[test]
    fn test_schedule_cached_until_edit() {
        let (mut engine, [input, _, bus, _]) = chain();
        assert!(engine.schedule().is_none());
        engine.topological_sort().unwrap();
        assert_eq!(engine.schedule().map(Schedule::len), Some(4));

        engine.connect(input, bus).unwrap();
        assert!(engine.schedule().is_none(), "edit should invalidate schedule");
    }

    #[test]
    fn test_set_input_rejects_non_input() {
        let (mut engine, [_, fx, ..]) = chain();
        assert_eq!(
            engine.set_input(fx, &AudioBuffer::mono(4)),
            Err(GraphError::NotAnInput(fx))
        );
    }
}
