//! State capture and restore.
//!
//! Every effect, track, router and automation object implements [`Stateful`],
//! producing a JSON-compatible [`Value`]. Effect dicts share one layout:
//!
//! ```json
//! { "type": "simple_delay", "enabled": true, "params": { ... } }
//! ```
//!
//! with an extra `"buffers"` array in [`Stateful::snapshot`] output for
//! effects that own delay lines. Loading never fails: missing or malformed
//! fields fall back to defaults and a warning is logged.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::DelayLine;

/// Round-trippable parameter state.
pub trait Stateful {
    /// Captures every tunable parameter.
    fn to_dict(&self) -> Value;

    /// Restores from a dict produced by [`to_dict`](Self::to_dict) or
    /// [`snapshot`](Self::snapshot). Unknown or malformed input resets the
    /// affected fields to their defaults.
    fn load_dict(&mut self, dict: &Value);

    /// Like [`to_dict`](Self::to_dict) but also captures internal buffer
    /// contents where the object has any.
    fn snapshot(&self) -> Value {
        self.to_dict()
    }
}

/// Builds the common effect dict layout.
pub fn effect_dict<P: Serialize>(kind: &str, enabled: bool, params: &P) -> Value {
    let params = match serde_json::to_value(params) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(kind, %err, "failed to serialize effect params");
            Value::Object(Map::new())
        }
    };
    json!({
        "type": kind,
        "enabled": enabled,
        "params": params,
    })
}

/// Decodes `"params"` and `"enabled"` from an effect dict.
///
/// A missing or malformed `"params"` object yields `P::default()`; individual
/// missing fields are filled by the struct's `#[serde(default)]`.
pub fn decode_effect<P>(kind: &str, dict: &Value) -> (P, bool)
where
    P: DeserializeOwned + Default,
{
    if let Some(found) = dict.get("type").and_then(Value::as_str) {
        if found != kind {
            tracing::warn!(expected = kind, found, "effect dict type mismatch");
        }
    }

    let enabled = dict.get("enabled").and_then(Value::as_bool).unwrap_or(true);

    let params = match dict.get("params") {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_else(|err| {
            tracing::warn!(kind, %err, "malformed effect params, using defaults");
            P::default()
        }),
        None => {
            tracing::warn!(kind, "effect dict has no params, using defaults");
            P::default()
        }
    };

    (params, enabled)
}

/// Deserializes a whole object from `value`, logging a warning on failure.
///
/// Used by non-effect objects whose dict is the serde form of a settings
/// struct.
pub fn decode_or_warn<T: DeserializeOwned>(what: &str, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!(what, %err, "malformed state, using defaults");
            None
        }
    }
}

/// Captured contents of one delay line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BufferState {
    /// Samples in storage order.
    pub samples: Vec<f32>,
    /// Write head position.
    pub write_pos: usize,
}

impl From<&DelayLine> for BufferState {
    fn from(line: &DelayLine) -> Self {
        Self {
            samples: line.contents().to_vec(),
            write_pos: line.write_pos(),
        }
    }
}

/// Adds a `"buffers"` array to `dict`.
pub fn attach_buffers<'a>(dict: &mut Value, lines: impl IntoIterator<Item = &'a DelayLine>) {
    let buffers: Vec<BufferState> = lines.into_iter().map(BufferState::from).collect();
    if let (Some(map), Ok(value)) = (dict.as_object_mut(), serde_json::to_value(buffers)) {
        map.insert("buffers".to_owned(), value);
    }
}

/// Restores delay lines from a dict's `"buffers"` array, if present.
///
/// Lines are matched by position. A count or length mismatch restores what
/// fits and logs a warning.
pub fn restore_buffers<'a>(
    kind: &str,
    dict: &Value,
    lines: impl IntoIterator<Item = &'a mut DelayLine>,
) {
    let Some(value) = dict.get("buffers") else {
        return;
    };
    let states: Vec<BufferState> = match serde_json::from_value(value.clone()) {
        Ok(states) => states,
        Err(err) => {
            tracing::warn!(kind, %err, "malformed buffer state ignored");
            return;
        }
    };

    let mut restored = 0;
    for (line, state) in lines.into_iter().zip(&states) {
        if !line.restore(&state.samples, state.write_pos) {
            tracing::warn!(kind, "buffer length changed since capture");
        }
        restored += 1;
    }
    if restored != states.len() {
        tracing::warn!(kind, restored, captured = states.len(), "buffer count mismatch");
    }
}
