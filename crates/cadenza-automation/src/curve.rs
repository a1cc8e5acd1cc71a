//! Breakpoint automation curves.
//!
//! A curve is a list of [`AutomationPoint`]s kept sorted by time. Each
//! point's [`Interpolation`] shapes the segment that starts at it:
//!
//! | Mode | Shape on `t ∈ [0, 1]` |
//! |------|------------------------|
//! | `Linear` | `t` |
//! | `Exponential` | `t²` |
//! | `Step` | `0` before the segment midpoint, `1` from it on |
//! | `Smooth` | `3t² - 2t³` |
//!
//! Before the first point the curve holds the first value, after the last
//! point it holds the last value, and an empty curve returns its default.

use cadenza_core::{Stateful, decode_or_warn, lerp, smoothstep};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Segment shape between two points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    /// Straight line.
    #[default]
    Linear,
    /// Slow start, fast finish.
    Exponential,
    /// Holds the start value until the temporal midpoint, then jumps.
    Step,
    /// Smoothstep ease in and out.
    Smooth,
}

impl Interpolation {
    /// Blends from `a` to `b` at position `t ∈ [0, 1]`.
    #[inline]
    pub fn blend(self, a: f32, b: f32, t: f32) -> f32 {
        let shaped = match self {
            Self::Linear => t,
            Self::Exponential => t * t,
            Self::Step => {
                if t < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
            Self::Smooth => smoothstep(t),
        };
        lerp(a, b, shaped)
    }
}

/// One breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    /// Position in samples.
    pub time_samples: u64,
    /// Normalized value in `[0, 1]`.
    pub value: f32,
    /// Shape of the segment starting here.
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl AutomationPoint {
    /// Creates a linear point, clamping `value` to `[0, 1]`.
    pub fn new(time_samples: u64, value: f32) -> Self {
        Self::with_interpolation(time_samples, value, Interpolation::Linear)
    }

    /// Creates a point with an explicit segment shape.
    pub fn with_interpolation(time_samples: u64, value: f32, interpolation: Interpolation) -> Self {
        Self {
            time_samples,
            value: clamp_value(value),
            interpolation,
        }
    }
}

#[inline]
fn clamp_value(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Time-sorted breakpoint curve.
///
/// # Example
///
/// ```rust
/// use cadenza_automation::{AutomationCurve, AutomationPoint, Interpolation};
///
/// let mut curve = AutomationCurve::new(0.5);
/// curve.add_point(AutomationPoint::new(0, 0.0));
/// curve.add_point(AutomationPoint::new(1000, 1.0));
/// assert_eq!(curve.value_at(500), 0.5);
///
/// curve.add_point(AutomationPoint::with_interpolation(0, 0.0, Interpolation::Step));
/// assert_eq!(curve.value_at(499), 0.0);
/// assert_eq!(curve.value_at(500), 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationCurve {
    points: Vec<AutomationPoint>,
    default_value: f32,
}

impl Default for AutomationCurve {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl AutomationCurve {
    /// Creates an empty curve that reads `default_value`.
    pub fn new(default_value: f32) -> Self {
        Self {
            points: Vec::new(),
            default_value: clamp_value(default_value),
        }
    }

    /// Value returned while the curve has no points.
    pub fn default_value(&self) -> f32 {
        self.default_value
    }

    /// Sets the empty-curve value, clamped to `[0, 1]`.
    pub fn set_default_value(&mut self, value: f32) {
        self.default_value = clamp_value(value);
    }

    /// Points in time order.
    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Inserts a point, keeping time order, and returns its index.
    ///
    /// A point already at the same time is replaced.
    pub fn add_point(&mut self, point: AutomationPoint) -> usize {
        let point = AutomationPoint::with_interpolation(
            point.time_samples,
            point.value,
            point.interpolation,
        );
        let index = self.points.partition_point(|p| p.time_samples < point.time_samples);
        match self.points.get_mut(index) {
            Some(existing) if existing.time_samples == point.time_samples => *existing = point,
            _ => self.points.insert(index, point),
        }
        index
    }

    /// Removes the point at `index`.
    pub fn remove_point(&mut self, index: usize) -> Option<AutomationPoint> {
        (index < self.points.len()).then(|| self.points.remove(index))
    }

    /// Moves the point at `index` to a new time and value, keeping its
    /// interpolation. Returns the point's new index.
    pub fn move_point(&mut self, index: usize, time_samples: u64, value: f32) -> Option<usize> {
        let old = self.remove_point(index)?;
        Some(self.add_point(AutomationPoint::with_interpolation(
            time_samples,
            value,
            old.interpolation,
        )))
    }

    /// Removes every point.
    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Evaluates the curve at `time_samples`.
    pub fn value_at(&self, time_samples: u64) -> f32 {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return self.default_value;
        };
        if time_samples <= first.time_samples {
            return first.value;
        }
        if time_samples >= last.time_samples {
            return last.value;
        }

        let next = self.points.partition_point(|p| p.time_samples <= time_samples);
        let (a, b) = (&self.points[next - 1], &self.points[next]);
        let span = (b.time_samples - a.time_samples) as f64;
        let t = ((time_samples - a.time_samples) as f64 / span) as f32;
        a.interpolation.blend(a.value, b.value, t)
    }

    /// Re-establishes the sorted, clamped, unique-time invariants after a
    /// deserialize.
    fn normalize(&mut self) {
        self.default_value = clamp_value(self.default_value);
        for point in &mut self.points {
            point.value = clamp_value(point.value);
        }
        self.points.sort_by_key(|p| p.time_samples);
        // Later duplicates win, matching add_point.
        self.points.reverse();
        self.points.dedup_by_key(|p| p.time_samples);
        self.points.reverse();
    }
}

impl Stateful for AutomationCurve {
    fn to_dict(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    fn load_dict(&mut self, dict: &Value) {
        *self = decode_or_warn("automation curve", dict).unwrap_or_default();
        self.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point(interpolation: Interpolation) -> AutomationCurve {
        let mut curve = AutomationCurve::new(0.0);
        curve.add_point(AutomationPoint::with_interpolation(100, 0.0, interpolation));
        curve.add_point(AutomationPoint::new(200, 1.0));
        curve
    }

    #[test]
    fn test_empty_returns_default() {
        let curve = AutomationCurve::new(0.3);
        assert_eq!(curve.value_at(0), 0.3);
        assert_eq!(curve.value_at(u64::MAX), 0.3);
    }

    #[test]
    fn test_single_point_holds_everywhere() {
        let mut curve = AutomationCurve::new(0.0);
        curve.add_point(AutomationPoint::new(1000, 0.7));
        assert_eq!(curve.value_at(0), 0.7);
        assert_eq!(curve.value_at(999), 0.7);
        assert_eq!(curve.value_at(1000), 0.7);
        assert_eq!(curve.value_at(5000), 0.7);
    }

    #[test]
    fn test_interpolation_shapes() {
        assert_eq!(two_point(Interpolation::Linear).value_at(150), 0.5);
        assert_eq!(two_point(Interpolation::Exponential).value_at(150), 0.25);
        assert_eq!(two_point(Interpolation::Smooth).value_at(150), 0.5);
        assert!(two_point(Interpolation::Smooth).value_at(125) < 0.25);

        let step = two_point(Interpolation::Step);
        assert_eq!(step.value_at(149), 0.0);
        assert_eq!(step.value_at(150), 1.0);
        assert_eq!(step.value_at(199), 1.0);
    }

    #[test]
    fn test_outside_range_holds_ends() {
        let curve = two_point(Interpolation::Linear);
        assert_eq!(curve.value_at(0), 0.0);
        assert_eq!(curve.value_at(10_000), 1.0);
    }

    #[test]
    fn test_points_stay_sorted() {
        let mut curve = AutomationCurve::new(0.0);
        for t in [500, 100, 300, 200, 400] {
            curve.add_point(AutomationPoint::new(t, t as f32 / 1000.0));
        }
        let times: Vec<u64> = curve.points().iter().map(|p| p.time_samples).collect();
        assert_eq!(times, [100, 200, 300, 400, 500]);

        let moved = curve.move_point(0, 450, 0.9).unwrap();
        assert_eq!(moved, 3);
        let times: Vec<u64> = curve.points().iter().map(|p| p.time_samples).collect();
        assert_eq!(times, [200, 300, 400, 450, 500]);
    }

    #[test]
    fn test_same_time_replaces() {
        let mut curve = AutomationCurve::new(0.0);
        curve.add_point(AutomationPoint::new(10, 0.2));
        curve.add_point(AutomationPoint::new(10, 0.8));
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.value_at(10), 0.8);
    }

    #[test]
    fn test_values_clamped() {
        let mut curve = AutomationCurve::new(4.0);
        assert_eq!(curve.default_value(), 1.0);
        curve.add_point(AutomationPoint::new(0, -3.0));
        assert_eq!(curve.points()[0].value, 0.0);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut curve = two_point(Interpolation::Linear);
        assert!(curve.remove_point(5).is_none());
        assert_eq!(curve.remove_point(0).map(|p| p.time_samples), Some(100));
        assert!(curve.move_point(3, 0, 0.0).is_none());
        curve.clear();
        assert!(curve.is_empty());
    }

    #[test]
    fn test_dict_roundtrip_and_repair() {
        let curve = two_point(Interpolation::Smooth);
        let mut restored = AutomationCurve::default();
        restored.load_dict(&curve.to_dict());
        assert_eq!(restored, curve);

        let unsorted = serde_json::json!({
            "points": [
                { "time_samples": 50, "value": 2.0 },
                { "time_samples": 10, "value": 0.5, "interpolation": "step" }
            ],
            "default_value": 0.1
        });
        restored.load_dict(&unsorted);
        assert_eq!(restored.points()[0].time_samples, 10);
        assert_eq!(restored.points()[0].interpolation, Interpolation::Step);
        assert_eq!(restored.points()[1].value, 1.0);

        restored.load_dict(&serde_json::json!(42));
        assert!(restored.is_empty());
    }
}
