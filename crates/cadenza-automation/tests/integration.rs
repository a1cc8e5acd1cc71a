//! Integration tests for cadenza-automation.
//!
//! Drives parameters from a running transport, the way a session does per
//! block, and checks the whole state survives a dict round trip.

use cadenza_automation::{
    AutomatedParameter, AutomationCurve, AutomationMode, AutomationPoint, Interpolation,
    ParameterTrack, Transport,
};
use cadenza_core::{LfoWaveform, Stateful};
use proptest::prelude::*;

const SR: f32 = 48000.0;
const BLOCK: u64 = 512;

// ---------------------------------------------------------------------------
// 1. Curve boundaries
// ---------------------------------------------------------------------------

#[test]
fn single_point_curve_is_flat_on_both_sides() {
    let mut curve = AutomationCurve::new(0.0);
    curve.add_point(AutomationPoint::new(1000, 0.7));
    for t in [0, 500, 999, 1000, 1001, 100_000] {
        assert_eq!(curve.value_at(t), 0.7, "t = {t}");
    }
}

#[test]
fn exact_point_times_return_point_values() {
    let mut curve = AutomationCurve::new(0.0);
    let shapes = [
        Interpolation::Linear,
        Interpolation::Exponential,
        Interpolation::Step,
        Interpolation::Smooth,
    ];
    for (i, shape) in shapes.into_iter().enumerate() {
        let value = if i % 2 == 0 { 0.2 } else { 0.9 };
        curve.add_point(AutomationPoint::with_interpolation(i as u64 * 100, value, shape));
    }
    for point in curve.points() {
        assert_eq!(curve.value_at(point.time_samples), point.value);
    }
}

// ---------------------------------------------------------------------------
// 2. Transport-driven playback
// ---------------------------------------------------------------------------

#[test]
fn fade_in_follows_transport_blocks() {
    let mut transport = Transport::new(SR);
    let mut track = ParameterTrack::new("vocals", SR);
    let fade = track.add_parameter("volume", 1.0);
    fade.curve_mut().add_point(AutomationPoint::new(0, 0.0));
    fade.curve_mut().add_point(AutomationPoint::new(SR as u64, 1.0));

    transport.play();
    let mut previous = -1.0;
    while transport.sample_pos() < SR as u64 {
        let value = track.values_at(transport.sample_pos())["volume"];
        assert!(value > previous, "fade must rise monotonically");
        previous = value;
        transport.advance(BLOCK);
        track.advance(BLOCK as usize);
    }
    assert_eq!(track.values_at(transport.sample_pos())["volume"], 1.0);
}

#[test]
fn looped_playback_repeats_automation() {
    let mut transport = Transport::new(1000.0);
    let mut param = AutomatedParameter::new("filter", 0.0, 1000.0);
    param.curve_mut().add_point(AutomationPoint::new(0, 0.0));
    param.curve_mut().add_point(AutomationPoint::new(1000, 1.0));
    transport.set_loop(true, 0.0, 1.0);
    transport.play();

    transport.advance(250);
    let first_pass = param.value_at(transport.sample_pos());
    transport.advance(1000);
    let second_pass = param.value_at(transport.sample_pos());
    assert_eq!(transport.sample_pos(), 250);
    assert_eq!(first_pass, second_pass);
}

#[test]
fn write_mode_records_then_reads_back() {
    let mut param = AutomatedParameter::new("pan", 0.5, SR);
    param.set_mode(AutomationMode::Write);
    let mut transport = Transport::new(SR);
    transport.play();

    for step in 0..8u8 {
        param.write(transport.sample_pos(), f32::from(step) / 8.0);
        transport.advance(BLOCK);
    }
    assert_eq!(param.curve().len(), 8);

    param.set_mode(AutomationMode::Read);
    assert_eq!(param.value_at(3 * BLOCK), 3.0 / 8.0);
    assert_eq!(param.value_at(100 * BLOCK), 7.0 / 8.0);
}

#[test]
fn base_value_edits_reach_reads_before_any_recording() {
    let mut param = AutomatedParameter::new("gain", 0.5, SR);
    param.set_base_value(0.8);
    assert!(!param.write(0, 0.65));
    assert_eq!(param.mode(), AutomationMode::Read);
    assert_eq!(param.value_at(10 * BLOCK), 0.65);

    // A restored parameter with no points reads its saved base value.
    let mut restored = AutomatedParameter::new("gain", 0.1, SR);
    restored.load_dict(&param.to_dict());
    assert!(restored.curve().is_empty());
    assert_eq!(restored.value_at(0), 0.65);
}

// ---------------------------------------------------------------------------
// 3. State round trip
// ---------------------------------------------------------------------------

#[test]
fn track_state_roundtrip_preserves_values() {
    let mut track = ParameterTrack::new("synth", SR);
    let cutoff = track.add_parameter("cutoff", 0.4);
    cutoff.curve_mut().add_point(AutomationPoint::with_interpolation(
        0,
        0.1,
        Interpolation::Exponential,
    ));
    cutoff.curve_mut().add_point(AutomationPoint::new(SR as u64, 0.9));
    cutoff.lfo_mut().set_waveform(LfoWaveform::Triangle);
    cutoff.set_lfo_intensity(0.1);
    track.add_parameter("drive", 0.6).set_mode(AutomationMode::Off);

    let mut restored = ParameterTrack::new("", SR);
    restored.load_dict(&track.to_dict());
    for t in (0..SR as u64).step_by(4801) {
        assert_eq!(restored.values_at(t), track.values_at(t), "t = {t}");
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Values stay in `[0, 1]` and never go NaN whatever the points,
    /// modulation and query time.
    #[test]
    fn parameter_value_in_unit_range(
        points in prop::collection::vec((0u64..100_000, -2.0f32..3.0, 0usize..4), 0..16),
        base in -1.0f32..2.0,
        lfo_intensity in 0.0f32..=1.0,
        query in 0u64..200_000,
    ) {
        let shapes = [
            Interpolation::Linear,
            Interpolation::Exponential,
            Interpolation::Step,
            Interpolation::Smooth,
        ];
        let mut param = AutomatedParameter::new("p", base, 1000.0);
        for (t, v, shape) in points {
            param.curve_mut().add_point(AutomationPoint::with_interpolation(t, v, shapes[shape]));
        }
        param.set_lfo_intensity(lfo_intensity);
        let value = param.value_at(query);
        prop_assert!((0.0..=1.0).contains(&value), "value {}", value);
    }

    /// Inserting in any order leaves points sorted with unique times.
    #[test]
    fn points_sorted_after_any_inserts(
        times in prop::collection::vec(0u64..1000, 0..64),
    ) {
        let mut curve = AutomationCurve::new(0.0);
        for t in &times {
            curve.add_point(AutomationPoint::new(*t, 0.5));
        }
        let sorted = curve.points().windows(2).all(|w| w[0].time_samples < w[1].time_samples);
        prop_assert!(sorted);
    }

    /// Between two points the value stays within their range.
    #[test]
    fn segment_value_between_endpoints(
        a in 0.0f32..=1.0,
        b in 0.0f32..=1.0,
        shape in 0usize..4,
        offset in 0u64..=1000,
    ) {
        let shapes = [
            Interpolation::Linear,
            Interpolation::Exponential,
            Interpolation::Step,
            Interpolation::Smooth,
        ];
        let mut curve = AutomationCurve::new(0.0);
        curve.add_point(AutomationPoint::with_interpolation(0, a, shapes[shape]));
        curve.add_point(AutomationPoint::new(1000, b));
        let v = curve.value_at(offset);
        prop_assert!(v >= a.min(b) - 1e-6 && v <= a.max(b) + 1e-6);
    }
}
