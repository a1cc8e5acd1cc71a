//! End-to-end behaviour of effects on whole blocks and inside the graph.

use cadenza_core::graph::AudioEngine;
use cadenza_core::{AudioBuffer, Effect, Stateful, db_to_linear};
use cadenza_effects::{Limiter, NoiseGate, Reverb, SimpleDelay, create_effect, effect_from_dict};

const SR: f32 = 44100.0;

fn impulse(len: usize) -> Vec<f32> {
    let mut samples = vec![0.0; len];
    samples[0] = 1.0;
    samples
}

fn peak_index(samples: &[f32]) -> usize {
    samples
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
        .map_or(0, |(i, _)| i)
}

#[test]
fn delay_peak_lands_at_configured_time() {
    let mut delay = SimpleDelay::new(SR);
    delay.set_time_ms(100.0);
    delay.set_feedback(0.0);
    delay.set_mix(1.0);

    let mut block = AudioBuffer::from_stereo(impulse(8192), impulse(8192));
    delay.process_block(&mut block);

    let peak = peak_index(block.left());
    assert!(peak.abs_diff(4410) <= 1, "peak at {peak}, expected 4410 ± 1");
    assert_eq!(peak_index(block.right().unwrap()), peak);
}

#[test]
fn delay_timing_survives_block_boundaries() {
    let mut delay = SimpleDelay::new(SR);
    delay.set_time_ms(100.0);
    delay.set_mix(1.0);
    delay.set_feedback(0.0);

    let signal = impulse(8192);
    let mut out = Vec::new();
    for chunk in signal.chunks(256) {
        let mut block = AudioBuffer::from_mono(chunk.to_vec());
        delay.process_block(&mut block);
        out.extend_from_slice(block.left());
    }
    assert_eq!(peak_index(&out), 4410);
}

fn reverb_tail_energy(room_size: f32) -> f32 {
    let mut reverb = Reverb::new(SR);
    reverb.set_room_size(room_size);
    reverb.set_dry_level(0.0);

    let mut block = AudioBuffer::from_stereo(impulse(SR as usize), impulse(SR as usize));
    reverb.process_block(&mut block);
    // Skip the first 50 ms so only the decaying tail counts.
    block.left()[2205..].iter().map(|x| x * x).sum()
}

#[test]
fn reverb_tail_grows_with_room_size() {
    let energies: Vec<f32> = [0.1, 0.4, 0.7, 0.95]
        .into_iter()
        .map(reverb_tail_energy)
        .collect();
    for pair in energies.windows(2) {
        assert!(pair[1] > pair[0], "tail energy not monotonic: {energies:?}");
    }
}

#[test]
fn noise_gate_hysteresis_holds_between_thresholds() {
    let mut gate = NoiseGate::new(SR);
    gate.set_thresholds_db(-35.0, -40.0);

    let square = |db: f32, seconds: f32| {
        let amp = db_to_linear(db);
        (0..(seconds * SR) as usize).map(move |i| if i % 2 == 0 { amp } else { -amp })
    };

    for x in square(-20.0, 0.1) {
        gate.process(x);
    }
    assert!(gate.is_open());
    assert_eq!(gate.toggle_count(), 1);

    // Wander between the two thresholds: never below close, so no chatter.
    for _ in 0..10 {
        for x in square(-33.0, 0.02).chain(square(-37.0, 0.02)) {
            gate.process(x);
        }
    }
    assert!(gate.is_open());
    assert_eq!(gate.toggle_count(), 1);

    for x in square(-70.0, 0.3) {
        gate.process(x);
    }
    assert!(!gate.is_open());
    assert_eq!(gate.toggle_count(), 2);
}

#[test]
fn limiter_latency_matches_reported() {
    let mut limiter = Limiter::new(SR);
    let latency = limiter.latency_samples();
    let mut block = AudioBuffer::from_mono(impulse(1024).into_iter().map(|x| x * 0.5).collect());
    limiter.process_block(&mut block);
    assert_eq!(peak_index(block.left()), latency);
}

#[test]
fn effect_chain_in_graph_stays_bounded() {
    let mut engine = AudioEngine::new(SR, 512);
    let input = engine.add_input("in");
    let comp = engine.add_effect("comp", create_effect("compressor", SR).unwrap());
    let verb = engine.add_effect("verb", create_effect("hall_reverb", SR).unwrap());
    let limit = engine.add_effect("limit", create_effect("limiter", SR).unwrap());
    let out = engine.add_output("out");
    engine.connect(input, comp).unwrap();
    engine.connect(comp, verb).unwrap();
    engine.connect(verb, limit).unwrap();
    engine.connect(limit, out).unwrap();
    engine.start();

    let ceiling = db_to_linear(-1.0);
    for block_idx in 0..20 {
        let left: Vec<f32> = (0..512)
            .map(|i| ((block_idx * 512 + i) as f32 * 0.05).sin() * 0.9)
            .collect();
        let right = left.iter().map(|x| -x).collect();
        engine.set_input(input, &AudioBuffer::from_stereo(left, right)).unwrap();
        engine.process_block().unwrap();

        let mix = engine.output(out).unwrap();
        assert!(mix.is_stereo());
        assert!(mix.peak() <= ceiling + 1e-5, "block {block_idx} peak {}", mix.peak());
    }
}

#[test]
fn snapshot_restores_running_chain() {
    let mut original = create_effect("ping_pong_delay", SR).unwrap();
    let warmup = AudioBuffer::from_stereo(impulse(2000), vec![0.0; 2000]);
    let mut block = warmup.clone();
    original.process_block(&mut block);

    let mut restored = effect_from_dict(&original.snapshot(), SR).unwrap();

    let mut a = AudioBuffer::stereo(20000);
    let mut b = AudioBuffer::stereo(20000);
    original.process_block(&mut a);
    restored.process_block(&mut b);
    assert_eq!(a, b);
    assert!(a.peak() > 0.0, "the pending echo should play out after restore");
}
