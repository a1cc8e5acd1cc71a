//! Criterion benchmarks for the audio graph engine.
//!
//! Measures scheduling and per-block overhead with a trivial gain effect so
//! DSP cost does not dominate.
//!
//! Run with: `cargo bench -p cadenza-core`
#![allow(missing_docs)]

use cadenza_core::graph::AudioEngine;
use cadenza_core::{AudioBuffer, Effect, Stateful};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];
const CHAIN_LENGTHS: &[usize] = &[1, 8, 32];

struct Gain(f32);

impl Stateful for Gain {
    fn to_dict(&self) -> Value {
        json!({ "type": "gain", "enabled": true, "params": { "gain": self.0 } })
    }

    fn load_dict(&mut self, _dict: &Value) {}
}

impl Effect for Gain {
    fn kind(&self) -> &'static str {
        "gain"
    }

    fn process(&mut self, input: f32) -> f32 {
        input * self.0
    }

    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (left * self.0, right * self.0)
    }

    fn is_enabled(&self) -> bool {
        true
    }

    fn set_enabled(&mut self, _enabled: bool) {}

    fn reset(&mut self) {}
}

fn linear_engine(length: usize, block_size: usize) -> AudioEngine {
    let mut engine = AudioEngine::new(SAMPLE_RATE, block_size);
    let input = engine.add_input("in");
    let mut prev = input;
    for i in 0..length {
        let node = engine.add_effect(format!("gain{i}"), Box::new(Gain(0.99)));
        engine.connect(prev, node).unwrap();
        prev = node;
    }
    let output = engine.add_output("out");
    engine.connect(prev, output).unwrap();
    let signal: Vec<f32> = (0..block_size)
        .map(|i| (i as f32 * 0.01).sin() * 0.5)
        .collect();
    engine
        .set_input(input, &AudioBuffer::from_mono(signal))
        .unwrap();
    engine.start();
    engine
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/schedule");
    for &length in CHAIN_LENGTHS {
        group.bench_with_input(BenchmarkId::new("kahn", length), &length, |b, &length| {
            b.iter_batched(
                || linear_engine(length, 64),
                |mut engine| black_box(engine.topological_sort().unwrap().len()),
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph/process_block");
    for &length in CHAIN_LENGTHS {
        for &block_size in BLOCK_SIZES {
            let id = format!("{length}x{block_size}");
            group.bench_function(BenchmarkId::new("chain", id), |b| {
                let mut engine = linear_engine(length, block_size);
                b.iter(|| engine.process_block().unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_schedule, bench_process);
criterion_main!(benches);
