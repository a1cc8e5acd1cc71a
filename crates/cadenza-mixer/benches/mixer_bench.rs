//! Criterion benchmarks for the mix loop
//!
//! Run with: cargo bench -p cadenza-mixer
#![allow(missing_docs)]

use cadenza_core::AudioBuffer;
use cadenza_effects::create_effect;
use cadenza_mixer::{Router, TrackType};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK_SIZES: &[usize] = &[64, 256, 1024];

fn generate_block(size: usize) -> AudioBuffer {
    let left: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
    let right = left.iter().map(|x| -x).collect();
    AudioBuffer::from_stereo(left, right)
}

/// Eight source tracks with a compressor each, one reverb aux, master.
fn session(block_size: usize) -> Router {
    let mut router = Router::new(SAMPLE_RATE, block_size);
    router.create_master_bus().unwrap();
    router.add_track("aux", "Aux", TrackType::Aux).unwrap();
    router
        .track_mut("aux")
        .unwrap()
        .add_insert(create_effect("hall_reverb", SAMPLE_RATE).unwrap());
    for i in 0..8 {
        let id = format!("t{i}");
        let track = router.add_track(&id, &id, TrackType::Audio).unwrap();
        track.add_insert(create_effect("compressor", SAMPLE_RATE).unwrap());
        router.add_send(&id, "aux", -12.0, false).unwrap();
    }
    router
}

fn bench_router(c: &mut Criterion) {
    let mut group = c.benchmark_group("router_8_tracks");
    for &size in BLOCK_SIZES {
        let block = generate_block(size);
        let mut router = session(size);
        let ids: Vec<String> = (0..8).map(|i| format!("t{i}")).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                for id in &ids {
                    router.set_input(id, &block).unwrap();
                }
                router.process_block().unwrap();
                black_box(router.output().peak())
            })
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let router = session(256);
    c.bench_function("validate_routing", |b| {
        b.iter(|| black_box(router.validate_routing()))
    });
}

criterion_group!(benches, bench_router, bench_validate);
criterion_main!(benches);
