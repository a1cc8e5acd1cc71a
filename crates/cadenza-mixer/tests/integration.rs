//! Integration tests for cadenza-mixer.
//!
//! Routing topologies are built through the public `Router` API and checked
//! for cycle detection, processing order and level bookkeeping.

use cadenza_core::{AudioBuffer, Stateful, db_to_linear};
use cadenza_effects::create_effect;
use cadenza_mixer::{MixerError, Router, TrackType};
use proptest::prelude::*;

const SR: f32 = 48000.0;
const BLOCK: usize = 64;

fn dc(level: f32) -> AudioBuffer {
    AudioBuffer::from_stereo(vec![level; BLOCK], vec![level; BLOCK])
}

// ---------------------------------------------------------------------------
// 1. Cycle detection
// ---------------------------------------------------------------------------

#[test]
fn three_track_loop_is_invalid() {
    let mut router = Router::new(SR, BLOCK);
    for id in ["A", "B", "C"] {
        router.add_track(id, id, TrackType::Aux).unwrap();
    }
    router.route_track("A", "B").unwrap();
    router.route_track("B", "C").unwrap();
    router.route_track("C", "A").unwrap();

    let report = router.validate_routing();
    assert!(!report.valid);
    assert!(report.message.contains("'A'"), "{}", report.message);
    assert_eq!(
        router.process_block(),
        Err(MixerError::RoutingCycle("A".into()))
    );

    // Breaking the loop makes the graph schedulable again.
    assert!(router.unroute_track("C", "A").unwrap());
    assert!(router.validate_routing().valid);
    assert!(router.process_block().is_ok());
}

#[test]
fn self_route_is_a_cycle() {
    let mut router = Router::new(SR, BLOCK);
    router.add_track("solo", "Solo", TrackType::Audio).unwrap();
    router.route_track("solo", "solo").unwrap();
    let report = router.validate_routing();
    assert!(!report.valid);
    assert!(report.message.contains("'solo'"));
}

// ---------------------------------------------------------------------------
// 2. Processing order
// ---------------------------------------------------------------------------

#[test]
fn chain_created_backwards_still_flows_in_one_block() {
    let mut router = Router::new(SR, BLOCK);
    for id in ["out", "bus", "src"] {
        router.add_track(id, id, TrackType::Aux).unwrap();
        router.track_mut(id).unwrap().set_pan(-1.0);
    }
    router.route_track("src", "bus").unwrap();
    router.route_track("bus", "out").unwrap();
    router.track_mut("bus").unwrap().set_volume(-6.0);

    router.set_input("src", &dc(0.5)).unwrap();
    router.process_block().unwrap();

    // Hard-left pan passes the left channel at unity.
    let expected = 0.5 * db_to_linear(-6.0);
    assert!((router.output().left()[0] - expected).abs() < 1e-6);
    assert!(router.output().right().unwrap()[0].abs() < 1e-6);
}

#[test]
fn aux_return_sums_with_dry_path() {
    let mut router = Router::new(SR, BLOCK);
    router.create_master_bus().unwrap();
    router.add_track("dry", "Dry", TrackType::Audio).unwrap();
    router.add_track("fx", "FX", TrackType::Aux).unwrap();
    router.add_send("dry", "fx", 0.0, true).unwrap();
    for id in ["dry", "fx", "master"] {
        router.track_mut(id).unwrap().set_pan(-1.0);
    }
    router
        .track_mut("fx")
        .unwrap()
        .add_insert(create_effect("gain", SR).unwrap());

    router.set_input("dry", &dc(0.25)).unwrap();
    router.process_block().unwrap();
    assert!((router.output().left()[0] - 0.5).abs() < 1e-6);
}

#[test]
fn track_state_survives_router_round_trip() {
    let mut router = Router::new(SR, BLOCK);
    router.create_master_bus().unwrap();
    router.add_track("keys", "Keys", TrackType::Instrument).unwrap();
    {
        let keys = router.track_mut("keys").unwrap();
        keys.add_insert(create_effect("chorus", SR).unwrap());
        keys.add_insert(create_effect("plate_reverb", SR).unwrap());
        keys.set_volume(-4.5);
        keys.set_phase_flip(true);
    }
    let dict = router.to_dict();

    let mut restored = Router::new(SR, BLOCK);
    restored.load_dict(&dict);
    let keys = restored.track("keys").unwrap();
    assert_eq!(keys.insert_kinds(), ["chorus", "reverb"]);
    assert_eq!(keys.volume_db(), -4.5);
    assert!(keys.phase_invert());
    assert_eq!(keys.output(), Some("master"));
    assert!(restored.validate_routing().valid);
}

// ---------------------------------------------------------------------------
// 3. Properties
// ---------------------------------------------------------------------------

fn build(count: usize, edges: &[(usize, usize)]) -> Router {
    let mut router = Router::new(SR, 16);
    for i in 0..count {
        router
            .add_track(&format!("t{i}"), "", TrackType::Aux)
            .unwrap();
    }
    for &(from, to) in edges {
        router
            .route_track(&format!("t{}", from % count), &format!("t{}", to % count))
            .unwrap();
    }
    router
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Routes that only point to later tracks can never loop.
    #[test]
    fn forward_routes_always_validate(
        count in 2usize..8,
        edges in prop::collection::vec((0usize..8, 0usize..8), 0..20),
    ) {
        let forward: Vec<(usize, usize)> = edges
            .into_iter()
            .map(|(a, b)| (a % count, b % count))
            .filter(|(a, b)| a < b)
            .collect();
        let mut router = build(count, &forward);
        prop_assert!(router.validate_routing().valid);
        prop_assert!(router.process_block().is_ok());
    }

    /// Validation and mixing always agree about cycles.
    #[test]
    fn validation_matches_scheduling(
        count in 1usize..7,
        edges in prop::collection::vec((0usize..7, 0usize..7), 0..16),
    ) {
        let mut router = build(count, &edges);
        let report = router.validate_routing();
        let mixed = router.process_block();
        prop_assert_eq!(report.valid, mixed.is_ok(), "{}", report.message);
        if let Err(MixerError::RoutingCycle(id)) = mixed {
            let quoted = format!("'{id}'");
            prop_assert!(report.message.contains(&quoted));
        }
    }
}
