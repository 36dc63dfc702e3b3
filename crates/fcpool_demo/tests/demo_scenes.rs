//! # Demo Scene Tests
//!
//! Both scenes driven through the public API, the way the binary drives them.
//!
//! Run with: cargo test -p fcpool_demo --test demo_scenes

use std::time::Duration;

use fcpool_core::ObjectPool;
use fcpool_demo::{
    ChestSpawner, CoinsConfig, DemoEvent, DemoLayouts, EventBus, RunnerConfig, RunnerGame,
};

const FRAME: Duration = Duration::from_micros(16_666);

fn runner_events(seed: u64, frames: u32) -> Vec<DemoEvent> {
    let bus = EventBus::new(16_384);
    let layouts = DemoLayouts::embedded().unwrap().with_seed(seed);
    let config = RunnerConfig {
        seed,
        ..RunnerConfig::default()
    };
    let mut game = RunnerGame::new(config, &layouts, bus.sender()).unwrap();
    game.start();
    for _ in 0..frames {
        game.tick(FRAME);
    }
    bus.receiver().drain()
}

#[test]
fn runner_is_reproducible_with_a_seed() {
    let first = runner_events(77, 1_800);
    let second = runner_events(77, 1_800);
    assert!(first
        .iter()
        .any(|e| matches!(e, DemoEvent::ObstacleSpawned { .. })));
    assert_eq!(first, second);
}

#[test]
fn runner_never_shows_the_same_cloud_twice_in_a_row() {
    let events = runner_events(5, 3_600);
    let clouds: Vec<&String> = events
        .iter()
        .filter_map(|e| match e {
            DemoEvent::CloudSpawned { kind, .. } => Some(kind),
            _ => None,
        })
        .collect();
    assert!(clouds.len() > 10);
    assert!(clouds.windows(2).all(|pair| pair[0] != pair[1]));
}

#[test]
fn runner_obstacles_speed_up_with_boosts() {
    let events = runner_events(1, 3_600);
    let speeds: Vec<f32> = events
        .iter()
        .filter_map(|e| match e {
            DemoEvent::ObstacleSpawned { speed, .. } => Some(speed.abs()),
            _ => None,
        })
        .collect();
    assert!(speeds.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(speeds.last() > speeds.first());
}

#[test]
fn runner_keeps_birds_within_their_pool() {
    let bus = EventBus::new(16_384);
    let layouts = DemoLayouts::embedded().unwrap().with_seed(12);
    let mut game = RunnerGame::new(RunnerConfig::default(), &layouts, bus.sender()).unwrap();
    game.start();
    for _ in 0..7_200 {
        game.tick(FRAME);
        let birds = game
            .active_obstacles()
            .iter()
            .filter(|o| o.kind == "Bird")
            .count();
        assert!(birds <= 2);
    }
}

#[test]
fn coins_scene_round_trip() {
    let bus = EventBus::new(16_384);
    let layouts = DemoLayouts::embedded().unwrap().with_seed(8);
    let mut spawner = ChestSpawner::new(CoinsConfig::default(), &layouts, bus.sender()).unwrap();

    // More chests than the pool was filled with: the pool grows.
    let chests: Vec<_> = (0..7)
        .map(|i| spawner.spawn_chest([i as f32, 2.0]).unwrap())
        .collect();
    assert_eq!(spawner.chests().stats().total, 7);
    assert_eq!(spawner.chests().stats().grown, 2);

    spawner.hold(chests[0]);
    for _ in 0..60 {
        spawner.tick(FRAME);
    }
    spawner.unspawn(chests[0]);
    for _ in 0..240 {
        spawner.tick(FRAME);
    }

    let events = bus.receiver().drain();
    let spilled = events
        .iter()
        .filter(|e| matches!(e, DemoEvent::CoinSpawned { chest, .. } if *chest == chests[0]))
        .count();
    assert!(spilled >= 5);
    assert_eq!(spawner.coins_out(chests[0]), 0);
    assert!(events.contains(&DemoEvent::ChestUnspawned { chest: chests[0] }));

    // The returned chest is handed out again, coins and all.
    let again = spawner.spawn_chest([0.0, 2.0]).unwrap();
    assert_eq!(again, chests[0]);
    assert_eq!(spawner.coins_out(again), 0);
}
