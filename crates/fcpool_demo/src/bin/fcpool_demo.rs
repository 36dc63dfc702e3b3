//! # FC Pool Demo
//!
//! Runs both demo scenes headlessly and prints what the pools did.
//!
//! ```bash
//! # Default: 60 simulated seconds, shipped layouts
//! ./fcpool_demo
//!
//! # 120 seconds, layouts from a directory
//! ./fcpool_demo 120 data/pools
//! ```

use std::collections::BTreeMap;
use std::process::ExitCode;
use std::time::Duration;

use fcpool_core::ObjectPool;
use fcpool_demo::{
    ChestSpawner, CoinsConfig, DemoEvent, DemoLayouts, DemoResult, EventBus, RunnerConfig,
    RunnerGame,
};

/// Fixed simulation step, 60 FPS.
const FRAME: Duration = Duration::from_micros(16_666);

/// Seed for both scenes and every pool.
const SEED: u64 = 2024;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let seconds: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60);
    let layouts = match args.next() {
        Some(dir) => DemoLayouts::from_dir(dir),
        None => DemoLayouts::embedded(),
    };

    match layouts.and_then(|layouts| run(&layouts.with_seed(SEED), seconds)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fcpool_demo: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(layouts: &DemoLayouts, seconds: u32) -> DemoResult<()> {
    let frames = seconds * 60;

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                      FC POOL DEMO v0.1.0");
    println!("                 {seconds} simulated seconds per scene");
    println!("═══════════════════════════════════════════════════════════════════");

    // =========================================================================
    // RUNNER: run until the scripted hit at two thirds of the time
    // =========================================================================
    let bus = EventBus::new(16_384);
    let receiver = bus.receiver();
    let config = RunnerConfig {
        seed: SEED,
        ..RunnerConfig::default()
    };
    let mut game = RunnerGame::new(config, layouts, bus.sender())?;
    game.start();

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut kinds: BTreeMap<String, usize> = BTreeMap::new();
    for frame in 0..frames {
        if frame == frames * 2 / 3 {
            game.hit();
        }
        game.tick(FRAME);
        for event in receiver.drain() {
            if let DemoEvent::ObstacleSpawned { kind, .. } = &event {
                *kinds.entry(kind.clone()).or_default() += 1;
            }
            *counts.entry(event_name(&event)).or_default() += 1;
        }
    }

    let obstacles = game.obstacles().stats();
    let clouds = game.clouds().stats();
    println!("\n[RUNNER]");
    println!(
        "  score {:>6}   high score {:>6}   speed {:>5.2}",
        game.score(),
        game.high_score(),
        game.speed()
    );
    println!(
        "  obstacles  total {:>3}  active {:>3}  grown {:>3}",
        obstacles.total, obstacles.active, obstacles.grown
    );
    println!(
        "  clouds     total {:>3}  active {:>3}  grown {:>3}",
        clouds.total, clouds.active, clouds.grown
    );
    for (kind, count) in &kinds {
        println!("  spawned {kind:<14} {count:>5}");
    }
    print_counts(&counts);
    game.shutdown();

    // =========================================================================
    // COINS: three chests, hold each open in turn, unspawn the middle one
    // =========================================================================
    let bus = EventBus::new(16_384);
    let receiver = bus.receiver();
    let config = CoinsConfig {
        seed: SEED,
        ..CoinsConfig::default()
    };
    let mut spawner = ChestSpawner::new(config, layouts, bus.sender())?;
    let chests: Vec<_> = [[-4.0, 3.0], [0.0, 3.0], [4.0, 3.0]]
        .into_iter()
        .filter_map(|position| spawner.spawn_chest(position))
        .collect();

    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut coins: BTreeMap<String, usize> = BTreeMap::new();
    let turn = (frames / 4).max(1);
    for frame in 0..frames {
        let slot = (frame / turn) as usize;
        if frame % turn == 0 {
            spawner.release();
            if let Some(&chest) = chests.get(slot) {
                spawner.hold(chest);
            }
        }
        if frame == turn * 2 + turn / 2 {
            if let Some(&chest) = chests.get(1) {
                spawner.unspawn(chest);
            }
        }
        spawner.tick(FRAME);
        for event in receiver.drain() {
            if let DemoEvent::CoinSpawned { kind, .. } = &event {
                *coins.entry(kind.clone()).or_default() += 1;
            }
            *counts.entry(event_name(&event)).or_default() += 1;
        }
    }

    let stats = spawner.chests().stats();
    println!("\n[COINS]");
    println!("  chests     total {:>3}  active {:>3}", stats.total, stats.active);
    for (index, chest) in chests.iter().enumerate() {
        println!("  chest {index} coins out {:>4}", spawner.coins_out(*chest));
    }
    for (kind, count) in &coins {
        println!("  spilled {kind:<14} {count:>5}");
    }
    print_counts(&counts);
    spawner.shutdown();

    println!("\n═══════════════════════════════════════════════════════════════════");
    Ok(())
}

fn event_name(event: &DemoEvent) -> &'static str {
    match event {
        DemoEvent::RunStarted => "run started",
        DemoEvent::ObstacleSpawned { .. } => "obstacle spawned",
        DemoEvent::CloudSpawned { .. } => "cloud spawned",
        DemoEvent::SpeedBoosted { .. } => "speed boosted",
        DemoEvent::ScoreChanged { .. } => "score changed",
        DemoEvent::PlayerHit { .. } => "player hit",
        DemoEvent::ChestSpawned { .. } => "chest spawned",
        DemoEvent::CoinSpawned { .. } => "coin spawned",
        DemoEvent::CoinsExpired { .. } => "coins expired",
        DemoEvent::ChestUnspawned { .. } => "chest unspawned",
    }
}

fn print_counts(counts: &BTreeMap<&'static str, usize>) {
    for (name, count) in counts {
        println!("  event {name:<18} {count:>6}");
    }
}
