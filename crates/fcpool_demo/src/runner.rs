//! # Runner Scene
//!
//! An endless runner without a window. Obstacles come from a multi-type pool
//! and scroll from the spawn point to the end point, clouds float by in the
//! background from a second pool, the scrolling speeds up every few seconds
//! and the score grows by one per second until the player is hit.
//!
//! ```text
//!   end_x                                   spawn_x
//!     │   <── obstacles ──   <── clouds ──     │
//! ────┴────────────────────────────────────────┴────
//! ```

use std::time::Duration;

use fcpool_core::{
    InstanceId, MultiTypePool, ObjectPool, PoolContainers, Poolable, Prototype, PrototypeCatalog,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{require_finite, require_non_negative, require_positive, DemoResult};
use crate::events::{DemoEvent, EventSender};
use crate::layouts::DemoLayouts;

/// Tunables of the runner scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Initial scrolling speed, units per second.
    pub speed: f32,
    /// Added to the speed on every boost.
    pub boost: f32,
    /// Seconds between boosts.
    pub time_to_boost: f32,
    /// Base seconds between obstacles; each gap is drawn from 0.75x to 2x.
    pub spawn_rate: f32,
    /// Where obstacles and clouds appear.
    pub spawn_x: f32,
    /// Where obstacles and clouds go back to their pool.
    pub end_x: f32,
    /// Seconds between clouds.
    pub cloud_interval: f32,
    /// Base cloud speed; each cloud gets 0.5x to 1.5x of it.
    pub cloud_speed: f32,
    /// Base cloud scale; each cloud gets 0.95x to 1.25x of it.
    pub cloud_scale: f32,
    /// Clouds start up to this far above or below the spawn height.
    pub cloud_randomize_y: f32,
    /// Clouds spread over the sky when the scene starts.
    pub prewarm_clouds: usize,
    /// Seed of the scene's own randomness.
    pub seed: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            boost: 0.25,
            time_to_boost: 5.0,
            spawn_rate: 2.0,
            spawn_x: 12.0,
            end_x: -12.0,
            cloud_interval: 3.0,
            cloud_speed: 1.0,
            cloud_scale: 10.0,
            cloud_randomize_y: 5.0,
            prewarm_clouds: 6,
            seed: 0,
        }
    }
}

impl RunnerConfig {
    /// Parses and validates scene settings; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or an out-of-range setting.
    pub fn from_toml_str(source: &str) -> DemoResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every timer is positive and every value finite.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::OutOfRange`](crate::DemoError::OutOfRange) naming
    /// the first bad setting.
    pub fn validate(&self) -> DemoResult<()> {
        require_finite("speed", self.speed)?;
        require_finite("boost", self.boost)?;
        require_positive("time_to_boost", self.time_to_boost)?;
        require_positive("spawn_rate", self.spawn_rate)?;
        require_finite("spawn_x", self.spawn_x)?;
        require_finite("end_x", self.end_x)?;
        require_positive("cloud_interval", self.cloud_interval)?;
        require_finite("cloud_speed", self.cloud_speed)?;
        require_positive("cloud_scale", self.cloud_scale)?;
        require_non_negative("cloud_randomize_y", self.cloud_randomize_y)
    }
}

/// A pooled obstacle.
#[derive(Clone, Debug, PartialEq)]
pub struct Obstacle {
    /// Prototype name.
    pub kind: String,
    /// Horizontal position.
    pub x: f32,
    /// Uniform scale.
    pub scale: f32,
    speed: f32,
    end_x: f32,
}

impl Obstacle {
    fn new(prototype: &Prototype) -> Self {
        Self {
            kind: prototype.name.clone(),
            x: 0.0,
            scale: 1.0,
            speed: 0.0,
            end_x: 0.0,
        }
    }

    fn start_move(&mut self, x: f32, speed: f32, end_x: f32) {
        self.x = x;
        self.speed = speed;
        self.end_x = end_x;
    }

    /// Whether the obstacle went past its end point.
    #[must_use]
    pub fn passed_end(&self) -> bool {
        if self.speed > 0.0 {
            self.x > self.end_x
        } else {
            self.x < self.end_x
        }
    }
}

impl Poolable for Obstacle {}

/// A pooled background cloud.
#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    /// Prototype name.
    pub kind: String,
    /// Position.
    pub position: [f32; 2],
    /// Uniform scale.
    pub scale: f32,
    speed: f32,
    end_x: f32,
}

impl Cloud {
    fn new(prototype: &Prototype) -> Self {
        Self {
            kind: prototype.name.clone(),
            position: [0.0, 0.0],
            scale: 1.0,
            speed: 0.0,
            end_x: 0.0,
        }
    }

    fn passed_end(&self) -> bool {
        if self.speed > 0.0 {
            self.position[0] > self.end_x
        } else {
            self.position[0] < self.end_x
        }
    }
}

impl Poolable for Cloud {}

/// Pool of runner obstacles.
pub type ObstaclePool = MultiTypePool<Obstacle, fn(&Prototype) -> Obstacle>;
/// Pool of background clouds.
pub type CloudPool = MultiTypePool<Cloud, fn(&Prototype) -> Cloud>;

/// The runner scene.
pub struct RunnerGame {
    config: RunnerConfig,
    obstacles: ObstaclePool,
    clouds: CloudPool,
    obstacle_containers: PoolContainers<Obstacle>,
    cloud_containers: PoolContainers<Cloud>,
    events: EventSender,
    rng: ChaCha8Rng,
    clock: Duration,
    speed: f32,
    score: u32,
    high_score: u32,
    stopped: bool,
    next_spawn: Duration,
    next_boost: Duration,
    next_score: Duration,
    next_cloud: Duration,
}

impl RunnerGame {
    /// Builds the scene, fills both pools and prewarms the sky. The run
    /// itself waits for [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Returns an error when `config` does not [`validate`](RunnerConfig::validate).
    pub fn new(
        config: RunnerConfig,
        layouts: &DemoLayouts,
        events: EventSender,
    ) -> DemoResult<Self> {
        config.validate()?;
        let mut catalog = PrototypeCatalog::new();
        let mut obstacle_containers = PoolContainers::new();
        let mut cloud_containers = PoolContainers::new();
        let obstacles = MultiTypePool::from_settings(
            &layouts.obstacles,
            &mut catalog,
            Obstacle::new as fn(&Prototype) -> Obstacle,
            &mut obstacle_containers,
        );
        let clouds = MultiTypePool::from_settings(
            &layouts.clouds,
            &mut catalog,
            Cloud::new as fn(&Prototype) -> Cloud,
            &mut cloud_containers,
        );

        let mut game = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            speed: config.speed,
            next_cloud: Duration::from_secs_f32(config.cloud_interval),
            config,
            obstacles,
            clouds,
            obstacle_containers,
            cloud_containers,
            events,
            clock: Duration::ZERO,
            score: 0,
            high_score: 0,
            stopped: true,
            next_spawn: Duration::ZERO,
            next_boost: Duration::ZERO,
            next_score: Duration::ZERO,
        };
        game.prewarm();
        Ok(game)
    }

    /// Starts a run.
    pub fn start(&mut self) {
        self.stopped = false;
        self.next_spawn = self.clock + Duration::from_secs_f32(self.config.spawn_rate);
        self.next_boost = self.clock + Duration::from_secs_f32(self.config.time_to_boost);
        self.next_score = self.clock;
        self.events.send(DemoEvent::RunStarted);
        debug!(speed = self.speed, "run started");
    }

    /// Puts every obstacle back and resets score and speed. The high score
    /// survives; call [`start`](Self::start) to run again.
    pub fn restart(&mut self) {
        self.obstacles.update_active(|_, _| false);
        self.score = 0;
        self.speed = self.config.speed;
        self.stopped = true;
    }

    /// The player hit an obstacle.
    pub fn hit(&mut self) {
        if self.stopped {
            return;
        }
        self.high_score = self.high_score.max(self.score);
        self.stopped = true;
        self.events.send(DemoEvent::PlayerHit {
            score: self.score,
            high_score: self.high_score,
        });
        debug!(score = self.score, high_score = self.high_score, "player hit");
    }

    /// Advances the scene by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        self.clock += dt;
        let step = dt.as_secs_f32();

        if !self.stopped {
            if self.clock >= self.next_score {
                self.score += 1;
                self.next_score = self.clock + Duration::from_secs(1);
                self.events.send(DemoEvent::ScoreChanged { score: self.score });
            }
            if self.clock > self.next_spawn {
                self.spawn_obstacle();
            }
            if self.clock > self.next_boost {
                self.boost_speed();
            }
        }

        // Stopped obstacles freeze in place but still leave past the end.
        let moving = !self.stopped;
        self.obstacles.update_active(|_, obstacle| {
            if moving {
                obstacle.x += obstacle.speed * step;
            }
            !obstacle.passed_end()
        });

        if self.clock > self.next_cloud {
            self.next_cloud = self.clock + Duration::from_secs_f32(self.config.cloud_interval);
            self.spawn_cloud(self.config.spawn_x);
        }
        self.clouds.update_active(|_, cloud| {
            cloud.position[0] += cloud.speed * step;
            !cloud.passed_end()
        });
    }

    fn spawn_obstacle(&mut self) {
        let gap = self
            .rng
            .gen_range(0.75 * self.config.spawn_rate..2.0 * self.config.spawn_rate);
        self.next_spawn = self.clock + Duration::from_secs_f32(gap);

        let Some(id) = self.obstacles.acquire() else {
            debug!("no obstacle available");
            return;
        };
        let speed = self.direction() * self.speed;
        let scale = self.rng.gen_range(0.75..1.25);
        let (spawn_x, end_x) = (self.config.spawn_x, self.config.end_x);
        let kind = self.obstacles.with_instance_mut(id, |obstacle| {
            obstacle.start_move(spawn_x, speed, end_x);
            obstacle.scale = scale;
            obstacle.kind.clone()
        });
        self.obstacles.activate(id, self.clock);
        if let Some(kind) = kind {
            self.events.send(DemoEvent::ObstacleSpawned {
                instance: id,
                kind,
                speed,
            });
        }
    }

    fn spawn_cloud(&mut self, x: f32) -> Option<InstanceId> {
        let id = self.clouds.acquire()?;
        let base_y = 0.0;
        let y = self.rng.gen_range(
            base_y - self.config.cloud_randomize_y..=base_y + self.config.cloud_randomize_y,
        );
        let scale = self
            .rng
            .gen_range(0.95 * self.config.cloud_scale..1.25 * self.config.cloud_scale);
        let speed = self.rng.gen_range(0.5..1.5) * self.direction() * self.config.cloud_speed;
        let end_x = self.config.end_x;
        let kind = self.clouds.with_instance_mut(id, |cloud| {
            cloud.position = [x, y];
            cloud.scale = scale;
            cloud.speed = speed;
            cloud.end_x = end_x;
            cloud.kind.clone()
        })?;
        self.clouds.activate(id, self.clock);
        self.events.send(DemoEvent::CloudSpawned { instance: id, kind });
        Some(id)
    }

    fn prewarm(&mut self) {
        let count = self.config.prewarm_clouds;
        if count == 0 {
            return;
        }
        let length = (self.config.end_x - self.config.spawn_x).abs();
        for i in 0..count {
            let offset = length / count as f32 * i as f32;
            self.spawn_cloud(self.config.spawn_x + self.direction() * offset);
        }
    }

    fn boost_speed(&mut self) {
        self.next_boost = self.clock + Duration::from_secs_f32(self.config.time_to_boost);
        self.speed += self.config.boost;
        self.events.send(DemoEvent::SpeedBoosted { speed: self.speed });
    }

    /// +1 when the end point lies to the right of the spawn point.
    fn direction(&self) -> f32 {
        if self.config.end_x > self.config.spawn_x {
            1.0
        } else {
            -1.0
        }
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Best score of every finished run.
    #[must_use]
    pub const fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Current scrolling speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Whether no run is in progress.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Simulation time.
    #[must_use]
    pub const fn clock(&self) -> Duration {
        self.clock
    }

    /// Obstacle pool.
    #[must_use]
    pub const fn obstacles(&self) -> &ObstaclePool {
        &self.obstacles
    }

    /// Cloud pool.
    #[must_use]
    pub const fn clouds(&self) -> &CloudPool {
        &self.clouds
    }

    /// Active obstacles with their positions.
    #[must_use]
    pub fn active_obstacles(&self) -> Vec<Obstacle> {
        let registry = self.obstacles.registry().lock();
        registry
            .iter()
            .filter(|(_, slot)| slot.is_active())
            .map(|(_, slot)| slot.object().clone())
            .collect()
    }

    /// Tears both pools down.
    pub fn shutdown(&mut self) {
        self.obstacles.destroy(&mut self.obstacle_containers);
        self.clouds.destroy(&mut self.cloud_containers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;
    use crate::events::EventBus;

    const FRAME: Duration = Duration::from_millis(50);

    fn game() -> (RunnerGame, EventBus) {
        let bus = EventBus::new(4096);
        let layouts = DemoLayouts::embedded().unwrap().with_seed(9);
        let game = RunnerGame::new(RunnerConfig::default(), &layouts, bus.sender()).unwrap();
        (game, bus)
    }

    fn run_for(game: &mut RunnerGame, seconds: u64) {
        for _ in 0..seconds * 20 {
            game.tick(FRAME);
        }
    }

    #[test]
    fn test_settings_reject_unusable_timers() {
        let config = RunnerConfig::from_toml_str("speed = 7.0\nseed = 4\n").unwrap();
        assert!((config.speed - 7.0).abs() < f32::EPSILON);
        assert!((config.spawn_rate - RunnerConfig::default().spawn_rate).abs() < f32::EPSILON);

        for (source, field) in [
            ("spawn_rate = 0.0", "spawn_rate"),
            ("time_to_boost = -1.0", "time_to_boost"),
            ("cloud_interval = nan", "cloud_interval"),
            ("cloud_scale = 0.0", "cloud_scale"),
            ("cloud_randomize_y = -2.0", "cloud_randomize_y"),
            ("speed = inf", "speed"),
        ] {
            assert!(
                matches!(
                    RunnerConfig::from_toml_str(source),
                    Err(DemoError::OutOfRange { field: f, .. }) if f == field
                ),
                "{source}"
            );
        }
    }

    #[test]
    fn test_new_refuses_zero_spawn_rate() {
        let bus = EventBus::new(16);
        let layouts = DemoLayouts::embedded().unwrap();
        let config = RunnerConfig {
            spawn_rate: 0.0,
            ..RunnerConfig::default()
        };
        assert!(RunnerGame::new(config, &layouts, bus.sender()).is_err());
    }

    #[test]
    fn test_waits_for_start() {
        let (mut game, _bus) = game();
        run_for(&mut game, 5);
        assert_eq!(game.score(), 0);
        assert!(game.active_obstacles().is_empty());
    }

    #[test]
    fn test_prewarm_fills_sky() {
        let (game, bus) = game();
        let clouds = bus
            .receiver()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, DemoEvent::CloudSpawned { .. }))
            .count();
        assert_eq!(clouds, RunnerConfig::default().prewarm_clouds);
        assert_eq!(game.clouds().stats().active, clouds);
    }

    #[test]
    fn test_score_and_boosts() {
        let (mut game, _bus) = game();
        game.start();
        run_for(&mut game, 11);
        assert!((11..=12).contains(&game.score()), "score {}", game.score());
        // Boosts at just after 5 s and 10 s.
        assert!((game.speed() - 5.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_obstacles_move_left_and_recycle() {
        let (mut game, _bus) = game();
        game.start();
        run_for(&mut game, 3);
        let first = game.active_obstacles();
        assert!(!first.is_empty());
        assert!(first.iter().all(|o| o.x < RunnerConfig::default().spawn_x));

        run_for(&mut game, 60);
        let stats = game.obstacles().stats();
        // Obstacles cross the screen in under five seconds, so the pool
        // never needs more than a handful at once.
        assert!(stats.active <= 6, "{stats:?}");
        assert!(game.active_obstacles().iter().all(|o| !o.passed_end()));
    }

    #[test]
    fn test_hit_records_high_score_and_freezes() {
        let (mut game, bus) = game();
        game.start();
        run_for(&mut game, 4);
        game.hit();
        assert!(game.is_stopped());
        assert_eq!(game.high_score(), game.score());

        let frozen = game.active_obstacles();
        run_for(&mut game, 2);
        assert_eq!(game.active_obstacles(), frozen);
        assert!(bus
            .receiver()
            .drain()
            .iter()
            .any(|e| matches!(e, DemoEvent::PlayerHit { .. })));

        game.restart();
        assert_eq!(game.score(), 0);
        assert_eq!(game.obstacles().stats().active, 0);
        game.start();
        run_for(&mut game, 1);
        game.hit();
        assert!(game.high_score() > game.score());
    }
}
