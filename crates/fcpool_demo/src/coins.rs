//! # Coins Scene
//!
//! Chests are dropped into the level from a single-type pool. Each chest owns
//! a multi-type pool of coins in a private registry; holding a chest open
//! spills a coin every few frames, coins vanish after their lifetime, and
//! unspawning a chest sends its coins back with it.

use std::time::Duration;

use fcpool_core::{
    InstanceId, MultiTypePool, ObjectPool, PoolContainers, PoolSettings, Poolable, Prototype,
    PrototypeCatalog, PrototypeProvider, SingleTypePool,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{require_finite, require_non_negative, require_positive, DemoResult};
use crate::events::{DemoEvent, EventSender};
use crate::layouts::DemoLayouts;

const GRAVITY: f32 = 9.81;

/// Tunables of the coins scene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinsConfig {
    /// Impulse given to a dropped chest.
    pub chest_impulse: f32,
    /// Impulse given to a spilled coin.
    pub coin_impulse: f32,
    /// Seconds between coins while a chest is held open.
    pub coin_interval: f32,
    /// Seconds a coin stays before it returns to its chest.
    pub coin_lifetime: f32,
    /// Seed of the scene's own randomness.
    pub seed: u64,
}

impl Default for CoinsConfig {
    fn default() -> Self {
        Self {
            chest_impulse: 1.0,
            coin_impulse: 10.0,
            coin_interval: 0.2,
            coin_lifetime: 3.0,
            seed: 0,
        }
    }
}

impl CoinsConfig {
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

    /// Checks that the coin interval is positive and every value finite.
    ///
    /// # Errors
    ///
    /// Returns [`DemoError::OutOfRange`](crate::DemoError::OutOfRange) naming
    /// the first bad setting.
    pub fn validate(&self) -> DemoResult<()> {
        require_finite("chest_impulse", self.chest_impulse)?;
        require_finite("coin_impulse", self.coin_impulse)?;
        require_positive("coin_interval", self.coin_interval)?;
        require_non_negative("coin_lifetime", self.coin_lifetime)
    }
}

/// Point mass that falls until it hits the ground at `y = 0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
    /// Position.
    pub position: [f32; 2],
    /// Velocity.
    pub velocity: [f32; 2],
}

impl Body {
    fn launch(&mut self, position: [f32; 2], velocity: [f32; 2]) {
        self.position = position;
        self.velocity = velocity;
    }

    fn step(&mut self, dt: f32) {
        if self.is_grounded() {
            return;
        }
        self.velocity[1] -= GRAVITY * dt;
        self.position[0] += self.velocity[0] * dt;
        self.position[1] += self.velocity[1] * dt;
        if self.position[1] <= 0.0 {
            self.position[1] = 0.0;
            self.velocity = [0.0, 0.0];
        }
    }

    /// Whether the body came to rest.
    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.velocity == [0.0, 0.0] && self.position[1] <= 0.0
    }
}

fn impulse(rng: &mut ChaCha8Rng, force: f32) -> [f32; 2] {
    [
        rng.gen_range(-1.0..1.0) * force,
        rng.gen_range(0.5..1.25) * force,
    ]
}

/// A pooled coin.
#[derive(Clone, Debug, PartialEq)]
pub struct Coin {
    /// Prototype name.
    pub kind: String,
    /// Physics state.
    pub body: Body,
    lifetime: Duration,
}

impl Poolable for Coin {
    fn lifetime(&self) -> Option<Duration> {
        Some(self.lifetime)
    }

    fn on_deactivate(&mut self) {
        self.body = Body::default();
    }
}

/// Creates coins with the scene's lifetime.
#[derive(Clone, Copy, Debug)]
pub struct CoinFactory {
    lifetime: Duration,
}

impl PrototypeProvider<Coin> for CoinFactory {
    fn instantiate(&mut self, prototype: &Prototype) -> Coin {
        Coin {
            kind: prototype.name.clone(),
            body: Body::default(),
            lifetime: self.lifetime,
        }
    }
}

/// Coins of one chest.
pub type CoinPool = MultiTypePool<Coin, CoinFactory>;

/// A pooled chest with its own coins.
pub struct Chest {
    /// Physics state.
    pub body: Body,
    coins: CoinPool,
}

impl Chest {
    /// The chest's coin pool.
    #[must_use]
    pub const fn coins(&self) -> &CoinPool {
        &self.coins
    }

    fn spill(&mut self, now: Duration, velocity: [f32; 2]) -> Option<(InstanceId, String)> {
        let id = self.coins.acquire()?;
        let origin = self.body.position;
        let kind = self.coins.with_instance_mut(id, |coin| {
            coin.body.launch(origin, velocity);
            coin.kind.clone()
        })?;
        self.coins.activate(id, now);
        Some((id, kind))
    }

    fn step(&mut self, dt: f32, now: Duration) -> usize {
        self.body.step(dt);
        self.coins.update_active(|_, coin| {
            coin.body.step(dt);
            true
        });
        self.coins.tick(now)
    }
}

impl Poolable for Chest {
    fn on_deactivate(&mut self) {
        let recycled = self.coins.update_active(|_, _| false);
        debug!(recycled, "chest put away with its coins");
    }
}

/// Creates chests, each with a freshly filled coin pool.
pub struct ChestFactory {
    layout: PoolSettings,
    catalog: PrototypeCatalog,
    containers: PoolContainers<Coin>,
    coins: CoinFactory,
    built: u64,
}

impl ChestFactory {
    fn new(layout: PoolSettings, coin_lifetime: Duration) -> Self {
        Self {
            layout,
            catalog: PrototypeCatalog::new(),
            containers: PoolContainers::new(),
            coins: CoinFactory {
                lifetime: coin_lifetime,
            },
            built: 0,
        }
    }
}

impl PrototypeProvider<Chest> for ChestFactory {
    fn instantiate(&mut self, _prototype: &Prototype) -> Chest {
        // Derive a distinct seed per chest so chests do not spill in lockstep.
        let mut layout = self.layout.clone();
        layout.seed = layout.seed.map(|seed| seed.wrapping_add(self.built));
        self.built += 1;
        let coins = MultiTypePool::from_settings(
            &layout,
            &mut self.catalog,
            self.coins,
            &mut self.containers,
        );
        Chest {
            body: Body::default(),
            coins,
        }
    }
}

/// The coins scene.
pub struct ChestSpawner {
    config: CoinsConfig,
    chests: SingleTypePool<Chest, ChestFactory>,
    containers: PoolContainers<Chest>,
    events: EventSender,
    rng: ChaCha8Rng,
    clock: Duration,
    interval: Duration,
    held: Option<InstanceId>,
    next_coin: Duration,
}

impl ChestSpawner {
    /// Builds the scene and fills the chest pool.
    ///
    /// # Errors
    ///
    /// Returns an error when `config` does not [`validate`](CoinsConfig::validate).
    pub fn new(
        config: CoinsConfig,
        layouts: &DemoLayouts,
        events: EventSender,
    ) -> DemoResult<Self> {
        config.validate()?;
        let factory = ChestFactory::new(
            layouts.chest_coins.clone(),
            Duration::from_secs_f32(config.coin_lifetime),
        );
        let mut containers = PoolContainers::new();
        let chests = SingleTypePool::from_settings(
            &layouts.chests,
            &mut PrototypeCatalog::new(),
            factory,
            &mut containers,
        );
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            interval: Duration::from_secs_f32(config.coin_interval),
            config,
            chests,
            containers,
            events,
            clock: Duration::ZERO,
            held: None,
            next_coin: Duration::ZERO,
        })
    }

    /// Drops a chest at `position`.
    pub fn spawn_chest(&mut self, position: [f32; 2]) -> Option<InstanceId> {
        let id = self.chests.acquire()?;
        let velocity = impulse(&mut self.rng, self.config.chest_impulse);
        self.chests
            .with_instance_mut(id, |chest| chest.body.launch(position, velocity));
        self.chests.activate(id, self.clock);
        self.events.send(DemoEvent::ChestSpawned {
            chest: id,
            position,
        });
        Some(id)
    }

    /// Holds a chest open: one coin now, then one per interval until
    /// [`release`](Self::release). Returns `false` for a chest that is not out.
    pub fn hold(&mut self, chest: InstanceId) -> bool {
        if !self.chests.is_active(chest) {
            return false;
        }
        self.held = Some(chest);
        self.spill(chest);
        self.next_coin = self.clock + self.interval;
        true
    }

    /// Stops spilling coins.
    pub fn release(&mut self) {
        self.held = None;
    }

    /// Puts a chest away together with its coins.
    pub fn unspawn(&mut self, chest: InstanceId) -> bool {
        self.held = None;
        if !self.chests.deactivate(chest) {
            return false;
        }
        self.events.send(DemoEvent::ChestUnspawned { chest });
        true
    }

    /// Advances the scene by `dt`.
    pub fn tick(&mut self, dt: Duration) {
        self.clock += dt;

        if let Some(chest) = self.held {
            if self.chests.is_active(chest) {
                while self.clock >= self.next_coin {
                    self.spill(chest);
                    self.next_coin += self.interval;
                }
            } else {
                self.held = None;
            }
        }

        let (step, now) = (dt.as_secs_f32(), self.clock);
        let mut expired = 0;
        self.chests.update_active(|_, chest| {
            expired += chest.step(step, now);
            true
        });
        if expired > 0 {
            self.events.send(DemoEvent::CoinsExpired { count: expired });
        }
    }

    fn spill(&mut self, chest: InstanceId) -> Option<InstanceId> {
        let velocity = impulse(&mut self.rng, self.config.coin_impulse);
        let now = self.clock;
        let (coin, kind) = self
            .chests
            .with_instance_mut(chest, |c| c.spill(now, velocity))
            .flatten()?;
        self.events.send(DemoEvent::CoinSpawned { chest, coin, kind });
        Some(coin)
    }

    /// Chest held open, if any.
    #[must_use]
    pub const fn held(&self) -> Option<InstanceId> {
        self.held
    }

    /// Chest pool.
    #[must_use]
    pub const fn chests(&self) -> &SingleTypePool<Chest, ChestFactory> {
        &self.chests
    }

    /// Coins of `chest` that are currently out.
    #[must_use]
    pub fn coins_out(&self, chest: InstanceId) -> usize {
        self.chests
            .with_instance(chest, |c| c.coins().stats().active)
            .unwrap_or(0)
    }

    /// Tears the chest pool down, coins included.
    pub fn shutdown(&mut self) {
        self.chests.destroy(&mut self.containers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DemoError;
    use crate::events::EventBus;

    const FRAME: Duration = Duration::from_millis(50);

    fn scene() -> (ChestSpawner, EventBus) {
        let bus = EventBus::new(4096);
        let layouts = DemoLayouts::embedded().unwrap().with_seed(3);
        let spawner = ChestSpawner::new(CoinsConfig::default(), &layouts, bus.sender()).unwrap();
        (spawner, bus)
    }

    fn run_frames(spawner: &mut ChestSpawner, frames: u32) {
        for _ in 0..frames {
            spawner.tick(FRAME);
        }
    }

    #[test]
    fn test_settings_reject_unusable_intervals() {
        let config = CoinsConfig::from_toml_str("coin_lifetime = 0.0").unwrap();
        assert!(config.coin_lifetime.abs() < f32::EPSILON);

        for (source, field) in [
            ("coin_interval = 0.0", "coin_interval"),
            ("coin_interval = -1.0", "coin_interval"),
            ("coin_lifetime = -3.0", "coin_lifetime"),
            ("coin_impulse = nan", "coin_impulse"),
        ] {
            assert!(
                matches!(
                    CoinsConfig::from_toml_str(source),
                    Err(DemoError::OutOfRange { field: f, .. }) if f == field
                ),
                "{source}"
            );
        }

        let bus = EventBus::new(16);
        let layouts = DemoLayouts::embedded().unwrap();
        let config = CoinsConfig {
            coin_interval: 0.0,
            ..CoinsConfig::default()
        };
        assert!(ChestSpawner::new(config, &layouts, bus.sender()).is_err());
    }

    #[test]
    fn test_chest_falls_to_ground() {
        let (mut spawner, _bus) = scene();
        let chest = spawner.spawn_chest([0.0, 4.0]).unwrap();
        run_frames(&mut spawner, 40);
        let grounded = spawner
            .chests()
            .with_instance(chest, |c| c.body.is_grounded())
            .unwrap();
        assert!(grounded);
    }

    #[test]
    fn test_holding_spills_coins() {
        let (mut spawner, bus) = scene();
        let chest = spawner.spawn_chest([0.0, 0.0]).unwrap();
        assert!(spawner.hold(chest));
        run_frames(&mut spawner, 20);
        spawner.release();
        run_frames(&mut spawner, 10);

        let spilled = bus
            .receiver()
            .drain()
            .iter()
            .filter(|e| matches!(e, DemoEvent::CoinSpawned { .. }))
            .count();
        assert!((5..=6).contains(&spilled), "spilled {spilled}");
        assert_eq!(spawner.coins_out(chest), spilled);
    }

    #[test]
    fn test_coins_expire() {
        let (mut spawner, bus) = scene();
        let chest = spawner.spawn_chest([0.0, 0.0]).unwrap();
        spawner.hold(chest);
        spawner.release();
        assert_eq!(spawner.coins_out(chest), 1);

        // Lifetime is three seconds.
        run_frames(&mut spawner, 59);
        assert_eq!(spawner.coins_out(chest), 1);
        run_frames(&mut spawner, 2);
        assert_eq!(spawner.coins_out(chest), 0);
        assert!(bus
            .receiver()
            .drain()
            .contains(&DemoEvent::CoinsExpired { count: 1 }));
    }

    #[test]
    fn test_unspawn_returns_coins() {
        let (mut spawner, _bus) = scene();
        let chest = spawner.spawn_chest([0.0, 0.0]).unwrap();
        spawner.hold(chest);
        run_frames(&mut spawner, 10);
        assert!(spawner.coins_out(chest) > 0);

        assert!(spawner.unspawn(chest));
        assert_eq!(spawner.held(), None);
        assert_eq!(spawner.coins_out(chest), 0);
        assert!(!spawner.chests().is_active(chest));
        assert!(!spawner.unspawn(chest));
        assert!(!spawner.hold(chest));
    }

    #[test]
    fn test_chests_keep_separate_coins() {
        let (mut spawner, _bus) = scene();
        let first = spawner.spawn_chest([-2.0, 0.0]).unwrap();
        let second = spawner.spawn_chest([2.0, 0.0]).unwrap();
        assert_ne!(first, second);

        spawner.hold(first);
        run_frames(&mut spawner, 4);
        spawner.release();
        assert!(spawner.coins_out(first) > 0);
        assert_eq!(spawner.coins_out(second), 0);
    }
}
