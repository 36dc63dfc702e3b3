//! # FC Pool Demo
//!
//! Headless versions of the two demo scenes, driven by a fixed-step clock:
//!
//! - [`runner`]: obstacles and clouds from two multi-type pools
//! - [`coins`]: chests from a single-type pool, each with its own coin pool
//!
//! Both report what happens as [`DemoEvent`]s over a bounded channel.
//!
//! ## Example
//!
//! ```rust,ignore
//! let bus = EventBus::default();
//! let layouts = DemoLayouts::embedded()?;
//! let mut game = RunnerGame::new(RunnerConfig::default(), &layouts, bus.sender())?;
//! game.start();
//! for _ in 0..600 {
//!     game.tick(Duration::from_millis(16));
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod coins;
pub mod error;
pub mod events;
pub mod layouts;
pub mod runner;

pub use coins::{Chest, ChestSpawner, Coin, CoinsConfig};
pub use error::{DemoError, DemoResult};
pub use events::{DemoEvent, EventBus, EventReceiver, EventSender};
pub use layouts::DemoLayouts;
pub use runner::{Cloud, Obstacle, RunnerConfig, RunnerGame};
