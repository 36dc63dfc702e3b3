//! # Demo Event Bus
//!
//! Scenes report what happened through a bounded channel; whoever drives the
//! scene (the binary, a test) drains it once per frame.
//!
//! ```text
//! ┌──────────────┐      ┌─────────────┐      ┌──────────────┐
//! │ RunnerGame   │─────>│   bounded   │─────>│   driver     │
//! │ ChestSpawner │      │   channel   │      │ (bin, tests) │
//! └──────────────┘      └─────────────┘      └──────────────┘
//! ```
//!
//! A full channel drops the event instead of stalling the frame.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use fcpool_core::InstanceId;
use tracing::warn;

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Things that happen in the demo scenes.
#[derive(Clone, Debug, PartialEq)]
pub enum DemoEvent {
    // =========================================================================
    // Runner
    // =========================================================================
    /// The runner started or restarted.
    RunStarted,

    /// An obstacle left the spawn point.
    ObstacleSpawned {
        /// Pooled instance.
        instance: InstanceId,
        /// Prototype name.
        kind: String,
        /// Horizontal speed, negative to the left.
        speed: f32,
    },

    /// A cloud started floating.
    CloudSpawned {
        /// Pooled instance.
        instance: InstanceId,
        /// Prototype name.
        kind: String,
    },

    /// Scrolling got faster.
    SpeedBoosted {
        /// New speed.
        speed: f32,
    },

    /// The score went up.
    ScoreChanged {
        /// Current score.
        score: u32,
    },

    /// The player hit an obstacle; the run is over.
    PlayerHit {
        /// Final score of the run.
        score: u32,
        /// High score after the run.
        high_score: u32,
    },

    // =========================================================================
    // Coins
    // =========================================================================
    /// A chest was dropped into the level.
    ChestSpawned {
        /// Pooled chest.
        chest: InstanceId,
        /// Drop position.
        position: [f32; 2],
    },

    /// A chest spilled a coin.
    CoinSpawned {
        /// Chest the coin came from.
        chest: InstanceId,
        /// Pooled coin, in the chest's own registry.
        coin: InstanceId,
        /// Prototype name.
        kind: String,
    },

    /// Coins vanished after their lifetime.
    CoinsExpired {
        /// Number of coins returned.
        count: usize,
    },

    /// A chest was put away together with its coins.
    ChestUnspawned {
        /// Pooled chest.
        chest: InstanceId,
    },
}

/// Channel pair for demo events.
pub struct EventBus {
    sender: Sender<DemoEvent>,
    receiver: Receiver<DemoEvent>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undrained events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Producer handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Consumer handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// Handle for emitting events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<DemoEvent>,
}

impl EventSender {
    /// Sends without blocking. Returns `false` when the event was dropped.
    #[inline]
    pub fn send(&self, event: DemoEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event channel full, dropping event");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for consuming events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<DemoEvent>,
}

impl EventReceiver {
    /// Takes every pending event.
    pub fn drain(&self) -> Vec<DemoEvent> {
        self.receiver.try_iter().collect()
    }

    /// Number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_channel_drops() {
        let bus = EventBus::new(2);
        let sender = bus.sender();
        assert!(sender.send(DemoEvent::RunStarted));
        assert!(sender.send(DemoEvent::ScoreChanged { score: 1 }));
        assert!(!sender.send(DemoEvent::ScoreChanged { score: 2 }));

        let receiver = bus.receiver();
        assert_eq!(receiver.pending_count(), 2);
        assert_eq!(
            receiver.drain(),
            [DemoEvent::RunStarted, DemoEvent::ScoreChanged { score: 1 }]
        );
        assert_eq!(receiver.pending_count(), 0);
    }
}
