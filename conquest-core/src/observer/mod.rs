//! Observer pattern for inspecting the simulation from outside.
//!
//! Observers receive immutable snapshots after ticks; they can watch the
//! game but never steer it. The registry fans one snapshot out to any number
//! of observers, each with its own notification cadence.
//!
//! ```text
//! GameObserver trait
//!        │
//!        ├── EventLogObserver (JSONL event stream)
//!        └── any renderer/recorder the driver registers
//! ```

pub mod event_log;

use crate::snapshot::RenderState;
use std::sync::Arc;
use thiserror::Error;

pub use event_log::{EventLogObserver, GameEvent};

/// Immutable snapshot of one tick.
///
/// The render state is behind an `Arc`: observers share it zero-copy and
/// cannot mutate it. Events are the game happenings drained this tick.
#[derive(Clone)]
pub struct Snapshot {
    pub state: Arc<RenderState>,
    /// Monotonic tick counter.
    pub tick: u64,
    /// Digest of ownership/garrison state, for reproducibility checks.
    pub checksum: u64,
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn new(state: RenderState, tick: u64, checksum: u64, events: Vec<GameEvent>) -> Self {
        Self {
            state: Arc::new(state),
            tick,
            checksum,
            events,
        }
    }
}

/// Errors that can occur during observation.
#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Notification cadence for an observer.
#[derive(Clone, Copy, Debug)]
pub struct ObserverConfig {
    /// Notify every N ticks (1 = every tick).
    pub frequency: u32,
    /// Also notify on ticks that carry events, regardless of frequency, so
    /// sparse observers never miss a capture or a phase change.
    pub notify_on_events: bool,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            frequency: 1,
            notify_on_events: true,
        }
    }
}

/// Trait for simulation observers.
///
/// Errors returned from `on_tick` are logged but never block the game;
/// observers handle their own recovery.
pub trait GameObserver: Send + Sync {
    fn on_tick(&self, snapshot: &Snapshot) -> Result<(), ObserverError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    fn config(&self) -> ObserverConfig {
        ObserverConfig::default()
    }

    /// Called when the session ends or the registry is dropped.
    fn on_shutdown(&self) {}
}

/// Registry fanning snapshots out to a heterogeneous observer set.
pub struct ObserverRegistry {
    observers: Vec<Box<dyn GameObserver>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self { observers: vec![] }
    }

    pub fn register(&mut self, observer: Box<dyn GameObserver>) {
        log::info!("registered observer: {}", observer.name());
        self.observers.push(observer);
    }

    /// Notify every observer whose cadence matches this tick. Errors are
    /// logged and swallowed.
    pub fn notify(&self, snapshot: &Snapshot) {
        for observer in &self.observers {
            let config = observer.config();
            let due = config.frequency != 0 && snapshot.tick % config.frequency as u64 == 0;
            let has_events = config.notify_on_events && !snapshot.events.is_empty();
            if due || has_events {
                if let Err(e) = observer.on_tick(snapshot) {
                    log::warn!("observer '{}' error: {}", observer.name(), e);
                }
            }
        }
    }

    pub fn shutdown(&self) {
        for observer in &self.observers {
            observer.on_shutdown();
        }
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ObserverRegistry {
    fn drop(&mut self) {
        // Flush buffers and finalize logs even on early exits.
        self.shutdown();
    }
}
