//! Event log observer: structured game events as JSONL.
//!
//! Each tick's events are written as one JSON object per line to any `Write`
//! destination (file, stdout, pipe):
//!
//! ```json
//! {"type":"territory_captured","at_ms":21500,"territory":"FRA",...}
//! ```

use super::{GameObserver, ObserverConfig, ObserverError, Snapshot};
use crate::phase::GamePhase;
use crate::territory::{Owner, TerritoryId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Notable happenings inside one session, stamped with sim time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    /// The coarse phase moved along an edge of the state machine.
    PhaseChanged {
        at_ms: u64,
        from: GamePhase,
        to: GamePhase,
    },

    /// The player's starting territory was fixed, by click or by timeout.
    StartSelected {
        at_ms: u64,
        territory: TerritoryId,
        auto: bool,
    },

    /// An attack captured its target.
    TerritoryCaptured {
        at_ms: u64,
        territory: TerritoryId,
        attacker: TerritoryId,
        /// Owner displaced by the capture.
        from: Owner,
        to: Owner,
        /// Garrison the captured territory was left with.
        survivors: u32,
    },

    /// An attack was beaten back.
    AttackRepelled {
        at_ms: u64,
        attacker: TerritoryId,
        defender: TerritoryId,
        attacker_losses: u32,
        defender_losses: u32,
    },

    /// A production tick handed troops out.
    ProductionGranted {
        at_ms: u64,
        player_territories: usize,
        player_per_territory: u32,
        ai_territories: usize,
        ai_per_territory: u32,
    },

    /// The session reached a terminal phase.
    GameOver { at_ms: u64, outcome: GamePhase },
}

/// Writes every event in each snapshot as a JSON line.
pub struct EventLogObserver<W: Write + Send> {
    out: Mutex<W>,
}

impl EventLogObserver<BufWriter<File>> {
    /// Log to a file, creating or truncating it.
    pub fn to_file(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> EventLogObserver<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl<W: Write + Send> GameObserver for EventLogObserver<W> {
    fn on_tick(&self, snapshot: &Snapshot) -> Result<(), ObserverError> {
        if snapshot.events.is_empty() {
            return Ok(());
        }
        let mut out = match self.out.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for event in &snapshot.events {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "EventLogObserver"
    }

    fn config(&self) -> ObserverConfig {
        // Nothing to write on event-free ticks.
        ObserverConfig {
            frequency: 0,
            notify_on_events: true,
        }
    }

    fn on_shutdown(&self) {
        if let Ok(mut out) = self.out.lock() {
            let _ = out.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::RenderState;

    fn menu_state() -> RenderState {
        RenderState {
            phase: GamePhase::Menu,
            territories: vec![],
            selected: None,
            hovered: None,
            drag_source: None,
            drag_target: None,
            attacks: vec![],
            production_countdown_s: 0,
            selection_remaining_ms: 0,
            paused: false,
            speed: 1.0,
            player_territories: 0,
            ai_territories: 0,
            neutral_territories: 0,
        }
    }

    #[test]
    fn test_events_serialize_as_tagged_jsonl() {
        let shared = std::sync::Arc::new(Mutex::new(Vec::<u8>::new()));
        let events = vec![
            GameEvent::StartSelected {
                at_ms: 15_000,
                territory: "FRA".into(),
                auto: true,
            },
            GameEvent::AttackRepelled {
                at_ms: 16_000,
                attacker: "FRA".into(),
                defender: "DEU".into(),
                attacker_losses: 7,
                defender_losses: 3,
            },
        ];

        // Sink that appends into the shared buffer so we can read it back
        // after the observer is done.
        struct SharedSink(std::sync::Arc<Mutex<Vec<u8>>>);
        impl Write for SharedSink {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let observer = EventLogObserver::new(SharedSink(std::sync::Arc::clone(&shared)));
        observer
            .on_tick(&Snapshot::new(menu_state(), 1, 0, events))
            .unwrap();

        let written = String::from_utf8(shared.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("\"type\":\"start_selected\""));
        assert!(lines[0].contains("\"auto\":true"));
        assert!(lines[1].contains("\"type\":\"attack_repelled\""));

        // Each line parses back into an event.
        for line in lines {
            let _: GameEvent = serde_json::from_str(line).unwrap();
        }
    }

    #[test]
    fn test_quiet_ticks_write_nothing() {
        let observer = EventLogObserver::new(Vec::<u8>::new());
        observer
            .on_tick(&Snapshot::new(menu_state(), 1, 0, vec![]))
            .unwrap();
        let out = observer.out.lock().unwrap();
        assert!(out.is_empty());
    }
}
