//! The player-facing command surface and the pointer-input port.
//!
//! Pointer events arrive already translated to world coordinates by the
//! input collaborator (camera transforms are its problem). The collaborator
//! calls the [`PointerInput`] port the controller implements; nothing is
//! wired through captured closures.

use crate::territory::TerritoryId;
use serde::{Deserialize, Serialize};

/// Commands exposed to UI controls. This is a call surface, not a network
/// protocol: rejections come back synchronously as typed errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // Session
    Restart,

    // Time
    Pause,
    Resume,
    SetSpeed { speed: f64 },
    SpeedUp,
    SlowDown,
    ResetSpeed,

    // Territory
    SelectTerritory { territory: TerritoryId },
    Attack { source: TerritoryId, target: TerritoryId },
}

/// World-coordinate pointer events.
///
/// `mouse_down` answers with the draggable territory under the cursor, if
/// any, so the input layer knows whether a drag gesture may begin.
pub trait PointerInput {
    fn click(&mut self, x: f64, y: f64);
    fn right_click(&mut self, x: f64, y: f64);
    fn hover(&mut self, x: f64, y: f64);
    fn mouse_down(&mut self, x: f64, y: f64) -> Option<TerritoryId>;
    fn drag_start(&mut self, x: f64, y: f64);
    fn drag(&mut self, x: f64, y: f64);
    fn drop(&mut self, x: f64, y: f64);
}
