//! Line-oriented input accepted by the headless mirror runtime.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Press,
    Move,
    Release,
}

/// One JSON line on the runtime's input stream.
///
/// `confirm`, `cancel`, `remove` and `resize_widget` drive the edit overlay
/// directly, for front-ends that render their own controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceInput {
    Touch { phase: TouchPhase, x: f64, y: f64 },
    SurfaceSize { width: f64, height: f64 },
    Confirm,
    Cancel,
    Remove,
    ResizeWidget { grow: bool },
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
