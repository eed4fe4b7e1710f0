use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_HOLD_DELAY: Duration = Duration::from_millis(1250);
pub const DEFAULT_SNAP_THRESHOLD: f64 = 24.0;
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(100);

/// Timing and distance constants for the interaction engine. Fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Press duration before a touch becomes an edit, drag, or picker gesture.
    #[serde(with = "millis")]
    pub hold_delay: Duration,
    /// Maximum gap, in pixels, that a dragged widget will close by snapping.
    pub snap_threshold: f64,
    /// Period of the widget `update` ticker.
    #[serde(with = "millis")]
    pub update_interval: Duration,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hold_delay: DEFAULT_HOLD_DELAY,
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
