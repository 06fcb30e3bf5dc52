//! Timing configuration for input delivery.
//!
//! All pacing is an explicit value rather than a constant buried in the
//! encoder, so callers (and tests) can zero it out.  The defaults are tuned
//! for desktop test automation; none of them is a platform requirement.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default pause between chord steps.
pub const DEFAULT_KEY_DELAY_MS: u64 = 10;

/// Default pause after each wheel record.  Wheel deltas are coalesced by the
/// OS and there is no no-coalesce flag for them.
pub const DEFAULT_WHEEL_SETTLE_MS: u64 = 50;

/// Default pause between pixel steps of a drag.
pub const DEFAULT_DRAG_STEP_MS: u64 = 10;

/// Delays applied by the [`Sequencer`](crate::sequencer::Sequencer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Wait after every press and every release in a chord.
    pub key_delay_ms: u64,
    /// Wait after every wheel record.
    pub wheel_settle_ms: u64,
    /// Wait after every intermediate move of a drag.
    pub drag_step_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            key_delay_ms: DEFAULT_KEY_DELAY_MS,
            wheel_settle_ms: DEFAULT_WHEEL_SETTLE_MS,
            drag_step_ms: DEFAULT_DRAG_STEP_MS,
        }
    }
}

impl Pacing {
    /// No waits at all.
    pub const fn immediate() -> Self {
        Self {
            key_delay_ms: 0,
            wheel_settle_ms: 0,
            drag_step_ms: 0,
        }
    }

    pub fn key_delay(&self) -> Duration {
        Duration::from_millis(self.key_delay_ms)
    }

    pub fn wheel_settle(&self) -> Duration {
        Duration::from_millis(self.wheel_settle_ms)
    }

    pub fn drag_step(&self) -> Duration {
        Duration::from_millis(self.drag_step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = Pacing::default();
        assert_eq!(p.key_delay(), Duration::from_millis(10));
        assert_eq!(p.wheel_settle(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let p: Pacing = serde_json::from_str(r#"{"key_delay_ms": 0}"#).unwrap();
        assert_eq!(p.key_delay_ms, 0);
        assert_eq!(p.wheel_settle_ms, DEFAULT_WHEEL_SETTLE_MS);
        assert_eq!(p.drag_step_ms, DEFAULT_DRAG_STEP_MS);
    }
}
