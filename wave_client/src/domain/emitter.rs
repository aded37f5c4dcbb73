// Shapes outbound intents so the socket carries only meaningful changes.

use crate::domain::Phase;

pub const DEFAULT_MIN_DELTA: f32 = 0.5;

/// Keeps the newest desired position and releases it at most once per send tick.
#[derive(Debug, Clone)]
pub struct MoveCoalescer {
    min_delta: f32,
    pending: Option<(f32, f32)>,
    last_sent: Option<(f32, f32)>,
}

impl Default for MoveCoalescer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELTA)
    }
}

impl MoveCoalescer {
    pub fn new(min_delta: f32) -> Self {
        Self {
            min_delta,
            pending: None,
            last_sent: None,
        }
    }

    /// Records a desired position; older pending positions are overwritten.
    pub fn push(&mut self, x: f32, y: f32) {
        self.pending = Some((x, y));
    }

    /// Called once per send tick. Yields the pending position if it moved far enough.
    pub fn take(&mut self) -> Option<(f32, f32)> {
        let (x, y) = self.pending.take()?;
        if let Some((lx, ly)) = self.last_sent {
            if (x - lx).abs() <= self.min_delta && (y - ly).abs() <= self.min_delta {
                return None;
            }
        }
        self.last_sent = Some((x, y));
        Some((x, y))
    }
}

/// Emits `playerReady` only when the (phase, in-zone) pair changes.
///
/// The server clears every ready flag on a phase change, so a new phase re-arms the
/// tracker even if the player never left the zone.
#[derive(Debug, Clone, Default)]
pub struct ReadyTracker {
    last: Option<(Phase, bool)>,
}

impl ReadyTracker {
    pub fn update(&mut self, phase: Phase, in_zone: bool) -> Option<bool> {
        let current = (phase, in_zone);
        let previous = self.last.replace(current);
        match previous {
            Some(prev) if prev == current => None,
            // Nothing to retract when we start outside the zone.
            None if !in_zone => None,
            Some((prev_phase, false)) if prev_phase != phase && !in_zone => None,
            _ => Some(in_zone),
        }
    }
}
