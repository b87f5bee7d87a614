//! # Poll Gate
//!
//! Per-view refresh throttle. A gate entry proceeds only when at least the
//! view's minimum interval has elapsed since the last entry that proceeded;
//! otherwise the attempt is dropped. Nothing is queued or retried.
//!
//! One gate instance is shared by every trigger of a view (the periodic
//! schedule and manual refreshes alike), so adding triggers cannot raise the
//! effective refresh rate above `1 / interval`.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::model::View;

/// Outcome of a gate entry attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Proceed,
    Skip,
}

impl GateDecision {
    pub fn is_proceed(self) -> bool {
        self == GateDecision::Proceed
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GateSlot {
    interval: Duration,
    last_entry: Option<Instant>,
}

/// # Poll Gate
///
/// Views without a configured interval use a zero interval and always proceed.
#[derive(Debug, Default)]
pub struct PollGate {
    slots: Mutex<HashMap<View, GateSlot>>,
}

impl PollGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style interval registration.
    pub fn with_interval(self, view: View, interval: Duration) -> Self {
        self.set_interval(view, interval);
        self
    }

    pub fn set_interval(&self, view: View, interval: Duration) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.entry(view).or_default().interval = interval;
    }

    pub fn interval(&self, view: View) -> Duration {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(&view).map(|s| s.interval).unwrap_or_default()
    }

    /// Attempts to enter the gate for `view` at `now`.
    ///
    /// On `Proceed`, `now` becomes the view's last entry. On `Skip` no state
    /// changes. The check and the update happen under one lock.
    pub fn try_enter(&self, view: View, now: Instant) -> GateDecision {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let slot = slots.entry(view).or_default();
        let open = match slot.last_entry {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= slot.interval,
        };
        if open {
            slot.last_entry = Some(now);
            GateDecision::Proceed
        } else {
            GateDecision::Skip
        }
    }

    /// Convenience wrapper using the current instant.
    pub fn try_enter_now(&self, view: View) -> GateDecision {
        self.try_enter(view, Instant::now())
    }
}
