//! # Event Store
//!
//! The authoritative in-memory collection of local detections, in arrival
//! order. The store is a bounded circular buffer: once `capacity` events are
//! held, each append evicts the oldest one, so serving "the most recent N"
//! never requires retaining unbounded history.
//!
//! ## Concurrency
//! Mutation is serialized through the write half of an `RwLock`; readers share
//! the read half. Events are copied out whole while the lock is held, so a
//! reader observes every event either entirely before or entirely after an
//! in-flight append.
//!
//! ## Counters
//! - `count()` is the number of retained events (at most `capacity`).
//! - `total_accepted()` is the number of events ever accepted, including the
//!   ones already evicted. It only grows, which makes it usable as a watermark.

use std::collections::VecDeque;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::model::{Detection, FireEvent};

/// Number of recent events the store retains by default.
pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Debug, Default)]
struct StoreInner {
    events: VecDeque<FireEvent>,
    total: u64,
    last_time: Option<DateTime<Utc>>,
}

/// # Event Store
///
/// Constructed once at startup and shared as an `Arc<EventStore>` between the
/// hydrator, the ingestion path and the HTTP read handlers.
#[derive(Debug)]
pub struct EventStore {
    inner: RwLock<StoreInner>,
    capacity: usize,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore {
    /// Creates an empty store retaining [`DEFAULT_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty store retaining at most `capacity` events (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: RwLock::new(StoreInner {
                events: VecDeque::with_capacity(capacity),
                ..StoreInner::default()
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Accepts a detection, stamping it with the current time.
    pub fn append(&self, detection: Detection) -> FireEvent {
        self.append_at(detection, Utc::now())
    }

    /// Accepts a detection observed at `now`.
    ///
    /// The stamped time never goes backwards: if `now` is older than the newest
    /// stored event, the newest time is reused.
    pub fn append_at(&self, detection: Detection, now: DateTime<Utc>) -> FireEvent {
        let mut inner = self.write();
        let event = FireEvent {
            lat: detection.lat,
            lon: detection.lon,
            confidence: detection.confidence,
            time: now,
        };
        self.push_locked(&mut inner, event)
    }

    /// Seeds the store with historical events, keeping their recorded times
    /// unless a time is older than the event before it (DST fall-back, a
    /// journal written out of order), in which case it is raised to that one.
    ///
    /// Used by hydration before the store is shared. Returns how many events
    /// were accepted.
    pub fn seed<I>(&self, events: I) -> usize
    where
        I: IntoIterator<Item = FireEvent>,
    {
        let mut inner = self.write();
        let mut accepted = 0;
        for event in events {
            self.push_locked(&mut inner, event);
            accepted += 1;
        }
        accepted
    }

    /// Returns the last `min(n, count())` events, oldest first.
    pub fn read_recent(&self, n: usize) -> Vec<FireEvent> {
        let inner = self.read();
        let skip = inner.events.len().saturating_sub(n);
        inner.events.iter().skip(skip).copied().collect()
    }

    /// Returns every retained event, oldest first (at most `capacity`).
    pub fn read_all(&self) -> Vec<FireEvent> {
        self.read_recent(self.capacity)
    }

    /// Returns the newest event, if any.
    pub fn latest(&self) -> Option<FireEvent> {
        self.read().events.back().copied()
    }

    /// Number of retained events.
    pub fn count(&self) -> usize {
        self.read().events.len()
    }

    /// Number of events ever accepted, evicted ones included.
    pub fn total_accepted(&self) -> u64 {
        self.read().total
    }

    /// Reads the retained window together with the total in one consistent view.
    pub fn snapshot(&self, n: usize) -> (Vec<FireEvent>, u64) {
        let inner = self.read();
        let skip = inner.events.len().saturating_sub(n);
        (inner.events.iter().skip(skip).copied().collect(), inner.total)
    }

    /// Appends under the write lock. Arrival order is time order.
    fn push_locked(&self, inner: &mut StoreInner, mut event: FireEvent) -> FireEvent {
        if let Some(last) = inner.last_time {
            event.time = event.time.max(last);
        }
        if inner.events.len() == self.capacity {
            inner.events.pop_front();
        }
        inner.events.push_back(event);
        inner.total += 1;
        inner.last_time = Some(event.time);
        event
    }

    // Every critical section leaves the deque consistent, so a poisoned lock
    // still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
