//! # Request Sequencer
//!
//! The poll gate bounds how often a view fires requests, not how many are in
//! flight. When latency exceeds the poll interval, responses can come back out
//! of order. Each outgoing request takes a number from `issue()`; before a
//! response is committed to the view, `try_apply()` accepts it only if its
//! number is higher than every number already applied.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct RequestSequencer {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers start at 1, so 0 means "nothing applied yet".
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Marks `seq` applied if it is newer than the latest applied one.
    pub fn try_apply(&self, seq: u64) -> bool {
        self.applied.fetch_max(seq, Ordering::AcqRel) < seq
    }

    pub fn last_applied(&self) -> u64 {
        self.applied.load(Ordering::Acquire)
    }

    pub fn last_issued(&self) -> u64 {
        self.issued.load(Ordering::Acquire)
    }
}
