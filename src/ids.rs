//! Thought id allocation.
//!
//! `ClockIds` derives ids from the wall clock in milliseconds, bumped so
//! that they are strictly increasing within one generator. Nothing protects
//! against another process allocating the same millisecond; hosts that need
//! that guarantee use `SequentialIds` against a single store.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::model::ThoughtId;
use crate::{Error, Result};

/// Source of fresh thought ids.
pub trait IdGenerator: Send {
    /// Allocate the next id. Never returns `ThoughtId::INVALID`; fails with
    /// `StorageError` once the id space above the highest id is used up.
    fn next_id(&mut self) -> Result<ThoughtId>;

    /// Inform the generator of the highest id already stored.
    fn seed(&mut self, highest: ThoughtId);
}

/// Millisecond timestamps, strictly increasing.
#[derive(Debug, Clone, Default)]
pub struct ClockIds {
    last: Option<u64>,
}

impl ClockIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for ClockIds {
    fn next_id(&mut self) -> Result<ThoughtId> {
        let now = Utc::now().timestamp_millis().max(0).unsigned_abs();
        let next = match self.last {
            Some(last) if now <= last => last.checked_add(1),
            _ => Some(now),
        };
        let id = usable(next)?;
        self.last = Some(id.0);
        Ok(id)
    }

    fn seed(&mut self, highest: ThoughtId) {
        if highest.is_valid() && self.last.is_none_or(|last| highest.0 > last) {
            self.last = Some(highest.0);
        }
    }
}

/// `raw` as an issuable id. `None` means the addition overflowed.
fn usable(raw: Option<u64>) -> Result<ThoughtId> {
    match raw.map(ThoughtId) {
        Some(id) if id.is_valid() => Ok(id),
        _ => Err(Error::StorageError("thought id space exhausted".into())),
    }
}

/// Plain counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn starting_at(next: u64) -> Self {
        Self { next }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> Result<ThoughtId> {
        let id = usable(Some(self.next))?;
        self.next = self.next.saturating_add(1);
        Ok(id)
    }

    fn seed(&mut self, highest: ThoughtId) {
        if highest.is_valid() && highest.0 >= self.next {
            self.next = highest.0.saturating_add(1);
        }
    }
}
