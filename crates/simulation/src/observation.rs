//! Time-indexed pool observations.
//!
//! The ring stores, per write, the running sum of `tick * seconds` and the
//! running fee totals. At most one entry is written per second; the entry
//! captures the state *before* the first mutation of that second.

use primitive_types::U256;
use std::collections::VecDeque;
use swapsweep_protocols::error::PoolError;

/// Pool accumulators at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Observation {
    pub timestamp: u64,
    /// Sum of `tick * seconds` since the pool was created.
    pub tick_cumulative: i64,
    /// Total token0 fees charged since the pool was created.
    pub fees_cumulative0: U256,
    /// Total token1 fees charged since the pool was created.
    pub fees_cumulative1: U256,
}

/// Live accumulators used to extrapolate past the latest write.
#[derive(Debug, Clone, Copy)]
pub struct CurrentState {
    pub now: u64,
    pub tick: i32,
    pub fees0: U256,
    pub fees1: U256,
}

/// Bounded history of [`Observation`]s, oldest first.
#[derive(Debug, Clone)]
pub struct ObservationRing {
    entries: VecDeque<Observation>,
    capacity: usize,
}

impl ObservationRing {
    /// Creates a ring with a single zeroed observation at `timestamp`.
    #[must_use]
    pub fn new(timestamp: u64, capacity: usize) -> Self {
        let mut entries = VecDeque::with_capacity(capacity.max(1));
        entries.push_back(Observation {
            timestamp,
            ..Observation::default()
        });
        Self {
            entries,
            capacity: capacity.max(1),
        }
    }

    pub fn latest(&self) -> Observation {
        self.entries.back().copied().unwrap_or_default()
    }

    pub fn oldest(&self) -> Observation {
        self.entries.front().copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records the accumulators as of `state.now`, where `state.tick` has
    /// been in force since the previous write. No-op within the same second.
    pub fn write(&mut self, state: CurrentState) {
        let last = self.latest();
        if state.now <= last.timestamp {
            return;
        }
        self.entries.push_back(extrapolate(last, state, state.now));
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Accumulators `seconds_ago` seconds before `state.now`.
    pub fn observe(&self, state: CurrentState, seconds_ago: u32) -> Result<Observation, PoolError> {
        let target = state
            .now
            .checked_sub(u64::from(seconds_ago))
            .ok_or(PoolError::ObservationTooOld(seconds_ago))?;
        let last = self.latest();

        if seconds_ago == 0 || target > last.timestamp {
            return Ok(extrapolate(last, state, target));
        }
        if target < self.oldest().timestamp {
            return Err(PoolError::ObservationTooOld(seconds_ago));
        }

        // Latest entry at or before target; the ring is sorted by timestamp.
        let index = self
            .entries
            .partition_point(|entry| entry.timestamp <= target)
            .saturating_sub(1);
        let before = self.entries[index];
        if before.timestamp == target {
            return Ok(before);
        }
        let after = self.entries.get(index + 1).copied().unwrap_or(last);
        Ok(interpolate(before, after, target))
    }
}

fn extrapolate(last: Observation, state: CurrentState, target: u64) -> Observation {
    let elapsed = target.saturating_sub(last.timestamp) as i64;
    Observation {
        timestamp: target,
        tick_cumulative: last.tick_cumulative + i64::from(state.tick) * elapsed,
        fees_cumulative0: state.fees0,
        fees_cumulative1: state.fees1,
    }
}

// Ticks are constant between writes so the cumulative is linear; fees only
// change right after a write so the later entry already reflects them.
fn interpolate(before: Observation, after: Observation, target: u64) -> Observation {
    let span = i128::from(after.timestamp - before.timestamp);
    let offset = i128::from(target - before.timestamp);
    let delta = i128::from(after.tick_cumulative - before.tick_cumulative);
    Observation {
        timestamp: target,
        tick_cumulative: before.tick_cumulative + (delta * offset / span) as i64,
        fees_cumulative0: after.fees_cumulative0,
        fees_cumulative1: after.fees_cumulative1,
    }
}
