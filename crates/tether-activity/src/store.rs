//! Bounded activity history
//!
//! [`HistoryStore`] keeps the most recent events in insertion order and
//! evicts the oldest once its capacity is reached. All access goes through a
//! single short-held lock; nothing outside the store runs while it is held.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tether_core::{ActivityEvent, ActivityKind, ConnectorId};

use crate::config::DEFAULT_CAPACITY;
use crate::error::{ActivityError, ActivityResult};

/// Filter criteria for querying the history
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    /// Filter by originating connector
    pub connector: Option<ConnectorId>,
    /// Filter by event kind
    pub kind: Option<ActivityKind>,
    /// Filter events at or after this time
    pub since: Option<DateTime<Utc>>,
    /// Only include events carrying error detail
    pub errors_only: bool,
    /// Maximum number of events to return (the most recent matches are kept)
    pub limit: Option<usize>,
}

impl ActivityFilter {
    /// Create a new filter that matches everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by connector
    pub fn connector(mut self, id: ConnectorId) -> Self {
        self.connector = Some(id);
        self
    }

    /// Filter by kind
    pub fn kind(mut self, kind: ActivityKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Filter events since a time
    pub fn since(mut self, time: DateTime<Utc>) -> Self {
        self.since = Some(time);
        self
    }

    /// Only include error events
    pub fn errors_only(mut self) -> Self {
        self.errors_only = true;
        self
    }

    /// Limit the number of results
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    fn matches(&self, event: &ActivityEvent) -> bool {
        if let Some(connector) = self.connector
            && event.connector() != connector
        {
            return false;
        }

        if let Some(kind) = self.kind
            && event.kind() != kind
        {
            return false;
        }

        if let Some(since) = self.since
            && event.timestamp() < since
        {
            return false;
        }

        !(self.errors_only && !event.is_error())
    }
}

/// Point-in-time counters for a [`HistoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Maximum number of retained events
    pub capacity: usize,
    /// Events currently retained
    pub len: usize,
    /// Events appended over the store's lifetime
    pub total_recorded: u64,
    /// Events evicted over the store's lifetime
    pub total_evicted: u64,
}

struct Inner {
    events: VecDeque<ActivityEvent>,
    total_recorded: u64,
    total_evicted: u64,
}

/// Fixed-capacity, insertion-ordered event buffer with FIFO eviction
pub struct HistoryStore {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl HistoryStore {
    /// Create a store holding at most `capacity` events
    ///
    /// # Errors
    ///
    /// Returns [`ActivityError::InvalidCapacity`] if `capacity` is zero.
    pub fn new(capacity: usize) -> ActivityResult<Self> {
        if capacity == 0 {
            return Err(ActivityError::InvalidCapacity(capacity));
        }

        Ok(Self {
            inner: Mutex::new(Inner {
                events: VecDeque::with_capacity(capacity),
                total_recorded: 0,
                total_evicted: 0,
            }),
            capacity,
        })
    }

    /// Append an event at the tail, evicting from the head while over capacity
    ///
    /// Returns the number of events evicted (zero or one in practice).
    pub fn append(&self, event: ActivityEvent) -> usize {
        let mut inner = self.inner.lock();
        inner.events.push_back(event);
        inner.total_recorded += 1;

        let mut evicted = 0;
        while inner.events.len() > self.capacity {
            inner.events.pop_front();
            evicted += 1;
        }
        inner.total_evicted += evicted as u64;
        evicted
    }

    /// Copy of every retained event, oldest first
    pub fn snapshot(&self) -> Vec<ActivityEvent> {
        let inner = self.inner.lock();
        inner.events.iter().cloned().collect()
    }

    /// Copy of the most recent `count` events, oldest first
    pub fn latest(&self, count: usize) -> Vec<ActivityEvent> {
        let inner = self.inner.lock();
        let skip = inner.events.len().saturating_sub(count);
        inner.events.iter().skip(skip).cloned().collect()
    }

    /// Copy of the retained events matching a filter, oldest first
    pub fn query(&self, filter: &ActivityFilter) -> Vec<ActivityEvent> {
        let mut results: Vec<ActivityEvent> = {
            let inner = self.inner.lock();
            inner
                .events
                .iter()
                .filter(|event| filter.matches(event))
                .cloned()
                .collect()
        };

        if let Some(limit) = filter.limit {
            let skip = results.len().saturating_sub(limit);
            results = results.split_off(skip);
        }
        results
    }

    /// Maximum number of retained events
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained events
    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    /// True if no events are retained
    pub fn is_empty(&self) -> bool {
        self.inner.lock().events.is_empty()
    }

    /// Discard every retained event
    ///
    /// Lifetime counters are kept; cleared events are not counted as evicted.
    pub fn clear(&self) {
        self.inner.lock().events.clear();
    }

    /// Current counters
    pub fn stats(&self) -> HistoryStats {
        let inner = self.inner.lock();
        HistoryStats {
            capacity: self.capacity,
            len: inner.events.len(),
            total_recorded: inner.total_recorded,
            total_evicted: inner.total_evicted,
        }
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                events: VecDeque::with_capacity(DEFAULT_CAPACITY),
                total_recorded: 0,
                total_evicted: 0,
            }),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("stats", &self.stats())
            .finish()
    }
}
