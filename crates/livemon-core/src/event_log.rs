//! Bounded, insertion-ordered event log.
//!
//! [`EventLog`] keeps at most `capacity` [`LogRecord`]s. Appending past the
//! capacity evicts from the head, so the buffer always holds the most recent
//! `capacity` records in append order. Ids come from a counter that is never
//! reset, so they stay strictly increasing across evictions.
//!
//! Reads are newest-first: [`EventLog::query`] walks the buffer in reverse
//! append order. Client-supplied timestamps play no part in ordering.

use std::collections::VecDeque;

use livemon_types::{LogDraft, LogRecord};

/// Default number of records kept in memory.
pub const DEFAULT_CAPACITY: usize = 1000;

/// One page of [`EventLog::query`] results.
#[derive(Debug, Clone, PartialEq)]
pub struct LogPage {
    /// Records in the requested window, newest first.
    pub logs: Vec<LogRecord>,
    /// Number of records currently buffered.
    pub total: usize,
}

/// Fixed-capacity FIFO of log records.
#[derive(Debug, Clone)]
pub struct EventLog {
    records: VecDeque<LogRecord>,
    capacity: usize,
    next_id: u64,
    total_appended: u64,
}

impl EventLog {
    /// Create an empty log holding at most `capacity` records.
    ///
    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
            total_appended: 0,
        }
    }

    /// Assign the next id to `draft`, push it to the tail and evict from
    /// the head until the length is back within capacity.
    ///
    /// Returns a copy of the stored record.
    pub fn append(&mut self, draft: LogDraft) -> LogRecord {
        let record = draft.into_record(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.total_appended = self.total_appended.saturating_add(1);

        self.records.push_back(record.clone());
        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
        record
    }

    /// Return up to `limit` records starting `offset` places from the newest.
    ///
    /// An `offset` at or beyond the buffered total yields an empty page.
    pub fn query(&self, limit: usize, offset: usize) -> LogPage {
        let logs = self
            .records
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        LogPage {
            logs,
            total: self.records.len(),
        }
    }

    /// Number of records currently buffered.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records kept.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records ever appended, including evicted ones.
    pub const fn total_appended(&self) -> u64 {
        self.total_appended
    }

    /// The id the next append will receive.
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Iterate buffered records oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.records.iter()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
