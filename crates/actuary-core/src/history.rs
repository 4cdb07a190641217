//! Fixed-capacity ring buffer for per-cycle records.

use std::collections::VecDeque;

use crate::error::{ActuaryError, Result};

/// Keeps the most recent `capacity` records; older ones are dropped on push.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    records: VecDeque<T>,
    capacity: usize,
    total_pushed: u64,
}

impl<T> BoundedHistory<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ActuaryError::Configuration(
                "max_history must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            records: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            total_pushed: 0,
        })
    }

    /// Append a record, evicting the oldest when full.
    pub fn push(&mut self, record: T) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
        self.total_pushed += 1;
    }

    pub fn latest(&self) -> Option<&T> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of records ever pushed, including evicted ones.
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Oldest-first iterator over retained records.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }
}

impl<T: Clone> BoundedHistory<T> {
    pub fn to_vec(&self) -> Vec<T> {
        self.records.iter().cloned().collect()
    }
}
