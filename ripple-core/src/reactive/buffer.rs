//! Replay buffer.

use std::collections::vec_deque::{self, VecDeque};

/// Fixed-capacity FIFO holding the most recent values of a source.
///
/// A capacity of zero disables buffering: pushes are discarded and nothing is
/// ever allocated.
#[derive(Debug, Clone)]
pub struct ReplayBuffer<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T> ReplayBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a value, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Most recently pushed value.
    pub fn last(&self) -> Option<&T> {
        self.values.back()
    }

    /// Buffered values, oldest first.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
