//! Bounded channel scrollback.

use crate::message::Message;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default scrollback capacity per channel.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Fixed-capacity FIFO of logged messages, oldest first.
///
/// Never holds more than `capacity` entries: the oldest is evicted before a
/// new one is appended.
#[derive(Debug)]
pub struct MessageBuffer {
    entries: VecDeque<Arc<Message>>,
    capacity: usize,
}

impl MessageBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Append `message`, evicting the oldest entry when full.
    pub fn push(&mut self, message: Arc<Message>) -> Option<Arc<Message>> {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(message);
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Message>> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Up to `n` most recent messages, oldest first.
    pub fn last(&self, n: usize) -> Vec<Arc<Message>> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Most recent message from `nick`, if any.
    pub fn last_from(&self, nick: &str) -> Option<Arc<Message>> {
        self.entries
            .iter()
            .rev()
            .find(|m| m.nick().is_some_and(|n| n.eq_ignore_ascii_case(nick)))
            .cloned()
    }
}
