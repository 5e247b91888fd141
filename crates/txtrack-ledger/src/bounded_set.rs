//! Tombstones for identities that left the live state.
//!
//! Released blocks and retired transactions are remembered here so a late
//! announcement naming them is dropped instead of restarting their
//! lifecycle. Only the most recent `limit` identities are kept; older ones
//! fall out first.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// Insertion-ordered set holding at most `limit` members.
#[derive(Debug, Clone)]
pub struct BoundedSet<T> {
    members: HashSet<T>,
    /// Oldest member at the front.
    arrivals: VecDeque<T>,
    limit: usize,
}

impl<T: Eq + Hash + Clone> BoundedSet<T> {
    /// # Panics
    /// Panics if `limit` is zero; callers validate sizes through
    /// `TrackerConfig::validate` first.
    pub fn new(limit: usize) -> Self {
        assert!(limit > 0, "BoundedSet limit must be non-zero");
        Self {
            members: HashSet::with_capacity(limit.min(1024)),
            arrivals: VecDeque::new(),
            limit,
        }
    }

    /// Add `item`, dropping the oldest member when full.
    ///
    /// Returns `false` when `item` was already a member; its position is
    /// not refreshed.
    pub fn insert(&mut self, item: T) -> bool {
        if !self.members.insert(item.clone()) {
            return false;
        }
        self.arrivals.push_back(item);
        while self.arrivals.len() > self.limit {
            if let Some(dropped) = self.arrivals.pop_front() {
                self.members.remove(&dropped);
            }
        }
        true
    }

    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
