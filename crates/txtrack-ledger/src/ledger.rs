//! Transaction ledger.
//!
//! Every transaction observed through `newTransaction` gets an entry here
//! with a monotonically increasing arrival sequence. Two ordered indexes
//! hang off that sequence:
//!
//! - `pending`: arrival sequence → transaction, for every `Pending` entry
//! - `settled`: block → (arrival sequence → transaction), for every
//!   `Settled` entry
//!
//! Both notification streams are produced by iterating these indexes, so
//! arrival order falls out of the data structure instead of being re-sorted
//! per event. Entries leave the ledger when they reach `Done` or when the
//! block they settled in is released without being finalized; either way
//! the identity is retired and a re-delivery is ignored.

use std::collections::{BTreeMap, HashMap};

use txtrack_types::{BlockHash, Result, TrackerError, TxId, TxState, constants};

use crate::bounded_set::BoundedSet;

#[derive(Debug, Clone)]
struct Entry {
    /// Position in arrival order.
    seq: u64,
    state: TxState,
    /// Set once the entry is `Settled`.
    settled_in: Option<BlockHash>,
}

/// Lifecycle records for all live transactions.
#[derive(Debug)]
pub struct Ledger {
    entries: HashMap<TxId, Entry>,
    /// Pending transactions in arrival order.
    pending: BTreeMap<u64, TxId>,
    /// Settled transactions grouped by block, each group in arrival order.
    settled: HashMap<BlockHash, BTreeMap<u64, TxId>>,
    /// Identities that completed or were orphaned.
    retired: BoundedSet<TxId>,
    next_seq: u64,
}

impl Ledger {
    /// Create an empty ledger remembering up to `retired_cache_size`
    /// retired identities.
    #[must_use]
    pub fn new(retired_cache_size: usize) -> Self {
        Self {
            entries: HashMap::new(),
            pending: BTreeMap::new(),
            settled: HashMap::new(),
            retired: BoundedSet::new(retired_cache_size),
            next_seq: 0,
        }
    }

    /// Start tracking `tx` as `Pending`.
    ///
    /// Returns `false` (and changes nothing) if `tx` is already live or was
    /// recently retired.
    pub fn record(&mut self, tx: TxId) -> bool {
        if self.entries.contains_key(&tx) || self.retired.contains(&tx) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(seq, tx.clone());
        self.entries.insert(
            tx,
            Entry {
                seq,
                state: TxState::Pending,
                settled_in: None,
            },
        );
        true
    }

    /// `Pending → Settled`, remembering the settling block.
    ///
    /// # Errors
    /// - `TxNotTracked` if `tx` has no live entry
    /// - `InvalidTransition` if `tx` is not `Pending`
    pub fn mark_settled(&mut self, tx: &TxId, block_hash: &BlockHash) -> Result<()> {
        let entry = self
            .entries
            .get_mut(tx)
            .ok_or_else(|| TrackerError::TxNotTracked(tx.clone()))?;
        if !entry.state.can_transition_to(TxState::Settled) {
            return Err(TrackerError::InvalidTransition {
                tx: tx.clone(),
                from: entry.state,
                to: TxState::Settled,
            });
        }

        entry.state = TxState::Settled;
        entry.settled_in = Some(block_hash.clone());
        self.pending.remove(&entry.seq);
        self.settled
            .entry(block_hash.clone())
            .or_default()
            .insert(entry.seq, tx.clone());
        Ok(())
    }

    /// `Settled → Done`. The entry is removed and the identity retired.
    ///
    /// Returns the block the transaction had settled in.
    ///
    /// # Errors
    /// - `TxNotTracked` if `tx` has no live entry
    /// - `InvalidTransition` if `tx` is not `Settled`
    pub fn mark_done(&mut self, tx: &TxId) -> Result<BlockHash> {
        let entry = self
            .entries
            .get(tx)
            .ok_or_else(|| TrackerError::TxNotTracked(tx.clone()))?;
        if !entry.state.can_transition_to(TxState::Done) {
            return Err(TrackerError::InvalidTransition {
                tx: tx.clone(),
                from: entry.state,
                to: TxState::Done,
            });
        }
        let seq = entry.seq;
        let block_hash = entry
            .settled_in
            .clone()
            .ok_or_else(|| TrackerError::Internal(format!("settled tx {tx} has no block")))?;

        if let Some(group) = self.settled.get_mut(&block_hash) {
            group.remove(&seq);
            if group.is_empty() {
                self.settled.remove(&block_hash);
            }
        }
        self.entries.remove(tx);
        self.retired.insert(tx.clone());
        Ok(block_hash)
    }

    /// Pending transactions in arrival order.
    pub fn pending(&self) -> impl Iterator<Item = &TxId> {
        self.pending.values()
    }

    /// Transactions currently `Settled` in `block_hash`, in arrival order.
    #[must_use]
    pub fn settled_in(&self, block_hash: &BlockHash) -> Vec<TxId> {
        self.settled
            .get(block_hash)
            .map(|group| group.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop every transaction still `Settled` in `block_hash`.
    ///
    /// Used when that block is released without being finalized: its
    /// transactions can never complete, so they are retired as orphans.
    /// Returns the orphaned identities in arrival order.
    pub fn evict_settled_in(&mut self, block_hash: &BlockHash) -> Vec<TxId> {
        let Some(group) = self.settled.remove(block_hash) else {
            return Vec::new();
        };
        let orphans: Vec<TxId> = group.into_values().collect();
        for tx in &orphans {
            self.entries.remove(tx);
            self.retired.insert(tx.clone());
        }
        orphans
    }

    /// Current lifecycle state of a live transaction.
    #[must_use]
    pub fn state(&self, tx: &TxId) -> Option<TxState> {
        self.entries.get(tx).map(|entry| entry.state)
    }

    /// Block a live `Settled` transaction settled in.
    #[must_use]
    pub fn settled_block(&self, tx: &TxId) -> Option<&BlockHash> {
        self.entries.get(tx).and_then(|entry| entry.settled_in.as_ref())
    }

    /// Whether `tx` completed or was orphaned recently.
    #[must_use]
    pub fn is_retired(&self, tx: &TxId) -> bool {
        self.retired.contains(tx)
    }

    /// Number of live entries (pending + settled).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn settled_len(&self) -> usize {
        self.entries.len() - self.pending.len()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(constants::DEFAULT_RETIRED_CACHE_SIZE)
    }
}
