//! In-memory [`ChainApi`] adapter.
//!
//! Holds block bodies and per-(block, tx) verdicts in maps, counts every
//! query, and records unpin calls. Used by the replay CLI (deserialized
//! from a trace file) and by tests. Failures can be injected per block or
//! per (block, tx) pair to exercise the retry path.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use txtrack_types::{BlockHash, Result, TrackerError, TxId};

use crate::ports::ChainApi;

/// Number of chain queries served, by kind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryCounts {
    pub get_body: usize,
    pub is_tx_valid: usize,
    pub is_tx_successful: usize,
}

/// Scripted chain.
///
/// Unknown blocks have an empty body. A transaction is valid unless listed
/// in `invalid`, and successful unless listed in `unsuccessful`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InMemoryChain {
    bodies: HashMap<BlockHash, Vec<TxId>>,
    invalid: HashSet<(BlockHash, TxId)>,
    unsuccessful: HashSet<(BlockHash, TxId)>,
    failing_bodies: HashSet<BlockHash>,
    failing_queries: HashSet<(BlockHash, TxId)>,
    #[serde(skip)]
    unpinned: Vec<Vec<BlockHash>>,
    #[serde(skip)]
    counts: Cell<QueryCounts>,
}

impl InMemoryChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body of `block_hash`.
    #[must_use]
    pub fn with_block<T: Into<TxId>>(
        mut self,
        block_hash: impl Into<BlockHash>,
        txs: impl IntoIterator<Item = T>,
    ) -> Self {
        self.bodies
            .insert(block_hash.into(), txs.into_iter().map(Into::into).collect());
        self
    }

    /// `tx` fails the validity check in `block_hash`.
    #[must_use]
    pub fn with_invalid(mut self, block_hash: impl Into<BlockHash>, tx: impl Into<TxId>) -> Self {
        self.invalid.insert((block_hash.into(), tx.into()));
        self
    }

    /// `tx` executes unsuccessfully in `block_hash`.
    #[must_use]
    pub fn with_unsuccessful(
        mut self,
        block_hash: impl Into<BlockHash>,
        tx: impl Into<TxId>,
    ) -> Self {
        self.unsuccessful.insert((block_hash.into(), tx.into()));
        self
    }

    /// `getBody(block_hash)` fails until [`InMemoryChain::heal`].
    pub fn fail_body(&mut self, block_hash: impl Into<BlockHash>) {
        self.failing_bodies.insert(block_hash.into());
    }

    /// Verdict queries for (`block_hash`, `tx`) fail until [`InMemoryChain::heal`].
    pub fn fail_query(&mut self, block_hash: impl Into<BlockHash>, tx: impl Into<TxId>) {
        self.failing_queries.insert((block_hash.into(), tx.into()));
    }

    /// Clear every injected failure.
    pub fn heal(&mut self) {
        self.failing_bodies.clear();
        self.failing_queries.clear();
    }

    /// Every `unpin` call received, in order.
    #[must_use]
    pub fn unpinned(&self) -> &[Vec<BlockHash>] {
        &self.unpinned
    }

    /// Queries served so far.
    #[must_use]
    pub fn query_counts(&self) -> QueryCounts {
        self.counts.get()
    }

    fn bump(&self, f: impl FnOnce(&mut QueryCounts)) {
        let mut counts = self.counts.get();
        f(&mut counts);
        self.counts.set(counts);
    }

    fn check_query(&self, query: &'static str, block_hash: &BlockHash, tx: &TxId) -> Result<()> {
        if self
            .failing_queries
            .contains(&(block_hash.clone(), tx.clone()))
        {
            return Err(TrackerError::query(
                query,
                block_hash,
                format!("injected failure for {tx}"),
            ));
        }
        Ok(())
    }
}

impl ChainApi for InMemoryChain {
    fn get_body(&self, block_hash: &BlockHash) -> Result<Vec<TxId>> {
        self.bump(|c| c.get_body += 1);
        if self.failing_bodies.contains(block_hash) {
            return Err(TrackerError::query("getBody", block_hash, "injected failure"));
        }
        Ok(self.bodies.get(block_hash).cloned().unwrap_or_default())
    }

    fn is_tx_valid(&self, block_hash: &BlockHash, tx: &TxId) -> Result<bool> {
        self.bump(|c| c.is_tx_valid += 1);
        self.check_query("isTxValid", block_hash, tx)?;
        Ok(!self.invalid.contains(&(block_hash.clone(), tx.clone())))
    }

    fn is_tx_successful(&self, block_hash: &BlockHash, tx: &TxId) -> Result<bool> {
        self.bump(|c| c.is_tx_successful += 1);
        self.check_query("isTxSuccessful", block_hash, tx)?;
        Ok(!self
            .unsuccessful
            .contains(&(block_hash.clone(), tx.clone())))
    }

    fn unpin(&mut self, block_hashes: &[BlockHash]) {
        self.unpinned.push(block_hashes.to_vec());
    }
}
