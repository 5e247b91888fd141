//! Block graph: the tree of blocks retained since the last finalization.
//!
//! ```text
//!                    +-> f1 +-> f2
//!                    |
//!   cursor +-> c1 +-> c2 +-> c3 +-> d1
//!           |
//!           +-> s1
//! ```
//!
//! Blocks are created lazily the first time a `newBlock` event names them.
//! When `c3` is finalized, the chain `c1, c2, c3` is walked from the parent
//! pointers, and every retained block that is not `c3` or one of its
//! descendants (`cursor`, `c1`, `c2`, `s1`, `f1`, `f2`) becomes obsolete
//! and is released. Released hashes are remembered in a bounded tombstone
//! cache so a late announcement naming them (or naming them as parent) is
//! rejected as stale instead of growing a dead branch.
//!
//! The graph also owns the finalization cursor. Once one exists, a new
//! block must hang off the cursor or off a retained block; anything else
//! (a late sibling of a finalized block, a child of a block that was never
//! retained) is stale.

use std::collections::{HashMap, HashSet, VecDeque};

use txtrack_types::{BlockHash, Outcome, Result, TrackerError, TxId, constants};

use crate::bounded_set::BoundedSet;

/// Result of [`BlockGraph::ensure_block`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockInsert {
    /// First sighting; a node was created.
    Inserted,
    /// The block is already retained.
    Known,
    /// The block or its parent was already released, or the parent is
    /// neither retained nor the finalization cursor.
    Stale,
}

#[derive(Debug, Clone)]
struct BlockNode {
    parent: BlockHash,
    /// Distance from the oldest retained ancestor; 0 when the parent is unknown.
    height: u64,
    /// Position in announcement order.
    arrival: u64,
    children: Vec<BlockHash>,
    /// Outcomes of transactions that settled in this block.
    settlements: HashMap<TxId, Outcome>,
    /// Cached body, so it is fetched at most once.
    body: Option<HashSet<TxId>>,
    /// Every included pending transaction was classified.
    scanned: bool,
}

/// Parent/child links and settlement outcomes for every retained block.
#[derive(Debug)]
pub struct BlockGraph {
    nodes: HashMap<BlockHash, BlockNode>,
    released: BoundedSet<BlockHash>,
    /// Most recently finalized block.
    finalized: Option<BlockHash>,
    next_arrival: u64,
    max_chain_walk: usize,
}

impl BlockGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new(released_cache_size: usize, max_chain_walk: usize) -> Self {
        Self {
            nodes: HashMap::new(),
            released: BoundedSet::new(released_cache_size),
            finalized: None,
            next_arrival: 0,
            max_chain_walk,
        }
    }

    /// Create the node for `block_hash` on first sight.
    pub fn ensure_block(&mut self, block_hash: &BlockHash, parent: &BlockHash) -> BlockInsert {
        if self.nodes.contains_key(block_hash) {
            return BlockInsert::Known;
        }
        if self.released.contains(block_hash) || self.released.contains(parent) {
            return BlockInsert::Stale;
        }
        if let Some(cursor) = &self.finalized {
            if parent != cursor && !self.nodes.contains_key(parent) {
                return BlockInsert::Stale;
            }
        }

        let height = match self.nodes.get_mut(parent) {
            Some(parent_node) => {
                parent_node.children.push(block_hash.clone());
                parent_node.height + 1
            }
            None => 0,
        };
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        self.nodes.insert(
            block_hash.clone(),
            BlockNode {
                parent: parent.clone(),
                height,
                arrival,
                children: Vec::new(),
                settlements: HashMap::new(),
                body: None,
                scanned: false,
            },
        );
        BlockInsert::Inserted
    }

    /// Most recently finalized block, if any.
    #[must_use]
    pub fn finalized(&self) -> Option<&BlockHash> {
        self.finalized.as_ref()
    }

    /// Move the finalization cursor. Pruning is up to the caller.
    pub fn set_finalized(&mut self, block_hash: BlockHash) {
        self.finalized = Some(block_hash);
    }

    /// Attach a settlement outcome to a retained block.
    ///
    /// # Errors
    /// Returns `BlockNotFound` if the block is not retained.
    pub fn record_settlement(
        &mut self,
        block_hash: &BlockHash,
        tx: &TxId,
        outcome: Outcome,
    ) -> Result<()> {
        let node = self
            .nodes
            .get_mut(block_hash)
            .ok_or_else(|| TrackerError::BlockNotFound(block_hash.clone()))?;
        node.settlements.insert(tx.clone(), outcome);
        Ok(())
    }

    /// Outcome recorded for `tx` in `block_hash`, if any.
    #[must_use]
    pub fn outcome(&self, block_hash: &BlockHash, tx: &TxId) -> Option<Outcome> {
        self.nodes
            .get(block_hash)
            .and_then(|node| node.settlements.get(tx).copied())
    }

    /// Blocks from `head` back to (not including) `cursor`, oldest first.
    ///
    /// With no cursor the walk stops at the first parent that is not
    /// retained (the implicit genesis).
    ///
    /// # Errors
    /// - `AncestorNotFound` if the walk leaves the retained graph before
    ///   meeting `cursor`, or `head` itself is unknown
    /// - `ChainTooLong` if the walk exceeds the configured bound
    pub fn chain_since(
        &self,
        cursor: Option<&BlockHash>,
        head: &BlockHash,
    ) -> Result<Vec<BlockHash>> {
        let missing = || TrackerError::AncestorNotFound {
            cursor: cursor.map_or_else(|| "genesis".to_string(), ToString::to_string),
            head: head.clone(),
        };

        let mut chain = Vec::new();
        let mut current = head;
        loop {
            if cursor == Some(current) {
                break;
            }
            let Some(node) = self.nodes.get(current) else {
                if cursor.is_none() && !chain.is_empty() {
                    break;
                }
                return Err(missing());
            };
            if chain.len() >= self.max_chain_walk {
                return Err(TrackerError::ChainTooLong {
                    head: head.clone(),
                    limit: self.max_chain_walk,
                });
            }
            chain.push(current.clone());
            current = &node.parent;
        }
        chain.reverse();
        Ok(chain)
    }

    /// Every retained block made obsolete by finalizing `chain`.
    ///
    /// The last element of `chain` is the new cursor. Everything retained
    /// that is neither the cursor nor one of its descendants is obsolete:
    /// the finalized chain below it, the previous cursor, and every fork
    /// that branched off at or below it. Returned in announcement order.
    #[must_use]
    pub fn fork_set(&self, chain: &[BlockHash]) -> Vec<BlockHash> {
        let Some(finalized) = chain.last() else {
            return Vec::new();
        };

        let mut live: HashSet<&BlockHash> = HashSet::new();
        let mut queue: VecDeque<&BlockHash> = VecDeque::from([finalized]);
        while let Some(hash) = queue.pop_front() {
            if !live.insert(hash) {
                continue;
            }
            if let Some(node) = self.nodes.get(hash) {
                queue.extend(node.children.iter());
            }
        }

        let mut obsolete: Vec<(&BlockHash, u64)> = self
            .nodes
            .iter()
            .filter(|(hash, _)| !live.contains(hash))
            .map(|(hash, node)| (hash, node.arrival))
            .collect();
        obsolete.sort_by_key(|(_, arrival)| *arrival);
        obsolete.into_iter().map(|(hash, _)| hash.clone()).collect()
    }

    /// Drop all state for `hashes` and remember them as released.
    ///
    /// Returns how many retained blocks were actually dropped.
    pub fn release(&mut self, hashes: &[BlockHash]) -> usize {
        let mut dropped = 0;
        for hash in hashes {
            let Some(node) = self.nodes.remove(hash) else {
                continue;
            };
            if let Some(parent) = self.nodes.get_mut(&node.parent) {
                parent.children.retain(|child| child != hash);
            }
            self.released.insert(hash.clone());
            dropped += 1;
        }
        tracing::trace!(dropped, retained = self.nodes.len(), "Blocks released");
        dropped
    }

    /// Cached body of a retained block.
    #[must_use]
    pub fn body(&self, block_hash: &BlockHash) -> Option<&HashSet<TxId>> {
        self.nodes.get(block_hash).and_then(|node| node.body.as_ref())
    }

    /// Cache the body of a retained block.
    ///
    /// # Errors
    /// Returns `BlockNotFound` if the block is not retained.
    pub fn cache_body(&mut self, block_hash: &BlockHash, body: HashSet<TxId>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(block_hash)
            .ok_or_else(|| TrackerError::BlockNotFound(block_hash.clone()))?;
        node.body = Some(body);
        Ok(())
    }

    /// Mark a block as fully scanned. The cached body is no longer needed.
    pub fn mark_scanned(&mut self, block_hash: &BlockHash) {
        if let Some(node) = self.nodes.get_mut(block_hash) {
            node.scanned = true;
            node.body = None;
        }
    }

    #[must_use]
    pub fn is_scanned(&self, block_hash: &BlockHash) -> bool {
        self.nodes.get(block_hash).is_some_and(|node| node.scanned)
    }

    #[must_use]
    pub fn contains(&self, block_hash: &BlockHash) -> bool {
        self.nodes.contains_key(block_hash)
    }

    #[must_use]
    pub fn parent(&self, block_hash: &BlockHash) -> Option<&BlockHash> {
        self.nodes.get(block_hash).map(|node| &node.parent)
    }

    #[must_use]
    pub fn height(&self, block_hash: &BlockHash) -> Option<u64> {
        self.nodes.get(block_hash).map(|node| node.height)
    }

    /// Whether `block_hash` was released recently.
    #[must_use]
    pub fn is_released(&self, block_hash: &BlockHash) -> bool {
        self.released.contains(block_hash)
    }

    /// Number of retained blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for BlockGraph {
    fn default() -> Self {
        Self::new(
            constants::DEFAULT_RELEASED_CACHE_SIZE,
            constants::DEFAULT_MAX_CHAIN_WALK,
        )
    }
}
