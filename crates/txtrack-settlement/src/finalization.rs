//! Finalization engine: reacts to `finalized`.
//!
//! `finalized` is not emitted for every finalized block, so the named block
//! alone is not enough: the engine walks parent pointers back to the
//! current cursor and completes every transaction settled anywhere on that
//! chain, oldest block first, each block's transactions in arrival order.
//! Afterwards the graph's cursor advances and every block that is not the
//! new cursor or one of its descendants is released and unpinned.

use txtrack_ledger::{BlockGraph, Ledger};
use txtrack_types::{BlockHash, Settled, TxId};

use crate::ports::{ChainApi, TxObserver};

/// What one `finalized` event did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FinalizationReport {
    /// Newly finalized blocks, oldest first. Empty when nothing advanced.
    pub chain: Vec<BlockHash>,
    /// Transactions completed, in notification order.
    pub done: Vec<TxId>,
    /// Blocks released (and unpinned).
    pub released: Vec<BlockHash>,
    /// Settled transactions dropped with their released fork blocks.
    pub orphaned: Vec<TxId>,
}

impl FinalizationReport {
    /// Whether the cursor moved.
    #[must_use]
    pub fn advanced(&self) -> bool {
        !self.chain.is_empty()
    }
}

/// Borrowed view of the tracker state needed to finalize transactions.
pub struct FinalizationEngine<'a> {
    ledger: &'a mut Ledger,
    graph: &'a mut BlockGraph,
}

impl<'a> FinalizationEngine<'a> {
    pub fn new(ledger: &'a mut Ledger, graph: &'a mut BlockGraph) -> Self {
        Self { ledger, graph }
    }

    /// Handle `finalized { block_hash }`.
    pub fn on_finalized<A: ChainApi, O: TxObserver>(
        &mut self,
        block_hash: &BlockHash,
        api: &mut A,
        observer: &mut O,
    ) -> FinalizationReport {
        let mut report = FinalizationReport::default();

        if self.graph.finalized() == Some(block_hash) {
            tracing::debug!(block = %block_hash.short(), "Block is already the finalization cursor");
            return report;
        }

        let chain = match self.graph.chain_since(self.graph.finalized(), block_hash) {
            Ok(chain) => chain,
            Err(err) => {
                tracing::warn!(
                    block = %block_hash.short(),
                    cursor = ?self.graph.finalized(),
                    error = %err,
                    "Cannot link finalized block to the cursor; nothing finalized"
                );
                return report;
            }
        };

        for block in &chain {
            for tx in self.ledger.settled_in(block) {
                let Some(outcome) = self.graph.outcome(block, &tx) else {
                    tracing::warn!(block = %block.short(), tx = %tx, "Settled transaction has no recorded outcome");
                    continue;
                };
                if let Err(err) = self.ledger.mark_done(&tx) {
                    tracing::warn!(block = %block.short(), tx = %tx, error = %err, "Completion skipped");
                    continue;
                }
                tracing::debug!(tx = %tx, block = %block.short(), outcome = %outcome, "Transaction done");
                observer.on_tx_done(&tx, &Settled::new(block.clone(), outcome));
                report.done.push(tx);
            }
        }

        self.graph.set_finalized(block_hash.clone());

        let obsolete = self.graph.fork_set(&chain);
        for block in &obsolete {
            let orphans = self.ledger.evict_settled_in(block);
            if !orphans.is_empty() {
                tracing::debug!(
                    block = %block.short(),
                    orphans = orphans.len(),
                    "Dropping settlements on a pruned block"
                );
                report.orphaned.extend(orphans);
            }
        }
        self.graph.release(&obsolete);
        api.unpin(&obsolete);

        tracing::info!(
            finalized = %block_hash.short(),
            chain_len = chain.len(),
            done = report.done.len(),
            released = obsolete.len(),
            orphaned = report.orphaned.len(),
            retained = self.graph.len(),
            "Finalization applied"
        );

        report.chain = chain;
        report.released = obsolete;
        report
    }
}
