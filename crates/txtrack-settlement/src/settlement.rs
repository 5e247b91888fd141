//! Settlement engine: reacts to `newBlock`.
//!
//! 1. Register the block in the graph (stale announcements stop here)
//! 2. Fetch the body once and cache it on the node
//! 3. Walk the *pending* transactions in arrival order, classify every one
//!    that appears in the body, record the outcome, mark it settled, and
//!    notify
//!
//! Only the announced block is scanned, so every settlement an event emits
//! names that block. A block counts as scanned once every included pending
//! transaction was classified. The first failing query stops the scan; the
//! block is retried when it is announced again, and its unsettled
//! transactions stay pending and free to settle in a later block. A retry
//! of the block that already is the finalization cursor completes what it
//! settles at once, since no later walk will reach that block again.

use txtrack_ledger::{BlockGraph, BlockInsert, Ledger};
use txtrack_types::{BlockHash, Outcome, Result, Settled, TxId};

use crate::ports::{ChainApi, TxObserver};

/// What one `newBlock` event did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SettlementReport {
    /// The announcement fell outside the retained graph and was ignored.
    pub stale: bool,
    /// This event scanned the block to completion.
    pub scanned: bool,
    /// A query failed; the block is retried on its next announcement.
    pub incomplete: bool,
    /// Transactions settled, in notification order.
    pub settled: Vec<TxId>,
    /// Transactions completed because the block was already finalized.
    pub done: Vec<TxId>,
}

/// Borrowed view of the tracker state needed to settle transactions.
pub struct SettlementEngine<'a> {
    ledger: &'a mut Ledger,
    graph: &'a mut BlockGraph,
}

impl<'a> SettlementEngine<'a> {
    pub fn new(ledger: &'a mut Ledger, graph: &'a mut BlockGraph) -> Self {
        Self { ledger, graph }
    }

    /// Handle `newBlock { block_hash, parent }`.
    pub fn on_new_block<A: ChainApi, O: TxObserver>(
        &mut self,
        block_hash: &BlockHash,
        parent: &BlockHash,
        api: &A,
        observer: &mut O,
    ) -> SettlementReport {
        let mut report = SettlementReport::default();

        match self.graph.ensure_block(block_hash, parent) {
            BlockInsert::Stale => {
                tracing::debug!(
                    block = %block_hash.short(),
                    parent = %parent.short(),
                    "Ignoring announcement outside the retained graph"
                );
                report.stale = true;
                return report;
            }
            BlockInsert::Known if self.graph.is_scanned(block_hash) => {
                tracing::debug!(block = %block_hash.short(), "Block already scanned");
                return report;
            }
            BlockInsert::Known => {
                tracing::debug!(block = %block_hash.short(), "Retrying incomplete scan");
            }
            BlockInsert::Inserted => {}
        }

        if self.scan_block(block_hash, api, observer, &mut report.settled) {
            self.graph.mark_scanned(block_hash);
            report.scanned = true;
        } else {
            report.incomplete = true;
        }
        if self.graph.finalized() == Some(block_hash) {
            self.complete_on_cursor(block_hash, observer, &mut report);
        }
        report
    }

    fn complete_on_cursor<O: TxObserver>(
        &mut self,
        block_hash: &BlockHash,
        observer: &mut O,
        report: &mut SettlementReport,
    ) {
        for tx in &report.settled {
            let Some(outcome) = self.graph.outcome(block_hash, tx) else {
                continue;
            };
            if let Err(err) = self.ledger.mark_done(tx) {
                tracing::warn!(block = %block_hash.short(), tx = %tx, error = %err, "Completion skipped");
                continue;
            }
            tracing::debug!(tx = %tx, block = %block_hash.short(), "Transaction done on the cursor block");
            observer.on_tx_done(tx, &Settled::new(block_hash.clone(), outcome));
            report.done.push(tx.clone());
        }
    }

    /// Check every pending transaction against one block's body.
    ///
    /// Returns `true` when every included transaction was classified.
    fn scan_block<A: ChainApi, O: TxObserver>(
        &mut self,
        block_hash: &BlockHash,
        api: &A,
        observer: &mut O,
        settled: &mut Vec<TxId>,
    ) -> bool {
        if self.graph.body(block_hash).is_none() {
            let fetched = api
                .get_body(block_hash)
                .and_then(|body| self.graph.cache_body(block_hash, body.into_iter().collect()));
            if let Err(err) = fetched {
                tracing::warn!(
                    block = %block_hash.short(),
                    error = %err,
                    "Body unavailable; block is retried if announced again"
                );
                return false;
            }
        }
        let Some(body) = self.graph.body(block_hash) else {
            return false;
        };

        let included: Vec<TxId> = self
            .ledger
            .pending()
            .filter(|tx| body.contains(*tx))
            .cloned()
            .collect();

        for tx in included {
            let outcome = match classify(api, block_hash, &tx) {
                Ok(outcome) => outcome,
                Err(err) => {
                    tracing::warn!(
                        block = %block_hash.short(),
                        tx = %tx,
                        error = %err,
                        "Verdict unavailable; transaction stays pending"
                    );
                    return false;
                }
            };

            if let Err(err) = self.graph.record_settlement(block_hash, &tx, outcome) {
                tracing::warn!(block = %block_hash.short(), tx = %tx, error = %err, "Settlement not recorded");
                continue;
            }
            if let Err(err) = self.ledger.mark_settled(&tx, block_hash) {
                tracing::warn!(block = %block_hash.short(), tx = %tx, error = %err, "Settlement skipped");
                continue;
            }

            tracing::debug!(
                tx = %tx,
                block = %block_hash.short(),
                outcome = %outcome,
                "Transaction settled"
            );
            observer.on_tx_settled(&tx, &Settled::new(block_hash.clone(), outcome));
            settled.push(tx);
        }

        true
    }
}

/// Validity first; execution result only for valid transactions.
fn classify<A: ChainApi>(api: &A, block_hash: &BlockHash, tx: &TxId) -> Result<Outcome> {
    if !api.is_tx_valid(block_hash, tx)? {
        return Ok(Outcome::Invalid);
    }
    Ok(Outcome::Valid {
        successful: api.is_tx_successful(block_hash, tx)?,
    })
}
