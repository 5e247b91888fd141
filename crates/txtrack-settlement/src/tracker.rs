//! The event reducer.
//!
//! One [`Tracker`] owns all mutable state (ledger and block graph,
//! which carries the finalization cursor).
//! Each inbound event is handled to completion, synchronously, before the
//! next one is accepted; the chain API and observer are borrowed only for
//! the duration of that call.

use serde::Serialize;
use txtrack_ledger::{BlockGraph, Ledger};
use txtrack_types::{BlockHash, IncomingEvent, Result, TrackerConfig, TxId};

use crate::finalization::FinalizationEngine;
use crate::ports::{ChainApi, TxObserver};
use crate::settlement::SettlementEngine;

/// Running totals since the tracker was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrackerStats {
    pub events: u64,
    pub transactions: u64,
    pub ignored_transactions: u64,
    pub stale_blocks: u64,
    pub settled: u64,
    pub done: u64,
    pub orphaned: u64,
    pub released: u64,
}

/// Transaction lifecycle tracker.
#[derive(Debug)]
pub struct Tracker {
    ledger: Ledger,
    graph: BlockGraph,
    stats: TrackerStats,
}

impl Tracker {
    /// Build a tracker from a validated configuration.
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        config.validate()?;
        let mut graph = BlockGraph::new(config.released_cache_size, config.max_chain_walk);
        if let Some(anchor) = &config.initial_finalized {
            graph.set_finalized(anchor.clone());
        }
        Ok(Self {
            ledger: Ledger::new(config.retired_cache_size),
            graph,
            stats: TrackerStats::default(),
        })
    }

    /// Handle one inbound event.
    pub fn handle<A: ChainApi, O: TxObserver>(
        &mut self,
        event: &IncomingEvent,
        api: &mut A,
        observer: &mut O,
    ) {
        self.stats.events += 1;
        tracing::trace!(event = event.kind(), "Handling event");

        match event {
            IncomingEvent::NewTransaction { value } => self.on_new_transaction(value),
            IncomingEvent::NewBlock { block_hash, parent } => {
                let report = SettlementEngine::new(&mut self.ledger, &mut self.graph)
                    .on_new_block(block_hash, parent, api, observer);
                self.stats.stale_blocks += u64::from(report.stale);
                self.stats.settled += report.settled.len() as u64;
                self.stats.done += report.done.len() as u64;
            }
            IncomingEvent::Finalized { block_hash } => {
                let report = FinalizationEngine::new(&mut self.ledger, &mut self.graph)
                    .on_finalized(block_hash, api, observer);
                self.stats.done += report.done.len() as u64;
                self.stats.orphaned += report.orphaned.len() as u64;
                self.stats.released += report.released.len() as u64;
            }
        }
    }

    /// Handle a sequence of events in order.
    pub fn replay<'e, A, O>(
        &mut self,
        events: impl IntoIterator<Item = &'e IncomingEvent>,
        api: &mut A,
        observer: &mut O,
    ) where
        A: ChainApi,
        O: TxObserver,
    {
        for event in events {
            self.handle(event, api, observer);
        }
    }

    fn on_new_transaction(&mut self, tx: &TxId) {
        if self.ledger.record(tx.clone()) {
            self.stats.transactions += 1;
            tracing::debug!(tx = %tx, pending = self.ledger.pending_len(), "Transaction tracked");
        } else {
            self.stats.ignored_transactions += 1;
            tracing::debug!(tx = %tx, "Transaction already tracked or retired; ignored");
        }
    }

    /// Most recently finalized block; `None` until the first finalization
    /// unless configured.
    #[must_use]
    pub fn cursor(&self) -> Option<&BlockHash> {
        self.graph.finalized()
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn graph(&self) -> &BlockGraph {
        &self.graph
    }

    #[must_use]
    pub fn stats(&self) -> TrackerStats {
        self.stats
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self {
            ledger: Ledger::default(),
            graph: BlockGraph::default(),
            stats: TrackerStats::default(),
        }
    }
}
