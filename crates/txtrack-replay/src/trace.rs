//! Trace files and the replay loop.
//!
//! A trace is one JSON document:
//!
//! ```json
//! {
//!   "chain": {
//!     "bodies": { "b1": ["tx1", "tx2"] },
//!     "invalid": [["b1", "tx2"]],
//!     "unsuccessful": [],
//!     "failingBodies": [],
//!     "failingQueries": []
//!   },
//!   "events": [
//!     { "type": "newTransaction", "value": "tx1" },
//!     { "type": "newBlock", "blockHash": "b1", "parent": "genesis" },
//!     { "type": "finalized", "blockHash": "b1" }
//!   ]
//! }
//! ```
//!
//! Replay writes one JSON line per notification and per `unpin` call, in
//! the order the tracker produced them, then a summary line.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use txtrack_settlement::{
    InMemoryChain, QueryCounts, Recorder, Tracker, TrackerStats, compute_notification_root,
    root_hex,
};
use txtrack_types::{BlockHash, IncomingEvent, Notification, TrackerConfig};

/// Scripted chain plus the event stream to feed the tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Trace {
    pub chain: InMemoryChain,
    pub events: Vec<IncomingEvent>,
}

impl Trace {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading trace {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing trace {}", path.display()))
    }
}

/// Load a tracker configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<TrackerConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    TrackerConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum OutputLine<'a> {
    #[serde(rename_all = "camelCase")]
    Unpin {
        event: usize,
        block_hashes: &'a [BlockHash],
    },
    #[serde(rename_all = "camelCase")]
    Summary {
        events: usize,
        cursor: Option<&'a BlockHash>,
        retained_blocks: usize,
        tracked_transactions: usize,
        stats: TrackerStats,
        queries: QueryCounts,
        notification_root: String,
    },
}

/// Final state of one replay.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub notifications: Vec<Notification>,
    pub unpins: Vec<Vec<BlockHash>>,
    pub stats: TrackerStats,
    pub root: [u8; 32],
}

/// Feed every event of `trace` through a fresh tracker, streaming output
/// lines to `out`.
pub fn replay(
    trace: Trace,
    config: &TrackerConfig,
    out: &mut impl Write,
) -> anyhow::Result<ReplayOutcome> {
    let mut tracker = Tracker::new(config)?;
    let mut chain = trace.chain;
    let mut recorder = Recorder::new();
    let mut notifications = Vec::new();
    let mut unpins_seen = 0;

    for (index, event) in trace.events.iter().enumerate() {
        tracker.handle(event, &mut chain, &mut recorder);

        for notification in recorder.drain() {
            serde_json::to_writer(&mut *out, &notification)?;
            writeln!(out)?;
            notifications.push(notification);
        }
        for block_hashes in &chain.unpinned()[unpins_seen..] {
            let line = OutputLine::Unpin {
                event: index,
                block_hashes: block_hashes.as_slice(),
            };
            serde_json::to_writer(&mut *out, &line)?;
            writeln!(out)?;
        }
        unpins_seen = chain.unpinned().len();
    }

    let root = compute_notification_root(&notifications);
    let stats = tracker.stats();
    let summary = OutputLine::Summary {
        events: trace.events.len(),
        cursor: tracker.cursor(),
        retained_blocks: tracker.graph().len(),
        tracked_transactions: tracker.ledger().len(),
        stats,
        queries: chain.query_counts(),
        notification_root: root_hex(&root),
    };
    serde_json::to_writer(&mut *out, &summary)?;
    writeln!(out)?;
    out.flush()?;

    tracing::info!(
        events = trace.events.len(),
        notifications = notifications.len(),
        "Replay complete"
    );

    Ok(ReplayOutcome {
        notifications,
        unpins: chain.unpinned().to_vec(),
        stats,
        root,
    })
}
