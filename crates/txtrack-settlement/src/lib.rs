//! # txtrack-settlement
//!
//! **Engine plane**: turns chain events into exactly-once lifecycle
//! notifications.
//!
//! ## Architecture
//!
//! The [`Tracker`] owns the state plane (`txtrack-ledger`) and routes each
//! inbound event:
//! 1. `newTransaction` → Ledger (append, arrival order)
//! 2. `newBlock` → [`SettlementEngine`]: scan pending transactions against
//!    the announced block's body, classify, emit `on_tx_settled`
//! 3. `finalized` → [`FinalizationEngine`]: walk back to the cursor, emit
//!    `on_tx_done` for the whole newly finalized chain, release and unpin
//!    obsolete blocks
//!
//! ## Ports
//!
//! The chain is reached only through [`ChainApi`] and notifications leave
//! only through [`TxObserver`]. [`InMemoryChain`] and [`Recorder`] are the
//! in-process implementations used by the replay CLI and the tests.

pub mod determinism;
pub mod finalization;
pub mod memory;
pub mod ports;
pub mod settlement;
pub mod tracker;

pub use determinism::{compute_notification_root, root_hex, verify_notification_root};
pub use finalization::{FinalizationEngine, FinalizationReport};
pub use memory::{InMemoryChain, QueryCounts};
pub use ports::{ChainApi, Recorder, TxObserver};
pub use settlement::{SettlementEngine, SettlementReport};
pub use tracker::{Tracker, TrackerStats};
