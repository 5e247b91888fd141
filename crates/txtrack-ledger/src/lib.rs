//! # txtrack-ledger
//!
//! **State plane** of the tracker: everything the engines read and mutate
//! while handling one event.
//!
//! ## Architecture
//!
//! 1. **Ledger**: every observed transaction and its lifecycle state, with
//!    arrival order preserved for both pending and settled entries
//! 2. **BlockGraph**: parent/child links, per-block settlement outcomes
//!    and the finalization cursor, for every block retained since the last
//!    finalization
//! 3. **BoundedSet**: fixed-capacity tombstone cache used by both of the
//!    above to recognise identities that were already retired
//!
//! Nothing in this crate calls out to the chain or emits notifications;
//! that is the job of `txtrack-settlement`.

pub mod block_graph;
pub mod bounded_set;
pub mod ledger;

pub use block_graph::{BlockGraph, BlockInsert};
pub use bounded_set::BoundedSet;
pub use ledger::Ledger;
