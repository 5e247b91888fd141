//! # txtrack-types
//!
//! Shared types, errors, and configuration for the **txtrack** transaction
//! lifecycle tracker.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`TxId`], [`BlockHash`]
//! - **Outcome model**: [`Outcome`], [`Settled`], [`TxState`]
//! - **Event model**: [`IncomingEvent`], [`Notification`]
//! - **Configuration**: [`TrackerConfig`]
//! - **Errors**: [`TrackerError`] with `TT_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod outcome;

// Re-export all primary types at crate root for ergonomic imports:
//   use txtrack_types::{TxId, BlockHash, Settled, IncomingEvent, ...};

pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use outcome::*;

// Constants are accessed via `txtrack_types::constants::FOO`
// (not re-exported to avoid name collisions).
