//! Error types for the txtrack lifecycle tracker.
//!
//! All errors use the `TT_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Transaction ledger errors
//! - 2xx: Block graph errors
//! - 3xx: Chain query errors
//! - 9xx: General / internal errors
//!
//! None of these ever reach the notification callbacks. The engines log
//! them and fall back to "nothing happened" for the event at hand.

use thiserror::Error;

use crate::{BlockHash, TxId, TxState};

/// Central error enum for all txtrack operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    // =================================================================
    // Ledger Errors (1xx)
    // =================================================================
    /// The transaction is not tracked by the ledger.
    #[error("TT_ERR_100: Transaction not tracked: {0}")]
    TxNotTracked(TxId),

    /// A lifecycle transition was requested from the wrong state.
    #[error("TT_ERR_101: Transaction {tx} cannot move from {from} to {to}")]
    InvalidTransition { tx: TxId, from: TxState, to: TxState },

    // =================================================================
    // Block Graph Errors (2xx)
    // =================================================================
    /// The block is not retained by the graph.
    #[error("TT_ERR_200: Block not found: {0}")]
    BlockNotFound(BlockHash),

    /// Walking parents from `head` never reached the finalization cursor.
    #[error("TT_ERR_201: Finalization cursor {cursor} is not an ancestor of {head}")]
    AncestorNotFound { cursor: String, head: BlockHash },

    /// The ancestor walk exceeded the configured bound.
    #[error("TT_ERR_202: Ancestor walk from {head} exceeded {limit} blocks")]
    ChainTooLong { head: BlockHash, limit: usize },

    // =================================================================
    // Chain Query Errors (3xx)
    // =================================================================
    /// A chain query (`getBody`, `isTxValid`, `isTxSuccessful`) failed.
    #[error("TT_ERR_300: Query {query} failed for block {block}: {reason}")]
    QueryFailed {
        query: &'static str,
        block: BlockHash,
        reason: String,
    },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TT_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("TT_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, zero-sized caches, etc.).
    #[error("TT_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    /// Convenience constructor for chain query failures.
    pub fn query(query: &'static str, block: &BlockHash, reason: impl Into<String>) -> Self {
        Self::QueryFailed {
            query,
            block: block.clone(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
