//! # Settlement outcomes and the transaction lifecycle
//!
//! ## State Machine
//!
//! ```text
//!   ┌─────────┐  newBlock   ┌─────────┐  finalized   ┌──────┐
//!   │ PENDING ├────────────▶│ SETTLED ├─────────────▶│ DONE │
//!   └─────────┘             └─────────┘              └──────┘
//! ```
//!
//! Each arrow fires at most once per transaction and emits exactly one
//! notification carrying the same [`Settled`] payload.

use serde::{Deserialize, Serialize};

use crate::BlockHash;

/// What happened to a transaction inside the block it settled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Outcome {
    /// Failed the pre-dispatch validity check. There is no execution result.
    Invalid,
    /// Passed validity; `successful` is the execution result.
    Valid { successful: bool },
}

impl Outcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid => write!(f, "INVALID"),
            Self::Valid { successful: true } => write!(f, "VALID_SUCCESSFUL"),
            Self::Valid { successful: false } => write!(f, "VALID_FAILED"),
        }
    }
}

/// Payload delivered with both `onTxSettled` and `onTxDone`.
///
/// Wire shape: `{"blockHash": "...", "type": "invalid"}` or
/// `{"blockHash": "...", "type": "valid", "successful": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settled {
    /// The block the transaction settled in.
    pub block_hash: BlockHash,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Settled {
    #[must_use]
    pub fn new(block_hash: BlockHash, outcome: Outcome) -> Self {
        Self {
            block_hash,
            outcome,
        }
    }

    #[must_use]
    pub fn invalid(block_hash: BlockHash) -> Self {
        Self::new(block_hash, Outcome::Invalid)
    }

    #[must_use]
    pub fn valid(block_hash: BlockHash, successful: bool) -> Self {
        Self::new(block_hash, Outcome::Valid { successful })
    }
}

/// Lifecycle state of a tracked transaction.
///
/// Transitions are **monotonic** (never go backwards):
/// - `Pending → Settled` (seen in a scanned block body)
/// - `Settled → Done` (the settling block was finalized)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TxState {
    /// Observed, not yet found in any scanned block.
    Pending,
    /// Included in a block whose outcome is known.
    Settled,
    /// The settling block is irreversible. Terminal.
    Done,
}

impl TxState {
    /// Can a transaction in this state move to `target`?
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Settled) | (Self::Settled, Self::Done)
        )
    }
}

impl std::fmt::Display for TxState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Settled => write!(f, "SETTLED"),
            Self::Done => write!(f, "DONE"),
        }
    }
}
