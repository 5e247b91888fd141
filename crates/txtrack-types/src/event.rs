//! Inbound chain events and outbound lifecycle notifications.

use serde::{Deserialize, Serialize};

use crate::{BlockHash, Settled, TxId};

/// An event from the chain-notification source.
///
/// The source delivers events in a causally consistent order, but
/// `Finalized` is only emitted for a subset of finalized blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IncomingEvent {
    /// A block was imported on some fork.
    #[serde(rename_all = "camelCase")]
    NewBlock {
        block_hash: BlockHash,
        parent: BlockHash,
    },
    /// A transaction was submitted and should be tracked.
    NewTransaction { value: TxId },
    /// A block (and transitively its ancestors) became irreversible.
    #[serde(rename_all = "camelCase")]
    Finalized { block_hash: BlockHash },
}

impl IncomingEvent {
    #[must_use]
    pub fn new_block(block_hash: impl Into<BlockHash>, parent: impl Into<BlockHash>) -> Self {
        Self::NewBlock {
            block_hash: block_hash.into(),
            parent: parent.into(),
        }
    }

    #[must_use]
    pub fn new_transaction(value: impl Into<TxId>) -> Self {
        Self::NewTransaction {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn finalized(block_hash: impl Into<BlockHash>) -> Self {
        Self::Finalized {
            block_hash: block_hash.into(),
        }
    }

    /// Short event name for log lines.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NewBlock { .. } => "newBlock",
            Self::NewTransaction { .. } => "newTransaction",
            Self::Finalized { .. } => "finalized",
        }
    }
}

/// One outbound lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notification {
    /// `onTxSettled(tx, state)`
    TxSettled { tx: TxId, state: Settled },
    /// `onTxDone(tx, state)`
    TxDone { tx: TxId, state: Settled },
}

impl Notification {
    #[must_use]
    pub fn tx(&self) -> &TxId {
        match self {
            Self::TxSettled { tx, .. } | Self::TxDone { tx, .. } => tx,
        }
    }

    #[must_use]
    pub fn state(&self) -> &Settled {
        match self {
            Self::TxSettled { state, .. } | Self::TxDone { state, .. } => state,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, Self::TxDone { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_block_wire_shape() {
        let event: IncomingEvent =
            serde_json::from_str(r#"{"type":"newBlock","blockHash":"b2","parent":"b1"}"#).unwrap();
        assert_eq!(event, IncomingEvent::new_block("b2", "b1"));
        assert_eq!(event.kind(), "newBlock");
    }

    #[test]
    fn new_transaction_wire_shape() {
        let event: IncomingEvent =
            serde_json::from_str(r#"{"type":"newTransaction","value":"tx1"}"#).unwrap();
        assert_eq!(event, IncomingEvent::new_transaction("tx1"));
    }

    #[test]
    fn finalized_wire_shape() {
        let json = serde_json::to_value(IncomingEvent::finalized("b3")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "finalized", "blockHash": "b3"}));
    }

    #[test]
    fn unknown_event_type_rejected() {
        let err = serde_json::from_str::<IncomingEvent>(r#"{"type":"reorg","blockHash":"b1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn notification_accessors() {
        let n = Notification::TxDone {
            tx: TxId::from("tx1"),
            state: Settled::invalid(BlockHash::from("b1")),
        };
        assert!(n.is_done());
        assert_eq!(n.tx().as_str(), "tx1");
        assert_eq!(n.state().block_hash.as_str(), "b1");
    }
}
