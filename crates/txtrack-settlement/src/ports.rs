//! Ports: the chain the tracker queries and the observer it notifies.
//!
//! Both are called synchronously while an event is being handled. Chain
//! queries are assumed side-effect free and deterministic for a given
//! (block, tx) pair; a failing query is not fatal, the engines leave the
//! affected transactions pending and try again on the next `newBlock`.

use txtrack_types::{BlockHash, Notification, Result, Settled, TxId};

/// Queried chain API plus the advisory unpin hint.
pub trait ChainApi {
    /// Transaction identities included in `block_hash`.
    fn get_body(&self, block_hash: &BlockHash) -> Result<Vec<TxId>>;

    /// Whether `tx` passed the pre-dispatch validity check in `block_hash`.
    fn is_tx_valid(&self, block_hash: &BlockHash, tx: &TxId) -> Result<bool>;

    /// Execution result of a valid `tx` in `block_hash`.
    fn is_tx_successful(&self, block_hash: &BlockHash, tx: &TxId) -> Result<bool>;

    /// The listed blocks no longer need to be retrievable.
    fn unpin(&mut self, block_hashes: &[BlockHash]);
}

/// Receiver of lifecycle notifications.
pub trait TxObserver {
    /// `tx` settled; called at most once per transaction.
    fn on_tx_settled(&mut self, tx: &TxId, state: &Settled);

    /// `tx`'s settling block was finalized; called at most once per
    /// transaction, always after `on_tx_settled` with the same `state`.
    fn on_tx_done(&mut self, tx: &TxId, state: &Settled);
}

/// Observer that keeps every notification in emission order.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    notifications: Vec<Notification>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Take the recorded notifications, leaving the recorder empty.
    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Settled notifications only.
    #[must_use]
    pub fn settled(&self) -> Vec<(TxId, Settled)> {
        self.notifications
            .iter()
            .filter(|n| !n.is_done())
            .map(|n| (n.tx().clone(), n.state().clone()))
            .collect()
    }

    /// Done notifications only.
    #[must_use]
    pub fn done(&self) -> Vec<(TxId, Settled)> {
        self.notifications
            .iter()
            .filter(|n| n.is_done())
            .map(|n| (n.tx().clone(), n.state().clone()))
            .collect()
    }
}

impl TxObserver for Recorder {
    fn on_tx_settled(&mut self, tx: &TxId, state: &Settled) {
        self.notifications.push(Notification::TxSettled {
            tx: tx.clone(),
            state: state.clone(),
        });
    }

    fn on_tx_done(&mut self, tx: &TxId, state: &Settled) {
        self.notifications.push(Notification::TxDone {
            tx: tx.clone(),
            state: state.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_order_and_splits_kinds() {
        let mut recorder = Recorder::new();
        let state = Settled::valid(BlockHash::from("b1"), true);
        recorder.on_tx_settled(&TxId::from("a"), &state);
        recorder.on_tx_settled(&TxId::from("b"), &state);
        recorder.on_tx_done(&TxId::from("a"), &state);

        assert_eq!(recorder.notifications().len(), 3);
        assert_eq!(recorder.settled().len(), 2);
        assert_eq!(recorder.done(), vec![(TxId::from("a"), state)]);

        let drained = recorder.drain();
        assert_eq!(drained.len(), 3);
        assert!(recorder.notifications().is_empty());
    }
}
