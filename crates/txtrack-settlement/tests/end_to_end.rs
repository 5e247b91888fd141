//! End-to-end tests through the event reducer.
//!
//! Each test drives a [`Tracker`] with a scripted event stream against an
//! [`InMemoryChain`] and checks the exact notification sequence a
//! [`Recorder`] observed: settlement on `newBlock`, completion on
//! `finalized` (including skipped finalizations), fork pruning, query
//! idempotence, and recovery from failed queries.

use txtrack_settlement::{InMemoryChain, Recorder, Tracker, compute_notification_root};
use txtrack_types::*;

/// Helper: tracker + scripted chain + recording observer.
struct Harness {
    tracker: Tracker,
    chain: InMemoryChain,
    recorder: Recorder,
}

impl Harness {
    fn new(chain: InMemoryChain) -> Self {
        Self {
            tracker: Tracker::default(),
            chain,
            recorder: Recorder::new(),
        }
    }

    fn send(&mut self, event: IncomingEvent) {
        self.tracker.handle(&event, &mut self.chain, &mut self.recorder);
    }

    fn tx(&mut self, value: &str) {
        self.send(IncomingEvent::new_transaction(value));
    }

    fn block(&mut self, hash: &str, parent: &str) {
        self.send(IncomingEvent::new_block(hash, parent));
    }

    fn finalize(&mut self, hash: &str) {
        self.send(IncomingEvent::finalized(hash));
    }

    fn settled(&self) -> Vec<(TxId, Settled)> {
        self.recorder.settled()
    }

    fn done(&self) -> Vec<(TxId, Settled)> {
        self.recorder.done()
    }
}

fn h(s: &str) -> BlockHash {
    BlockHash::from(s)
}

fn tx(s: &str) -> TxId {
    TxId::from(s)
}

// =============================================================================
// Scenario: settle then finalize a single successful transaction
// =============================================================================
#[test]
fn e2e_single_transaction_lifecycle() {
    let mut hx = Harness::new(InMemoryChain::new().with_block("b1", ["tx1"]));

    hx.tx("tx1");
    hx.block("b1", "genesis");
    assert_eq!(hx.settled(), vec![(tx("tx1"), Settled::valid(h("b1"), true))]);
    assert!(hx.done().is_empty());

    hx.finalize("b1");
    assert_eq!(hx.done(), vec![(tx("tx1"), Settled::valid(h("b1"), true))]);
    assert_eq!(hx.recorder.notifications().len(), 2);
    assert!(hx.tracker.ledger().is_empty());
}

// =============================================================================
// Scenario: settled invalid on a fork, sibling finalized instead
// =============================================================================
#[test]
fn e2e_fork_loses_finalization() {
    let mut hx = Harness::new(
        InMemoryChain::new()
            .with_block("b1", ["tx2"])
            .with_invalid("b1", "tx2"),
    );

    hx.tx("tx2");
    hx.block("b1", "genesis");
    hx.block("b2", "genesis");
    hx.finalize("b2");

    assert_eq!(hx.settled(), vec![(tx("tx2"), Settled::invalid(h("b1")))]);
    assert!(hx.done().is_empty());
    assert_eq!(hx.chain.unpinned(), &[vec![h("b1")]]);
    assert!(!hx.tracker.graph().contains(&h("b1")));
    assert!(hx.tracker.graph().contains(&h("b2")));
}

// =============================================================================
// Scenario: finalization of b3 with no prior finalized events
// =============================================================================
#[test]
fn e2e_skipped_finalizations_reconstruct_chain() {
    let mut hx = Harness::new(
        InMemoryChain::new()
            .with_block("b1", ["t1"])
            .with_block("b2", ["t2"])
            .with_block("b3", ["t3"])
            .with_unsuccessful("b2", "t2"),
    );

    hx.tx("t1");
    hx.tx("t2");
    hx.tx("t3");
    hx.block("b1", "genesis");
    hx.block("b2", "b1");
    hx.block("b3", "b2");
    hx.finalize("b3");

    assert_eq!(
        hx.done(),
        vec![
            (tx("t1"), Settled::valid(h("b1"), true)),
            (tx("t2"), Settled::valid(h("b2"), false)),
            (tx("t3"), Settled::valid(h("b3"), true)),
        ]
    );
    assert_eq!(hx.tracker.cursor(), Some(&h("b3")));
}

// =============================================================================
// Ordering: done order is block order first, arrival order within a block
// =============================================================================
#[test]
fn e2e_done_order_across_chain_follows_blocks_then_arrival() {
    let mut hx = Harness::new(
        InMemoryChain::new()
            .with_block("b1", ["late", "early"])
            .with_block("b2", ["first"]),
    );

    // "first" arrives before everything but lands in the younger block.
    hx.tx("first");
    hx.tx("early");
    hx.tx("late");
    hx.block("b1", "genesis");
    hx.block("b2", "b1");
    hx.finalize("b2");

    let done: Vec<TxId> = hx.done().into_iter().map(|(t, _)| t).collect();
    assert_eq!(done, vec![tx("early"), tx("late"), tx("first")]);
}

#[test]
fn e2e_settled_order_is_arrival_not_body_order() {
    let mut hx = Harness::new(InMemoryChain::new().with_block("b1", ["c", "b", "a"]));
    hx.tx("a");
    hx.tx("b");
    hx.tx("c");
    hx.block("b1", "genesis");

    let settled: Vec<TxId> = hx.settled().into_iter().map(|(t, _)| t).collect();
    assert_eq!(settled, vec![tx("a"), tx("b"), tx("c")]);
}

// =============================================================================
// Idempotence: replayed events and re-delivered transactions
// =============================================================================
#[test]
fn e2e_replayed_new_block_emits_nothing() {
    let mut hx = Harness::new(InMemoryChain::new().with_block("b1", ["t1"]));
    hx.tx("t1");
    hx.block("b1", "genesis");
    let counts = hx.chain.query_counts();

    hx.block("b1", "genesis");
    hx.block("b1", "genesis");
    assert_eq!(hx.recorder.notifications().len(), 1);
    assert_eq!(hx.chain.query_counts(), counts);

    // Also after the block was finalized and released.
    hx.block("b2", "b1");
    hx.finalize("b2");
    hx.block("b1", "genesis");
    assert_eq!(hx.settled().len(), 1);
    assert_eq!(hx.done().len(), 1);
}

#[test]
fn e2e_redelivered_transaction_never_renotified() {
    let mut hx = Harness::new(
        InMemoryChain::new()
            .with_block("b1", ["t1"])
            .with_block("b2", ["t1"]),
    );
    hx.tx("t1");
    hx.tx("t1");
    hx.block("b1", "genesis");
    hx.finalize("b1");

    // The same value is delivered again and shows up in a later block.
    hx.tx("t1");
    hx.block("b2", "b1");
    hx.finalize("b2");

    assert_eq!(hx.settled().len(), 1);
    assert_eq!(hx.done().len(), 1);
}

#[test]
fn e2e_duplicate_finalized_is_noop() {
    let mut hx = Harness::new(InMemoryChain::new().with_block("b1", ["t1"]));
    hx.tx("t1");
    hx.block("b1", "genesis");
    hx.finalize("b1");
    hx.finalize("b1");

    assert_eq!(hx.done().len(), 1);
    assert_eq!(hx.chain.unpinned().len(), 1);
}

// =============================================================================
// Pending transactions wait for a later block, possibly on another fork
// =============================================================================
#[test]
fn e2e_pending_settles_in_later_block() {
    let mut hx = Harness::new(
        InMemoryChain::new()
            .with_block("a1", ["x"])
            .with_block("b2", ["y"]),
    );
    hx.tx("x");
    hx.tx("y");
    hx.block("a1", "genesis");
    hx.block("b1", "genesis");
    hx.block("b2", "b1");

    assert_eq!(
        hx.settled(),
        vec![
            (tx("x"), Settled::valid(h("a1"), true)),
            (tx("y"), Settled::valid(h("b2"), true)),
        ]
    );

    hx.finalize("b2");
    assert_eq!(hx.done(), vec![(tx("y"), Settled::valid(h("b2"), true))]);
    assert_eq!(hx.tracker.ledger().state(&tx("x")), None);
    assert!(hx.tracker.ledger().is_retired(&tx("x")));
}

// =============================================================================
// Query failures: a block is retried when it is announced again
// =============================================================================
#[test]
fn e2e_query_failure_retried_on_reannouncement() {
    let mut chain = InMemoryChain::new()
        .with_block("b1", ["t1"])
        .with_block("b2", Vec::<TxId>::new());
    chain.fail_body("b1");
    let mut hx = Harness::new(chain);

    hx.tx("t1");
    hx.block("b1", "genesis");
    assert!(hx.settled().is_empty());

    hx.chain.heal();
    hx.block("b2", "b1");
    assert!(hx.settled().is_empty());

    hx.block("b1", "genesis");
    assert_eq!(hx.settled(), vec![(tx("t1"), Settled::valid(h("b1"), true))]);

    hx.finalize("b2");
    assert_eq!(hx.done(), vec![(tx("t1"), Settled::valid(h("b1"), true))]);
}

#[test]
fn e2e_failed_block_does_not_settle_through_later_block() {
    let mut chain = InMemoryChain::new()
        .with_block("b1", ["y"])
        .with_block("b2", ["x"]);
    chain.fail_body("b1");
    let mut hx = Harness::new(chain);

    hx.tx("x");
    hx.tx("y");
    hx.block("b1", "genesis");
    hx.chain.heal();
    hx.block("b2", "b1");

    assert_eq!(hx.settled(), vec![(tx("x"), Settled::valid(h("b2"), true))]);
}

#[test]
fn e2e_verdict_failure_then_block_for_another_transaction() {
    let mut chain = InMemoryChain::new()
        .with_block("b1", ["y"])
        .with_block("b2", ["x"]);
    chain.fail_query("b1", "y");
    let mut hx = Harness::new(chain);

    hx.tx("x");
    hx.tx("y");
    hx.block("b1", "genesis");
    hx.chain.heal();
    hx.block("b2", "b1");
    assert_eq!(hx.settled(), vec![(tx("x"), Settled::valid(h("b2"), true))]);

    // Finalizing past the half-scanned block leaves y pending.
    hx.finalize("b2");
    assert_eq!(hx.done(), vec![(tx("x"), Settled::valid(h("b2"), true))]);
    assert_eq!(hx.tracker.ledger().state(&tx("y")), Some(TxState::Pending));
}

#[test]
fn e2e_retry_of_finalized_block_completes_immediately() {
    let mut chain = InMemoryChain::new().with_block("b1", ["a", "b"]);
    chain.fail_query("b1", "b");
    let mut hx = Harness::new(chain);

    hx.tx("a");
    hx.tx("b");
    hx.block("b1", "genesis");
    hx.finalize("b1");
    assert_eq!(hx.done(), vec![(tx("a"), Settled::valid(h("b1"), true))]);

    hx.chain.heal();
    hx.block("b1", "genesis");
    assert_eq!(hx.settled().len(), 2);
    assert_eq!(
        hx.done(),
        vec![
            (tx("a"), Settled::valid(h("b1"), true)),
            (tx("b"), Settled::valid(h("b1"), true)),
        ]
    );
    assert_eq!(hx.tracker.stats().done, 2);
}

// =============================================================================
// Announcements under a parent pruned by finalization are stale
// =============================================================================
#[test]
fn e2e_late_sibling_of_finalized_block_is_stale() {
    let mut hx = Harness::new(
        InMemoryChain::new()
            .with_block("s1", ["t"])
            .with_block("b2", ["t"]),
    );

    hx.block("b1", "genesis");
    hx.finalize("b1");
    hx.tx("t");
    hx.block("s1", "genesis");
    hx.block("b2", "b1");
    hx.finalize("b2");

    assert_eq!(hx.settled(), vec![(tx("t"), Settled::valid(h("b2"), true))]);
    assert_eq!(hx.done(), vec![(tx("t"), Settled::valid(h("b2"), true))]);
    assert_eq!(hx.tracker.stats().stale_blocks, 1);
    assert!(hx.tracker.ledger().is_empty());
}

// =============================================================================
// Pruning keeps only the finalized block and its descendants
// =============================================================================
#[test]
fn e2e_pruning_bounds_retained_state() {
    let mut hx = Harness::new(InMemoryChain::new());
    //           +-> s1
    // genesis --+-> c1 -> c2 -> c3 -> d4
    //                  +-> f2 -> f3
    for (block, parent) in [
        ("c1", "genesis"),
        ("s1", "genesis"),
        ("c2", "c1"),
        ("f2", "c1"),
        ("c3", "c2"),
        ("f3", "f2"),
        ("d4", "c3"),
    ] {
        hx.block(block, parent);
    }
    hx.finalize("c2");

    let graph = hx.tracker.graph();
    assert_eq!(graph.len(), 3);
    for kept in ["c2", "c3", "d4"] {
        assert!(graph.contains(&h(kept)), "{kept} should be retained");
    }
    assert_eq!(
        hx.chain.unpinned(),
        &[vec![h("c1"), h("s1"), h("f2"), h("f3")]]
    );

    hx.finalize("d4");
    assert_eq!(hx.tracker.graph().len(), 1);
    assert_eq!(hx.chain.unpinned()[1], vec![h("c2"), h("c3")]);
}

// =============================================================================
// Determinism: same events, same notification root
// =============================================================================
#[test]
fn e2e_replicas_agree_on_notification_root() {
    let events = vec![
        IncomingEvent::new_transaction("t1"),
        IncomingEvent::new_transaction("t2"),
        IncomingEvent::new_block("b1", "genesis"),
        IncomingEvent::new_block("f1", "genesis"),
        IncomingEvent::new_block("b2", "b1"),
        IncomingEvent::finalized("b2"),
    ];
    let chain = InMemoryChain::new()
        .with_block("b1", ["t1"])
        .with_block("f1", ["t2"])
        .with_block("b2", ["t2"]);

    let run = || {
        let mut tracker = Tracker::default();
        let mut api = chain.clone();
        let mut recorder = Recorder::new();
        tracker.replay(&events, &mut api, &mut recorder);
        recorder.drain()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(
        compute_notification_root(&first),
        compute_notification_root(&second)
    );
    // t2 settled first in f1, which lost: no completion for it.
    assert_eq!(first.iter().filter(|n| n.is_done()).count(), 1);
}
