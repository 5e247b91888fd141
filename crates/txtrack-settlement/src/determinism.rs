//! Determinism verification for the notification stream.
//!
//! The tracker is a pure reducer: two instances fed the same events and
//! the same chain answers must emit the exact same notifications in the
//! exact same order. The notification root is a SHA-256 digest over that
//! stream, so replicas (or a replay against a recorded run) can be compared
//! without shipping every notification.

use sha2::{Digest, Sha256};
use txtrack_types::{Notification, Outcome, constants};

/// Compute the root hash over an ordered notification stream.
///
/// Depends on, per notification: kind, transaction identity, block hash,
/// and outcome. Variable-length fields are length-prefixed.
#[must_use]
pub fn compute_notification_root(notifications: &[Notification]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(constants::NOTIFICATION_ROOT_DOMAIN);
    hasher.update((notifications.len() as u64).to_le_bytes());

    for notification in notifications {
        hasher.update([u8::from(notification.is_done())]);
        update_str(&mut hasher, notification.tx().as_str());
        let state = notification.state();
        update_str(&mut hasher, state.block_hash.as_str());
        hasher.update([match state.outcome {
            Outcome::Invalid => 0u8,
            Outcome::Valid { successful: true } => 1,
            Outcome::Valid { successful: false } => 2,
        }]);
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Verify that `notifications` hash to `expected_root`.
#[must_use]
pub fn verify_notification_root(notifications: &[Notification], expected_root: &[u8; 32]) -> bool {
    compute_notification_root(notifications) == *expected_root
}

/// Hex form of a root for logs and CLI output.
#[must_use]
pub fn root_hex(root: &[u8; 32]) -> String {
    hex::encode(root)
}

fn update_str(hasher: &mut Sha256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}
