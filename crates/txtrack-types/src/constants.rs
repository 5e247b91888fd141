//! System-wide constants for the txtrack lifecycle tracker.

/// Upper bound on the number of blocks walked back from a newly finalized
/// block while looking for the finalization cursor.
pub const DEFAULT_MAX_CHAIN_WALK: usize = 65_536;

/// Number of released block hashes remembered, so late announcements of
/// pruned or already-finalized blocks are recognised as stale.
pub const DEFAULT_RELEASED_CACHE_SIZE: usize = 16_384;

/// Number of completed or orphaned transaction identities remembered, so a
/// re-delivered `newTransaction` cannot restart their lifecycle.
pub const DEFAULT_RETIRED_CACHE_SIZE: usize = 65_536;

/// Domain separator for the notification root digest.
pub const NOTIFICATION_ROOT_DOMAIN: &[u8] = b"txtrack:notification_root:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "txtrack";
