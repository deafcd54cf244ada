//! ─── Protocol constants ──────────────────────────────────────────────────────
//!
//! Values that are not themselves protocol parameters (those live in
//! `Protocol`, loaded from the genesis-params file) but are fixed points of
//! the wire protocol and engineering budget.

/// `prev_hash` of the genesis block: 64 ASCII `'0'` characters.
pub fn genesis_prev_hash() -> String {
    "0".repeat(64)
}

/// Synthetic sender address for system `reward` transactions.
pub const PROTOCOL_REWARD_SENDER: &str = "_protocol";

/// Pseudo-account prefix for `add_liquidity` pool balances: `"pool:<id>"`.
pub const POOL_ACCOUNT_PREFIX: &str = "pool:";

// ── P2P wire limits ───────────────────────────────────────────────────────────

/// Maximum JSON payload size accepted on any P2P connection (§4.8).
pub const MAX_P2P_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum blocks returned per `blocks` sync page.
pub const SYNC_PAGE_SIZE: usize = 200;

/// Equivocation registry entries older than this many slots behind the tip
/// are pruned.
pub const EQUIVOCATION_PRUNE_DEPTH: u64 = 1_000;

/// Mempool gossip dedup memory is cleared once it grows past this size.
pub const MEMPOOL_DEDUP_CAP: usize = 10_000;

/// Heartbeat `ping` interval (seconds).
pub const HEARTBEAT_INTERVAL_SECS: u64 = 10;

/// Maximum time allowed to drain a write to a peer before it is dropped.
pub const PEER_WRITE_DRAIN_TIMEOUT_SECS: u64 = 3;

/// Cooperative yield cadence: validation loops yield every N transactions.
pub const VALIDATION_YIELD_EVERY: usize = 10;

// ── Consensus timing ──────────────────────────────────────────────────────────

/// How long past `slot_start` a slot may still be produced before being
/// skipped outright.
pub const SLOT_TOLERANCE_SECS: i64 = 5;

/// How long a non-leader waits before re-checking whether the leader has
/// produced a block for the current slot.
pub const BLOCK_PROPAGATION_WAIT_SECS: u64 = 2;
