/// Ring bit width (m). `HashId` is SHA-256, so this is fixed at 256.
pub const RING_BITS: u32 = 256;

/// Finger table size; one entry per bit of the ring.
pub const FINGER_TABLE_SIZE: usize = RING_BITS as usize;

/// Successor list capacity, `R = m/2`.
pub const SUCCESSOR_LIST_CAP: usize = RING_BITS as usize / 2;

pub const DEFAULT_PORT: u16 = 5000;
pub const LOCALHOST: &str = "127.0.0.1";

// Stabilizer periods.
pub const ALIVE_INTERVAL_MS: u64 = 1000;
pub const SUCCESSOR_INTERVAL_MS: u64 = 1000;
pub const FINGER_INTERVAL_MS: u64 = 100;

// Per-call deadline.
pub const RPC_TIMEOUT_MS: u64 = 1000;

/// Upper bound on distinct channels a connection pool keeps open.
pub const CONN_POOL_CAP: usize = 256;
