//! Constants for the download module (timeouts, cooldown, pool size).

use std::time::Duration;

/// Default number of concurrent download workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Largest accepted worker count.
pub const MAX_WORKERS: usize = 32;

/// Default per-request timeout for asset downloads (30 seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default pause after the remote service answers 429 (60 minutes).
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60 * 60);

/// Interval between cooldown countdown log lines (one minute).
pub const COOLDOWN_TICK: Duration = Duration::from_secs(60);

/// Status code signalling throttling.
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;
