//! Global pause for all workers after the remote service throttles us.
//!
//! [`RateLimitGate`] is an open/closed signal shared by every worker. A worker
//! that sees a 429 calls [`RateLimitGate::cool_down`]: the first caller closes
//! the gate, sleeps for the cooldown, and reopens it; callers that arrive while
//! a cooldown is running join it instead of starting another one.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use album_downloader::download::RateLimitGate;
//!
//! # async fn example() {
//! let gate = Arc::new(RateLimitGate::new(Duration::from_millis(50), Duration::from_millis(10)));
//!
//! // Workers wait here before every request.
//! gate.wait_open().await;
//!
//! // On a 429, every worker pauses until the cooldown has elapsed.
//! gate.cool_down().await;
//! assert!(gate.is_open());
//! # }
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tracing::{info, warn};

/// How a caller took part in a cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownRole {
    /// This caller closed the gate, slept, and reopened it.
    Led,
    /// Another caller was already cooling down; this one waited for it.
    Joined,
}

/// Open/closed signal that pauses every worker during a rate-limit cooldown.
///
/// Designed to be wrapped in `Arc` and shared across spawned Tokio tasks.
#[derive(Debug)]
pub struct RateLimitGate {
    open: watch::Sender<bool>,
    cooling: Mutex<()>,
    cooldowns: AtomicUsize,
    cooldown: Duration,
    tick: Duration,
}

impl RateLimitGate {
    /// Creates an open gate.
    ///
    /// `tick` is the interval between countdown log lines while cooling down.
    #[must_use]
    pub fn new(cooldown: Duration, tick: Duration) -> Self {
        let (open, _) = watch::channel(true);
        Self {
            open,
            cooling: Mutex::new(()),
            cooldowns: AtomicUsize::new(0),
            cooldown,
            tick,
        }
    }

    /// Configured cooldown duration.
    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Number of cooldowns that ran to completion.
    #[must_use]
    pub fn cooldowns_completed(&self) -> usize {
        self.cooldowns.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Returns once the gate is open. Returns immediately when it already is.
    pub async fn wait_open(&self) {
        let mut rx = self.open.subscribe();
        // The sender lives as long as `self`, so this only errors if it was dropped.
        let _ = rx.wait_for(|open| *open).await;
    }

    /// Pauses all workers for the cooldown duration.
    ///
    /// Only one cooldown runs at a time. A caller arriving during a cooldown
    /// waits for it to finish and does not extend it.
    pub async fn cool_down(&self) -> CooldownRole {
        let Ok(_guard) = self.cooling.try_lock() else {
            info!("rate limit cooldown already running, waiting for it");
            drop(self.cooling.lock().await);
            self.wait_open().await;
            return CooldownRole::Joined;
        };

        self.open.send_replace(false);
        warn!(
            minutes = minutes_ceil(self.cooldown),
            "rate limited by remote service, pausing all downloads"
        );

        let mut remaining = self.cooldown;
        while !remaining.is_zero() {
            info!(
                remaining_minutes = minutes_ceil(remaining),
                "rate limit cooldown in progress"
            );
            let step = if self.tick.is_zero() {
                remaining
            } else {
                remaining.min(self.tick)
            };
            tokio::time::sleep(step).await;
            remaining = remaining.saturating_sub(step);
        }

        self.cooldowns.fetch_add(1, Ordering::SeqCst);
        self.open.send_replace(true);
        info!("cooldown finished, resuming downloads");
        CooldownRole::Led
    }
}

fn minutes_ceil(duration: Duration) -> u64 {
    duration.as_secs().div_ceil(60)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn test_new_gate_is_open() {
        let gate = RateLimitGate::new(Duration::from_secs(60), Duration::from_secs(1));
        assert!(gate.is_open());
        tokio::time::timeout(Duration::from_millis(100), gate.wait_open())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cool_down_closes_then_reopens() {
        let gate = Arc::new(RateLimitGate::new(
            Duration::from_millis(150),
            Duration::from_millis(50),
        ));

        let leader = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.cool_down().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!gate.is_open());

        let started = Instant::now();
        gate.wait_open().await;
        assert!(started.elapsed() >= Duration::from_millis(80));
        assert!(gate.is_open());
        assert_eq!(leader.await.unwrap(), CooldownRole::Led);
    }

    #[tokio::test]
    async fn test_concurrent_cool_downs_do_not_compound() {
        let gate = Arc::new(RateLimitGate::new(
            Duration::from_millis(200),
            Duration::from_millis(200),
        ));

        let started = Instant::now();
        let first = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.cool_down().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.cool_down().await })
        };

        let roles = [first.await.unwrap(), second.await.unwrap()];
        assert!(roles.contains(&CooldownRole::Led));
        assert!(roles.contains(&CooldownRole::Joined));
        assert!(started.elapsed() < Duration::from_millis(380));
        assert!(gate.is_open());
        assert_eq!(gate.cooldowns_completed(), 1);
    }

    #[test]
    fn test_minutes_ceil() {
        assert_eq!(minutes_ceil(Duration::from_secs(3600)), 60);
        assert_eq!(minutes_ceil(Duration::from_secs(61)), 2);
        assert_eq!(minutes_ceil(Duration::ZERO), 0);
    }
}
