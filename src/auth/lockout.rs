use serde_json::json;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::auth::events::{EventLevel, SecurityEventLog};
use crate::config::LockoutConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy)]
struct AttemptState {
    failure_count: u32,
    blocked_until: Option<Instant>,
}

/// Per-client-address failure counter with temporary lockout.
///
/// State lives in process memory: counters are lost on restart and are not
/// shared between replicas. A multi-instance deployment needs an external
/// keyed counter store in place of this map.
///
/// Lifecycle per address: Clean -> Counting -> Locked -> Clean (on expiry).
pub struct BruteForceGuard {
    entries: Mutex<HashMap<IpAddr, AttemptState>>,
    threshold: u32,
    lockout: Duration,
    sweep_interval: Duration,
    events: Arc<SecurityEventLog>,
}

impl BruteForceGuard {
    pub fn new(config: &LockoutConfig, events: Arc<SecurityEventLog>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            threshold: config.failure_threshold,
            lockout: Duration::from_secs(config.lockout_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
            events,
        }
    }

    /// Reject requests from a currently locked-out address, before any other
    /// processing. An expired lockout clears the entry so the request is
    /// evaluated normally.
    pub fn check(&self, addr: IpAddr) -> Result<(), AuthError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();

        if let Some(state) = entries.get(&addr) {
            if let Some(blocked_until) = state.blocked_until {
                if blocked_until > now {
                    let remaining = blocked_until - now;
                    return Err(AuthError::Locked {
                        retry_after_secs: remaining.as_secs().max(1),
                    });
                }
                entries.remove(&addr);
            }
        }

        Ok(())
    }

    /// Count one authentication failure from `addr`, engaging the lockout
    /// when the threshold is reached.
    pub fn record_failure(&self, addr: IpAddr) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let state = entries.entry(addr).or_insert(AttemptState {
            failure_count: 0,
            blocked_until: None,
        });

        state.failure_count += 1;
        if state.failure_count >= self.threshold && state.blocked_until.is_none() {
            state.blocked_until = Some(Instant::now() + self.lockout);
            self.events.record(
                EventLevel::Warn,
                "client address locked out after repeated auth failures",
                json!({
                    "client_addr": addr.to_string(),
                    "failure_count": state.failure_count,
                    "lockout_secs": self.lockout.as_secs(),
                }),
            );
        }
    }

    /// A successful authentication from `addr` resets its counter.
    pub fn record_success(&self, addr: IpAddr) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&addr);
    }

    /// Drop entries whose lockout has expired, bounding memory.
    pub fn sweep(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        entries.retain(|_, state| match state.blocked_until {
            Some(blocked_until) => blocked_until > now,
            None => true,
        });
    }

    /// Run `sweep` on an interval for the life of the process.
    pub fn spawn_sweeper(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let interval = self.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}
