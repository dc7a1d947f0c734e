//! Connect configuration.
//!
//! [`ConnectOptions`] controls deadlines, the address family hint and the
//! socket options applied after a successful connect. Every field has a
//! default that reproduces a plain blocking `getaddrinfo` + `connect` loop,
//! so partial JSON documents deserialize cleanly.

use crate::dns::AddressFamily;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectOptions {
    /// Upper bound for a single connect attempt. `None` waits for the OS.
    pub attempt_timeout: Option<Duration>,
    /// Upper bound for the whole call, resolution included.
    pub total_timeout: Option<Duration>,
    /// Restrict resolution to one address family.
    pub family: Option<AddressFamily>,
    /// Set `TCP_NODELAY` after connecting (default: true).
    pub nodelay: bool,
    /// Set `SO_KEEPALIVE` after connecting.
    pub keepalive: bool,
    /// Switch the connected socket to non-blocking mode.
    pub nonblocking: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            attempt_timeout: None,
            total_timeout: None,
            family: None,
            nodelay: true,
            keepalive: false,
            nonblocking: false,
        }
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = Some(timeout);
        self
    }

    pub fn family(mut self, family: AddressFamily) -> Self {
        self.family = Some(family);
        self
    }

    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    pub fn keepalive(mut self, keepalive: bool) -> Self {
        self.keepalive = keepalive;
        self
    }

    pub fn nonblocking(mut self, nonblocking: bool) -> Self {
        self.nonblocking = nonblocking;
        self
    }

    /// Absolute deadline for a call starting at `start`. A timeout too large
    /// to represent as an `Instant` means no limit.
    pub(crate) fn deadline_from(&self, start: Instant) -> Option<Instant> {
        self.total_timeout.and_then(|t| start.checked_add(t))
    }

    /// Timeout for the next attempt, given the time left before the deadline.
    pub(crate) fn attempt_budget(&self, remaining: Option<Duration>) -> Option<Duration> {
        match (self.attempt_timeout, remaining) {
            (Some(attempt), Some(left)) => Some(attempt.min(left)),
            (attempt, left) => attempt.or(left),
        }
    }
}
