//! Outage logging for calls to a peer service.

use std::fmt::Display;
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Logs a run of failed calls to one peer without flooding the log.
///
/// Failures up to `loud_limit` are logged as warnings, the next one
/// announces that the rest are silenced, and the first success after an
/// outage logs how long the peer was unreachable.
#[derive(Debug)]
pub struct FailureTracker {
    peer: String,
    loud_limit: u32,
    streak: u32,
    outage_started: Option<Instant>,
}

impl FailureTracker {
    pub fn new(peer: impl Into<String>, loud_limit: u32) -> Self {
        Self {
            peer: peer.into(),
            loud_limit,
            streak: 0,
            outage_started: None,
        }
    }

    pub fn failure(&mut self, error: &dyn Display) {
        self.streak += 1;
        self.outage_started.get_or_insert_with(Instant::now);

        if self.streak <= self.loud_limit {
            warn!(peer = %self.peer, attempt = self.streak, "Call failed: {}", error);
        } else if self.streak == self.loud_limit + 1 {
            warn!(
                peer = %self.peer,
                "{} unreachable, silencing further failures until it recovers",
                self.peer
            );
        }
    }

    pub fn success(&mut self) {
        if let Some(started) = self.outage_started.take() {
            info!(
                peer = %self.peer,
                failures = self.streak,
                down_secs = started.elapsed().as_secs(),
                "{} reachable again",
                self.peer
            );
        }
        self.streak = 0;
    }

    /// Consecutive failures since the last success.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn is_silenced(&self) -> bool {
        self.streak > self.loud_limit
    }

    /// Time since the current outage began.
    pub fn outage(&self) -> Option<Duration> {
        self.outage_started.map(|t| t.elapsed())
    }
}
