//! Wall-clock abstraction for time-dependent store commands.
//!
//! # Responsibility
//! - Provide the single source of "now" used by the mutation engine.
//! - Keep time injectable so store behavior stays deterministic in tests.
//!
//! # Invariants
//! - All instants are Unix epoch milliseconds.

use chrono::Utc;

/// Source of the current instant in epoch milliseconds.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
