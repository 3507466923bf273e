//! Runtime configuration for storage and ordering operations.
//!
//! # Responsibility
//! - Carry tunables shared by connection bootstrap and board services.
//! - Provide stable defaults so callers can start with `Default::default()`.
//!
//! # Invariants
//! - `max_attempts` is at least 1 after normalization.

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 10;
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Tunables for transactional ordering operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderingConfig {
    /// Upper bound on attempts for one operation when the store reports a
    /// lock conflict (`SQLITE_BUSY` / `SQLITE_LOCKED`).
    pub max_attempts: u32,
    /// Linear backoff step between attempts.
    pub retry_backoff_ms: u64,
    /// SQLite busy timeout applied on connection open.
    pub busy_timeout_ms: u64,
    /// Re-read every touched scope after a mutation and abort the
    /// transaction if positions are not exactly `0..n`.
    pub verify_after_write: bool,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            verify_after_write: true,
        }
    }
}

impl OrderingConfig {
    /// Returns attempt budget clamped to at least one try.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}
