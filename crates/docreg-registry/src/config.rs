use std::time::Duration;

/// Per-step deadlines for registry calls.
///
/// Both stores may block for seconds. A step that misses its deadline fails
/// with a transport error; the other store is never rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadConfig {
    /// Limit for each object-store call.
    pub store_timeout: Duration,
    /// Limit for each ledger call.
    pub ledger_timeout: Duration,
}

impl UploadConfig {
    pub fn from_millis(store_ms: u64, ledger_ms: u64) -> Self {
        Self {
            store_timeout: Duration::from_millis(store_ms),
            ledger_timeout: Duration::from_millis(ledger_ms),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            store_timeout: Duration::from_secs(10),
            ledger_timeout: Duration::from_secs(10),
        }
    }
}
