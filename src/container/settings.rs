// ABOUTME: Timing parameters applied to container lifecycle calls.
// ABOUTME: Poll backoff, transition timeout, deletion deadline and lookup fan-out.

use std::time::Duration;

use crate::operation::PollConfig;

/// Knobs every lifecycle operation reads instead of hardcoded delays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSettings {
    /// Backoff and deadline for operations and for containers to settle.
    pub operations: PollConfig,
    /// Timeout sent with state change requests.
    pub state_timeout: Duration,
    /// How long `delete()` waits for the container to disappear.
    pub delete_timeout: Duration,
    /// Lookups in flight at once during `get_all()`.
    pub lookup_concurrency: usize,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        ContainerSettings {
            operations: PollConfig::default(),
            state_timeout: Duration::from_secs(30),
            delete_timeout: Duration::from_secs(30),
            lookup_concurrency: 1,
        }
    }
}
