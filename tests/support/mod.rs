// ABOUTME: Test support utilities.
// ABOUTME: Provides an in-memory LXD server and tracing setup for integration tests.

use std::sync::Once;
use std::time::Duration;

use lxdc::container::ContainerSettings;
use lxdc::operation::PollConfig;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod fake_lxd;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("lxdc=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Settings with millisecond polling so tests finish quickly.
#[allow(dead_code)]
pub fn fast_settings() -> ContainerSettings {
    ContainerSettings {
        operations: PollConfig {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            multiplier: 2.0,
            timeout: Duration::from_secs(2),
        },
        state_timeout: Duration::from_secs(30),
        delete_timeout: Duration::from_millis(200),
        lookup_concurrency: 1,
    }
}
