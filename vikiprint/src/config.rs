//! Driver configuration

use std::time::Duration;

use vikiprint_core::constants::{DEFAULT_BURST_IDLE_MS, DEFAULT_RESPONSE_TIMEOUT_MS};

/// Device configuration
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vikiprint::DeviceConfig;
///
/// let config = DeviceConfig::default()
///     .with_cashier("Ivanova")
///     .with_response_timeout(Duration::from_secs(10));
///
/// assert_eq!(config.cashier, "Ivanova");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// How long a request waits for its reply; re-armed by unrelated frames
    pub response_timeout: Duration,

    /// Quiet period that ends a burst of incoming bytes
    pub burst_idle_gap: Duration,

    /// Operator name printed on shift and document commands
    pub cashier: String,

    /// Buffered events per subscriber before the oldest are dropped
    pub event_capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            burst_idle_gap: Duration::from_millis(DEFAULT_BURST_IDLE_MS),
            cashier: String::new(),
            event_capacity: 64,
        }
    }
}

impl DeviceConfig {
    /// Set response timeout
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Set the quiet period that ends a burst
    pub fn with_burst_idle_gap(mut self, gap: Duration) -> Self {
        self.burst_idle_gap = gap;
        self
    }

    /// Set cashier name
    pub fn with_cashier(mut self, cashier: impl Into<String>) -> Self {
        self.cashier = cashier.into();
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}
