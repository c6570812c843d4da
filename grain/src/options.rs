//! Call and cluster configuration.

use std::time::Duration;

/// Default time a call waits for its response.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Default idle time before a generated grain deactivates itself.
pub const DEFAULT_DEACTIVATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-call settings for grain clients.
///
/// ## Examples
///
/// ```
/// use std::time::Duration;
/// use grain::CallOptions;
///
/// let options = CallOptions::default().with_timeout(Duration::from_millis(200)).with_retries(3);
/// assert_eq!(options.timeout, Duration::from_millis(200));
/// assert_eq!(options.retries, 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// How long to wait for the response.
    pub timeout: Duration,
    /// How many times to re-activate and resend when the target activation
    /// terminated before taking the request.
    pub retries: u32,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CALL_TIMEOUT,
            retries: 1,
        }
    }
}

impl CallOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }
}

/// Cluster-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Name used in log output.
    pub name: String,
    /// Options applied by clients that do not set their own.
    pub call_options: CallOptions,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            name: "grain".to_string(),
            call_options: CallOptions::default(),
        }
    }
}

impl ClusterConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_call_options(mut self, call_options: CallOptions) -> Self {
        self.call_options = call_options;
        self
    }
}
