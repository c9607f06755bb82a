//! Client configuration.

use std::time::Duration;

/// Tuning knobs for an [`EipClient`](crate::EipClient) connection.
///
/// ```
/// use std::time::Duration;
/// use ethertag::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_connect_timeout(Duration::from_secs(3))
///     .with_io_timeout(Duration::from_secs(2));
/// assert_eq!(config.io_timeout, Duration::from_secs(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Deadline for establishing the TCP connection.
    pub connect_timeout: Duration,
    /// Deadline re-armed before every socket read and write.
    pub io_timeout: Duration,
    /// Timeout hint carried in the Send RR Data prefix, in seconds.
    pub rr_timeout_hint: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            io_timeout: Duration::from_secs(10),
            rr_timeout_hint: 10,
        }
    }
}

impl ClientConfig {
    /// Default configuration: 10 s connect and I/O deadlines.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the TCP connect deadline.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-read/per-write deadline.
    pub fn with_io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Sets the timeout hint placed in the Send RR Data prefix.
    pub fn with_rr_timeout_hint(mut self, seconds: u16) -> Self {
        self.rr_timeout_hint = seconds;
        self
    }
}
