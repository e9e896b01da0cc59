//! Connection and worker tuning for a [`Client`](super::Client).
use std::time::Duration;

use crate::protocol::{BodyFraming, TcpConnector};

use super::ClientError;

/// How long the pusher waits on an empty outgoing queue before re-checking
/// the shutdown flag.
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(100);
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub idle_wait: Duration,
    /// First delay after a failed connection or poll; doubled on every
    /// consecutive failure up to `max_retry_delay`.
    pub retry_delay: Duration,
    pub max_retry_delay: Duration,
    /// Applied to connect, read and write. `None` blocks indefinitely.
    pub io_timeout: Option<Duration>,
    pub framing: BodyFraming,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            idle_wait: DEFAULT_IDLE_WAIT,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
            io_timeout: None,
            framing: BodyFraming::default(),
        }
    }

    /// Build a config from a textual port, as given on a command line.
    pub fn parse(host: &str, port: &str) -> Result<Self, ClientError> {
        let port = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ClientError::InvalidPort(port.to_string()))?;
        Ok(Self::new(host, port))
    }

    pub fn idle_wait(mut self, idle_wait: Duration) -> Self {
        self.idle_wait = idle_wait;
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration, max_retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self.max_retry_delay = max_retry_delay.max(retry_delay);
        self
    }

    pub fn io_timeout(mut self, io_timeout: Option<Duration>) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn framing(mut self, framing: BodyFraming) -> Self {
        self.framing = framing;
        self
    }

    pub fn connector(&self) -> TcpConnector {
        TcpConnector::new(self.host.clone(), self.port).with_timeout(self.io_timeout)
    }
}
