//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::error::{Error, Result};

/// Largest command accepted from one connection, in bytes.
pub const MAX_REQUEST_BYTES: usize = 255;

/// Largest response written to one connection, in bytes.
pub const MAX_RESPONSE_BYTES: usize = 1024;

/// Configuration for a [`crate::PolicyServer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_addr: SocketAddr,
    /// Read buffer size; one read of up to this many bytes is the command
    pub max_request_bytes: usize,
    /// Responses longer than this are truncated
    pub max_response_bytes: usize,
    /// Optional bound on each connection's read and write.
    ///
    /// `None` means a silent client holds its task until it disconnects.
    pub io_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Create a config listening on all interfaces at `port`.
    pub fn new(port: u16) -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            ..Self::default()
        }
    }

    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, max: usize) -> Self {
        self.max_response_bytes = max;
        self
    }

    /// Check the config for values the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_request_bytes == 0 {
            return Err(Error::Config("max_request_bytes must be positive".into()));
        }
        if self.max_response_bytes == 0 {
            return Err(Error::Config("max_response_bytes must be positive".into()));
        }
        if self.io_timeout == Some(Duration::ZERO) {
            return Err(Error::Config("io_timeout must be positive".into()));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            max_request_bytes: MAX_REQUEST_BYTES,
            max_response_bytes: MAX_RESPONSE_BYTES,
            io_timeout: None,
        }
    }
}
