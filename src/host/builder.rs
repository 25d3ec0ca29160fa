//! Builder pattern for host configuration.
//!
//! # Example
//!
//! ```ignore
//! use inspector_link::HostBuilder;
//!
//! let mut host = HostBuilder::new()
//!     .port(0)
//!     .project_dir("/work/app")
//!     .build()
//!     .await?;
//! let script = host.injection_script()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::transport::{HeartbeatConfig, HostTransport};

use super::context::ContextWriter;
use super::session::HostSession;

// ============================================================================
// HostBuilder
// ============================================================================

/// Builder for a [`HostSession`].
#[derive(Debug, Clone)]
pub struct HostBuilder {
    ip: IpAddr,
    port: u16,
    heartbeat: HeartbeatConfig,
    context: Option<ContextWriter>,
    client_options: ClientOptions,
}

impl Default for HostBuilder {
    fn default() -> Self {
        Self {
            ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            heartbeat: HeartbeatConfig::default(),
            context: None,
            client_options: ClientOptions::default(),
        }
    }
}

// ============================================================================
// HostBuilder Implementation
// ============================================================================

impl HostBuilder {
    /// Creates a builder bound to `127.0.0.1` on a random port.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    /// Sets the port. 0 lets the OS choose.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat.interval = interval;
        self
    }

    /// Sets the silence tolerated before a client is dropped.
    #[inline]
    #[must_use]
    pub fn heartbeat_timeout(mut self, timeout: Duration) -> Self {
        self.heartbeat.timeout = timeout;
        self
    }

    /// Writes the context file under `<dir>/.inspector/selection.md`.
    #[inline]
    #[must_use]
    pub fn project_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.context = Some(ContextWriter::for_project(dir.into()));
        self
    }

    /// Writes the context file at an explicit path.
    #[inline]
    #[must_use]
    pub fn context_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.context = Some(ContextWriter::with_path(path));
        self
    }

    /// Sets the options serialized into the client bootstrap.
    #[inline]
    #[must_use]
    pub fn client_options(mut self, options: ClientOptions) -> Self {
        self.client_options = options;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the heartbeat interval is zero, the
    /// timeout does not exceed the interval, or the client options are
    /// invalid.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat.interval.is_zero() {
            return Err(Error::config("heartbeat interval must be non-zero"));
        }
        if self.heartbeat.timeout <= self.heartbeat.interval {
            return Err(Error::config(format!(
                "heartbeat timeout ({}ms) must exceed the interval ({}ms)",
                self.heartbeat.timeout.as_millis(),
                self.heartbeat.interval.as_millis()
            )));
        }
        self.client_options.validate()
    }

    /// Validates, binds the transport and creates the session.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if validation fails
    /// - [`Error::Io`] if binding fails
    pub async fn build(self) -> Result<HostSession> {
        self.validate()?;

        let (transport, events) = HostTransport::bind(self.ip, self.port, self.heartbeat).await?;

        Ok(HostSession::new(
            transport,
            events,
            self.context,
            self.client_options,
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_defaults() {
        let builder = HostBuilder::new();
        assert_eq!(builder.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(builder.port, 0);
        assert!(builder.context.is_none());
        assert_ok!(builder.validate());
    }

    #[test]
    fn test_project_dir_sets_default_context_path() {
        let builder = HostBuilder::new().project_dir("/work/app");
        let context = builder.context.expect("context");
        assert_eq!(
            context.path(),
            PathBuf::from("/work/app/.inspector/selection.md")
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = assert_err!(
            HostBuilder::new()
                .heartbeat_interval(Duration::ZERO)
                .validate()
        );
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn test_timeout_must_exceed_interval() {
        let builder = HostBuilder::new()
            .heartbeat_interval(Duration::from_secs(10))
            .heartbeat_timeout(Duration::from_secs(10));
        assert_err!(builder.validate());
    }

    #[test]
    fn test_invalid_client_options_rejected() {
        let builder =
            HostBuilder::new().client_options(ClientOptions::new().with_staging_capacity(0));
        assert_err!(builder.validate());
    }

    #[tokio::test]
    async fn test_build_binds_random_port() {
        let mut host = HostBuilder::new().build().await.expect("build");
        assert_ne!(host.port(), 0);
        assert!(host.ws_url().starts_with("ws://127.0.0.1:"));
        host.shutdown();
    }
}
