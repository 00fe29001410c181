//! Builder for [`SocketHandler`](crate::SocketHandler).
//!
//! Exposes target selection, timeout tuning, and persistence. Values are
//! validated once at [`SocketHandlerBuilder::build`]; out-of-range timeouts
//! surface as [`SinkError::InvalidArgument`].

use crate::{
    config::SocketSinkConfig, error::SinkError, handler::SocketHandler, transport::Transport,
};

/// Chainable configuration for constructing a [`SocketHandler`].
#[derive(Clone, Debug)]
pub struct SocketHandlerBuilder {
    config: SocketSinkConfig,
}

impl SocketHandlerBuilder {
    /// Start a builder targeting `target` with default configuration.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            config: SocketSinkConfig::new(target),
        }
    }

    /// Keep the connection across `close()` calls.
    pub fn with_persistent(mut self, persistent: bool) -> Self {
        self.config.persistent = persistent;
        self
    }

    /// Override the connection timeout, in seconds.
    pub fn with_connection_timeout(mut self, seconds: f64) -> Self {
        self.config.connect_timeout_secs = seconds;
        self
    }

    /// Override the I/O timeout, in whole seconds; zero disables it.
    pub fn with_io_timeout(mut self, seconds: i64) -> Self {
        self.config.io_timeout_secs = seconds;
        self
    }

    /// Build a handler bound to real sockets.
    pub fn build(self) -> Result<SocketHandler, SinkError> {
        SocketHandler::with_config(self.config)
    }

    /// Build a handler bound to a custom transport.
    pub fn build_with_transport(
        self,
        transport: Box<dyn Transport>,
    ) -> Result<SocketHandler, SinkError> {
        SocketHandler::with_transport(self.config, transport)
    }
}
