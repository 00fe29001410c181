//! The socket handler: connection lifecycle plus the chunked write loop.
//!
//! `SocketHandler` owns at most one outbound connection at a time. Writes
//! connect lazily, push the payload in bounded chunks, and classify every
//! failure precisely; see [`SinkError`] for the taxonomy. With persistence
//! enabled the connection deliberately survives [`SocketHandler::close`] so a
//! later logical session can reuse it — it is still released when the handler
//! itself is dropped.

use std::time::Duration;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::{
    config::{self, SocketSinkConfig},
    error::SinkError,
    transport::{Connection, NetTransport, Transport},
};


/// Resilient socket sink for pre-formatted log records.
///
/// The API is `&self`; an internal lock serialises operations, so concurrent
/// writes from multiple threads queue up rather than interleave. Each write
/// blocks until the payload is fully sent, the I/O timeout fires, or the
/// connection is lost.
pub struct SocketHandler {
    target: String,
    transport: Box<dyn Transport>,
    inner: Mutex<Inner>,
}

struct Inner {
    persistent: bool,
    connect_timeout_secs: f64,
    io_timeout_secs: i64,
    connection: Option<Box<dyn Connection>>,
}

impl SocketHandler {
    /// Construct a handler for `target` over real sockets with default
    /// configuration.
    pub fn new(target: impl Into<String>) -> Self {
        Self::from_parts(SocketSinkConfig::new(target), Box::new(NetTransport))
    }

    /// Construct a handler over real sockets from a configuration object.
    pub fn with_config(config: SocketSinkConfig) -> Result<Self, SinkError> {
        config.validate()?;
        Ok(Self::from_parts(config, Box::new(NetTransport)))
    }

    /// Construct a handler over a custom transport binding.
    pub fn with_transport(
        config: SocketSinkConfig,
        transport: Box<dyn Transport>,
    ) -> Result<Self, SinkError> {
        config.validate()?;
        Ok(Self::from_parts(config, transport))
    }

    fn from_parts(config: SocketSinkConfig, transport: Box<dyn Transport>) -> Self {
        Self {
            target: config.target,
            transport,
            inner: Mutex::new(Inner {
                persistent: config.persistent,
                connect_timeout_secs: config.connect_timeout_secs,
                io_timeout_secs: config.io_timeout_secs,
                connection: None,
            }),
        }
    }

    /// The remote endpoint this handler writes to.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether the connection survives [`SocketHandler::close`].
    pub fn is_persistent(&self) -> bool {
        self.inner.lock().persistent
    }

    /// Toggle persistence. An already-open connection is neither closed nor
    /// re-established; the flag takes effect on the next `close` or connect.
    pub fn set_persistent(&self, persistent: bool) {
        self.inner.lock().persistent = persistent;
    }

    /// The configured connection timeout, in seconds.
    pub fn connection_timeout(&self) -> f64 {
        self.inner.lock().connect_timeout_secs
    }

    /// Set the connection timeout, in seconds. Only future connections
    /// observe the new value.
    pub fn set_connection_timeout(&self, seconds: f64) -> Result<(), SinkError> {
        let seconds = config::validate_connect_timeout(seconds)?;
        self.inner.lock().connect_timeout_secs = seconds;
        Ok(())
    }

    /// The configured I/O timeout, in whole seconds; zero means no timeout.
    pub fn io_timeout(&self) -> i64 {
        self.inner.lock().io_timeout_secs
    }

    /// Set the I/O timeout, in whole seconds. Only future connections
    /// observe the new value.
    pub fn set_io_timeout(&self, seconds: i64) -> Result<(), SinkError> {
        let seconds = config::validate_io_timeout(seconds)?;
        self.inner.lock().io_timeout_secs = seconds;
        Ok(())
    }

    /// Whether a connection is open and the peer has not closed its end.
    ///
    /// A true result is no guarantee the next write succeeds — a peer can
    /// become unreachable without the stream noticing. Such failures surface
    /// through [`SocketHandler::write`].
    pub fn is_connected(&self) -> bool {
        self.inner
            .lock()
            .connection
            .as_ref()
            .is_some_and(|conn| !conn.at_eof())
    }

    /// Send `payload` in full, connecting first if necessary.
    ///
    /// Success is all-or-nothing: either every byte was accepted by the
    /// transport or an error reports how far the send got. No failure is
    /// retried internally; the caller decides whether to drop the record,
    /// retry, or escalate.
    pub fn write(&self, payload: &[u8]) -> Result<(), SinkError> {
        let mut inner = self.inner.lock();
        self.ensure_connected(&mut inner)?;

        let total = payload.len();
        let mut sent = 0usize;
        while sent < total {
            let Some(conn) = inner.connection.as_mut() else {
                break;
            };
            if conn.at_eof() {
                break;
            }
            // Offer the unsent suffix each attempt; the transport takes what
            // it can.
            let chunk = conn
                .write_chunk(&payload[sent..])
                .map_err(|source| SinkError::WriteFailed { sent, source })?;
            sent += chunk;
            if conn.timed_out() {
                return Err(SinkError::WriteTimedOut { sent, total });
            }
        }

        if sent < total {
            // The stale handle stays stored; the next write reconnects
            // through ensure_connected.
            return Err(SinkError::ConnectionLost { sent, total });
        }
        trace!("socksink: wrote {total} bytes to {}", self.target);
        Ok(())
    }

    /// Release the connection unless persistence is enabled.
    ///
    /// Never fails and is idempotent. With persistence enabled this is a
    /// deliberate no-op so a later logical session can reuse the handle.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        if inner.persistent {
            return;
        }
        if inner.connection.take().is_some() {
            debug!("socksink: closed connection to {}", self.target);
        }
    }

    fn ensure_connected(&self, inner: &mut Inner) -> Result<(), SinkError> {
        if inner.connection.as_ref().is_some_and(|conn| !conn.at_eof()) {
            return Ok(());
        }
        self.connect(inner)
    }

    fn connect(&self, inner: &mut Inner) -> Result<(), SinkError> {
        if inner.connection.take().is_some() {
            debug!("socksink: discarding stale connection to {}", self.target);
        }
        let timeout = Duration::from_secs_f64(inner.connect_timeout_secs);
        let mut conn = self
            .transport
            .connect(&self.target, timeout, inner.persistent)
            .map_err(|source| SinkError::ConnectionFailed {
                target: self.target.clone(),
                source,
            })?;
        if let Err(source) = conn.set_io_timeout(config::io_timeout_duration(inner.io_timeout_secs))
        {
            // Drop the half-configured connection rather than store it; the
            // next write starts from a clean reconnect.
            return Err(SinkError::TimeoutConfigurationFailed {
                target: self.target.clone(),
                source,
            });
        }
        debug!("socksink: connected to {}", self.target);
        inner.connection = Some(conn);
        Ok(())
    }
}

impl std::fmt::Debug for SocketHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SocketHandler")
            .field("target", &self.target)
            .field("persistent", &inner.persistent)
            .field("connect_timeout_secs", &inner.connect_timeout_secs)
            .field("io_timeout_secs", &inner.io_timeout_secs)
            .field("connected", &inner.connection.is_some())
            .finish()
    }
}
