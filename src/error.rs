//! Error taxonomy raised by the socket sink.
//!
//! Every failure is terminal for the call that raised it; the sink performs
//! no internal retry and never writes to a fallback destination. Callers
//! decide whether to drop the record, retry at a higher level, or escalate.

use std::io;

use thiserror::Error;

/// Errors surfaced by [`SocketHandler`](crate::SocketHandler) operations.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A configuration setter was handed an out-of-range value. Rejected
    /// before any connection state is touched; the prior value is kept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The transport could not establish a stream to the target.
    #[error("failed to connect to {target}: {source}")]
    ConnectionFailed {
        /// Address the connect was attempted against, verbatim.
        target: String,
        #[source]
        source: io::Error,
    },

    /// The stream was established but applying the I/O timeout to it failed.
    ///
    /// Distinct from [`SinkError::ConnectionFailed`]: the connection existed
    /// but was misconfigured. The handler drops the half-configured handle,
    /// so a later write starts from a clean reconnect.
    #[error("connected to {target} but applying the I/O timeout failed: {source}")]
    TimeoutConfigurationFailed {
        target: String,
        #[source]
        source: io::Error,
    },

    /// A single write attempt signalled a hard failure (not a short write).
    #[error("write failed after {sent} bytes: {source}")]
    WriteFailed {
        /// Bytes accepted by the transport before the failing attempt.
        sent: usize,
        #[source]
        source: io::Error,
    },

    /// The configured I/O timeout elapsed mid-write. The send is abandoned,
    /// not retried.
    #[error("write timed out after sending {sent} of {total} bytes")]
    WriteTimedOut { sent: usize, total: usize },

    /// The stream ended before the full payload was sent.
    #[error("connection lost after sending {sent} of {total} bytes")]
    ConnectionLost { sent: usize, total: usize },
}
