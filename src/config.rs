//! Configuration consumed by the socket handler lifecycle.
//!
//! All defaults are explicit, documented constants; nothing is read from the
//! process environment or any interpreter-wide setting. Timeout values are
//! validated here so the setters, the builder, and the constructors agree on
//! what "valid" means.

use std::time::Duration;

use crate::error::SinkError;

/// Default connection timeout, in seconds, applied when establishing sockets.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: f64 = 60.0;
/// Default read/write timeout, in whole seconds, applied to open streams.
/// Zero disables the timeout.
pub const DEFAULT_IO_TIMEOUT_SECS: i64 = 10;

/// Configuration object describing how to construct a
/// [`SocketHandler`](crate::SocketHandler).
#[derive(Clone, Debug)]
pub struct SocketSinkConfig {
    /// Remote endpoint, forwarded verbatim to the transport.
    pub target: String,
    /// Keep the connection across `close()` calls when true.
    pub persistent: bool,
    /// Timeout for establishing the connection, in seconds.
    pub connect_timeout_secs: f64,
    /// Read/write timeout for the open stream, in whole seconds; zero means
    /// no timeout.
    pub io_timeout_secs: i64,
}

impl SocketSinkConfig {
    /// Create a configuration for `target` with default timeouts and
    /// persistence disabled.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            persistent: false,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            io_timeout_secs: DEFAULT_IO_TIMEOUT_SECS,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SinkError> {
        validate_connect_timeout(self.connect_timeout_secs)?;
        validate_io_timeout(self.io_timeout_secs)?;
        Ok(())
    }
}

/// Check a connection timeout before it is stored.
pub(crate) fn validate_connect_timeout(seconds: f64) -> Result<f64, SinkError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(SinkError::InvalidArgument(format!(
            "connection timeout must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Ok(seconds)
}

/// Check an I/O timeout before it is stored.
pub(crate) fn validate_io_timeout(seconds: i64) -> Result<i64, SinkError> {
    if seconds < 0 {
        return Err(SinkError::InvalidArgument(format!(
            "I/O timeout must be a non-negative number of seconds, got {seconds}"
        )));
    }
    Ok(seconds)
}

/// Map the stored I/O timeout onto the value the stream expects.
pub(crate) fn io_timeout_duration(seconds: i64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_io_timeout_disables_the_stream_timeout() {
        assert_eq!(io_timeout_duration(0), None);
        assert_eq!(io_timeout_duration(3), Some(Duration::from_secs(3)));
    }

    #[test]
    fn default_config_is_valid() {
        assert!(
            SocketSinkConfig::new("tcp://localhost:9020")
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn nan_connect_timeout_is_rejected() {
        assert!(matches!(
            validate_connect_timeout(f64::NAN),
            Err(SinkError::InvalidArgument(_))
        ));
    }
}
