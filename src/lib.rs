//! Synchronous, resilient socket sink for pre-formatted log records.
//!
//! A [`SocketHandler`] holds at most one outbound stream connection to a
//! remote endpoint and writes byte payloads to it. Connections are
//! established lazily on the first write, can optionally persist across
//! [`SocketHandler::close`] calls, and carry configurable connect and I/O
//! timeouts. The write loop tolerates partial writes and distinguishes
//! "fully sent", "timed out mid-send", and "peer hung up mid-send"; see
//! [`SinkError`].
//!
//! Record formatting and level filtering belong to the surrounding logging
//! pipeline — this crate only moves already-rendered bytes.
//!
//! ```no_run
//! use socksink::SocketHandlerBuilder;
//!
//! # fn main() -> Result<(), socksink::SinkError> {
//! let sink = SocketHandlerBuilder::new("tcp://127.0.0.1:9020")
//!     .with_persistent(true)
//!     .with_io_timeout(5)
//!     .build()?;
//! sink.write(b"level=info msg=\"service started\"\n")?;
//! sink.close();
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod error;
mod handler;
mod transport;

pub use builder::SocketHandlerBuilder;
pub use config::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_IO_TIMEOUT_SECS, SocketSinkConfig};
pub use error::SinkError;
pub use handler::SocketHandler;
pub use transport::{Connection, NetTransport, Transport};
