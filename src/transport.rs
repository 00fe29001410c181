//! Transport primitives for the socket sink.
//!
//! The handler talks to the operating system exclusively through the
//! [`Transport`] and [`Connection`] traits so tests can substitute a scripted
//! implementation. [`NetTransport`] is the production binding: TCP streams
//! addressed as `tcp://host:port` (or bare `host:port`) and, on Unix, domain
//! sockets addressed as `unix://path`.

use std::{
    io::{self, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use log::debug;

#[cfg(unix)]
use std::os::unix::{io::AsRawFd, net::UnixStream};

/// Factory for outbound stream connections.
pub trait Transport: Send + Sync {
    /// Establish a connection to `target` within `timeout`.
    ///
    /// `persistent` requests the persistent connect variant where the
    /// transport has one; implementations without such a variant may ignore
    /// it. Persistence across logical sessions is enforced by the handler,
    /// not here.
    fn connect(
        &self,
        target: &str,
        timeout: Duration,
        persistent: bool,
    ) -> io::Result<Box<dyn Connection>>;
}

/// An open stream handed out by a [`Transport`].
pub trait Connection: Send {
    /// Apply a read/write timeout to the stream; `None` removes any timeout.
    fn set_io_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()>;

    /// Write as much of `buf` as the stream will take in one attempt.
    ///
    /// A short count is not an error. A timed-out attempt reports zero bytes
    /// and raises the flag read back via [`Connection::timed_out`].
    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Whether the most recent operation hit the configured I/O timeout.
    fn timed_out(&self) -> bool;

    /// Whether the peer has closed its end of the stream.
    fn at_eof(&self) -> bool;
}

/// Production transport backed by real sockets.
#[derive(Clone, Copy, Debug, Default)]
pub struct NetTransport;

impl Transport for NetTransport {
    fn connect(
        &self,
        target: &str,
        timeout: Duration,
        persistent: bool,
    ) -> io::Result<Box<dyn Connection>> {
        if persistent {
            // No OS-level persistent handle exists; the handler keeps the
            // stream across close() instead.
            debug!("socksink: persistent connect requested for {target}");
        }
        let stream = if let Some(path) = target.strip_prefix("unix://") {
            connect_unix(path)?
        } else {
            let addr = target.strip_prefix("tcp://").unwrap_or(target);
            NetStream::Tcp(connect_tcp(addr, timeout)?)
        };
        Ok(Box::new(NetConnection {
            stream,
            timed_out: false,
        }))
    }
}

#[cfg(unix)]
fn connect_unix(path: &str) -> io::Result<NetStream> {
    UnixStream::connect(path).map(NetStream::Unix)
}

#[cfg(not(unix))]
fn connect_unix(_path: &str) -> io::Result<NetStream> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix domain sockets are not supported on this platform",
    ))
}

fn connect_tcp(addr: &str, timeout: Duration) -> io::Result<TcpStream> {
    let addrs: Vec<SocketAddr> = addr.to_socket_addrs()?.collect();
    let mut last_err = None;
    for candidate in addrs {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => {
                stream.set_nonblocking(false)?;
                return Ok(stream);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{addr} did not resolve to any address"),
        )
    }))
}

/// Active socket connection state.
struct NetConnection {
    stream: NetStream,
    timed_out: bool,
}

enum NetStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl NetStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            NetStream::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            NetStream::Unix(stream) => stream.write(buf),
        }
    }

    fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            NetStream::Tcp(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
            #[cfg(unix)]
            NetStream::Unix(stream) => {
                stream.set_read_timeout(timeout)?;
                stream.set_write_timeout(timeout)
            }
        }
    }

    /// One-byte peek without consuming or blocking. `Ok(0)` is the peer's
    /// FIN.
    fn peek_nonblocking(&self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NetStream::Tcp(stream) => {
                stream.set_nonblocking(true)?;
                let result = stream.peek(buf);
                stream.set_nonblocking(false)?;
                result
            }
            #[cfg(unix)]
            NetStream::Unix(stream) => {
                // `UnixStream::peek` is not yet stable; go through the fd.
                let count = unsafe {
                    libc::recv(
                        stream.as_raw_fd(),
                        buf.as_mut_ptr().cast(),
                        buf.len(),
                        libc::MSG_PEEK | libc::MSG_DONTWAIT,
                    )
                };
                if count < 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(count as usize)
            }
        }
    }
}

impl Connection for NetConnection {
    fn set_io_timeout(&mut self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.set_timeouts(timeout)
    }

    fn write_chunk(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.stream.write(buf) {
            Ok(count) => {
                self.timed_out = false;
                Ok(count)
            }
            Err(err) if matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                self.timed_out = true;
                Ok(0)
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(err) => Err(err),
        }
    }

    fn timed_out(&self) -> bool {
        self.timed_out
    }

    fn at_eof(&self) -> bool {
        // WouldBlock means the stream is alive with nothing buffered; any
        // other probe failure counts as a dead stream.
        let mut probe = [0u8; 1];
        match self.stream.peek_nonblocking(&mut probe) {
            Ok(0) => true,
            Ok(_) => false,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => false,
            Err(_) => true,
        }
    }
}
