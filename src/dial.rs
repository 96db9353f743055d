//! Ways of opening the TCP stream a POP3 session runs over.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use socks::Socks5Stream;

/// Anything that can open a duplex byte stream to `host:port`.
pub trait Dialer {
    /// Open a connection to the given host and port.
    fn dial(&self, host: &str, port: u16) -> io::Result<TcpStream>;
}

/// Connect straight to the server.
#[derive(Debug, Clone, Default)]
pub struct Direct {
    /// Per-address connect timeout. `None` uses the operating system default.
    pub timeout: Option<Duration>,
}

impl Dialer for Direct {
    fn dial(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let timeout = match self.timeout {
            Some(timeout) => timeout,
            None => return TcpStream::connect((host, port)),
        };

        // `connect_timeout` takes a single address, so resolve and try each in order
        let mut last_err = None;
        for addr in (host, port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(tcp) => return Ok(tcp),
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "connect failed");
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} did not resolve to any address", host),
            )
        }))
    }
}

/// Connect through a SOCKS5 proxy such as Tor.
///
/// The target host name is passed to the proxy unresolved, so DNS lookups happen on the proxy's
/// side.
#[derive(Debug, Clone)]
pub struct Socks5 {
    proxy: String,
}

impl Socks5 {
    /// Use the proxy listening at `proxy`, given as `host:port`.
    pub fn new<S: Into<String>>(proxy: S) -> Self {
        Socks5 {
            proxy: proxy.into(),
        }
    }
}

impl Dialer for Socks5 {
    fn dial(&self, host: &str, port: u16) -> io::Result<TcpStream> {
        let stream = Socks5Stream::connect(self.proxy.as_str(), (host, port))?;
        Ok(stream.into_inner())
    }
}
