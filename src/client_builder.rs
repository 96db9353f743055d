use crate::conn::Transport;
use crate::dial::{Dialer, Direct, Socks5};
use crate::{Client, Result};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

#[cfg(feature = "native-tls")]
use native_tls::TlsConnector;
#[cfg(feature = "rustls-tls")]
use rustls_connector::RustlsConnector;

/// How the byte stream to the server is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum ConnectionMode {
    /// Wrap the connection in TLS from the first byte (POP3S, conventionally port 995).
    #[default]
    Tls,
    /// Speak POP3 over the bare TCP stream. Credentials travel in the clear.
    Plaintext,
}

/// The TLS implementation used for [`ConnectionMode::Tls`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum TlsKind {
    /// The platform TLS library, through `native-tls`.
    Native,
    /// `rustls` with the platform's root certificates.
    Rust,
}

impl Default for TlsKind {
    fn default() -> Self {
        if cfg!(feature = "native-tls") {
            TlsKind::Native
        } else {
            TlsKind::Rust
        }
    }
}

/// A convenience builder for [`Client`] structs over various transports.
///
/// Connecting over TLS with the default TLS backend is straightforward:
/// ```no_run
/// # use popdir::ClientBuilder;
/// # fn main() -> Result<(), popdir::Error> {
/// let client = ClientBuilder::new("pop.example.com", 995).connect()?;
/// # Ok(())
/// # }
/// ```
///
/// Going through a SOCKS5 proxy, with the certificate checked against a different name:
/// ```no_run
/// # use popdir::ClientBuilder;
/// # fn main() -> Result<(), popdir::Error> {
/// let client = ClientBuilder::new("abcdefgh.onion", 995)
///     .proxy("127.0.0.1:9050")
///     .tls_server_name("pop.example.com")
///     .connect()?;
/// # Ok(())
/// # }
/// ```
///
/// The returned client has already read the server greeting.
#[derive(Debug, Clone)]
pub struct ClientBuilder<D>
where
    D: AsRef<str>,
{
    domain: D,
    port: u16,
    mode: ConnectionMode,
    tls_kind: TlsKind,
    tls_server_name: Option<String>,
    proxy: Option<String>,
    timeout: Option<Duration>,
}

impl<D> ClientBuilder<D>
where
    D: AsRef<str>,
{
    /// Make a new `ClientBuilder` using the given domain and port.
    pub fn new(domain: D, port: u16) -> Self {
        ClientBuilder {
            domain,
            port,
            mode: ConnectionMode::default(),
            tls_kind: TlsKind::default(),
            tls_server_name: None,
            proxy: None,
            timeout: None,
        }
    }

    /// Choose between TLS and plaintext. Defaults to [`ConnectionMode::Tls`].
    pub fn mode(mut self, mode: ConnectionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Choose the TLS backend.
    pub fn tls_kind(mut self, kind: TlsKind) -> Self {
        self.tls_kind = kind;
        self
    }

    /// Verify the server certificate against `name` instead of the domain being dialed.
    pub fn tls_server_name<S: Into<String>>(mut self, name: S) -> Self {
        self.tls_server_name = Some(name.into());
        self
    }

    /// Dial through the SOCKS5 proxy at `proxy` (`host:port`).
    pub fn proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Fail connects, reads and writes that take longer than `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Return a new [`Client`] over the configured transport.
    pub fn connect(&self) -> Result<Client<Transport>> {
        match self.mode {
            ConnectionMode::Plaintext => self.connect_with(|_, tcp| Ok(Box::new(tcp) as Transport)),
            ConnectionMode::Tls => self.connect_with(|name, tcp| match self.tls_kind {
                TlsKind::Native => native_tls_handshake(name, tcp),
                TlsKind::Rust => rustls_handshake(name, tcp),
            }),
        }
    }

    /// Make a [`Client`] using a custom stream initialization. This function is intended
    /// to be used if your TLS setup requires custom work such as adding private CAs
    /// or other specific TLS parameters.
    ///
    /// The `handshake` argument should accept two parameters:
    ///
    /// - name: [`&str`], the TLS server name
    /// - tcp: [`TcpStream`], already connected (through the proxy, if one is set)
    ///
    /// and yield a `Result<C>` where `C` is `Read + Write`.
    ///
    /// ```no_run
    /// # use popdir::ClientBuilder;
    /// # use native_tls::TlsConnector;
    /// # fn main() -> Result<(), popdir::Error> {
    /// let client = ClientBuilder::new("pop.example.com", 995).connect_with(|name, tcp| {
    ///     let tls = TlsConnector::builder()
    ///         .danger_accept_invalid_certs(true)
    ///         .build()?;
    ///     Ok(tls.connect(name, tcp)?)
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn connect_with<F, C>(&self, handshake: F) -> Result<Client<C>>
    where
        F: FnOnce(&str, TcpStream) -> Result<C>,
        C: Read + Write,
    {
        let domain = self.domain.as_ref();
        let tcp = self.dialer().dial(domain, self.port)?;
        tracing::debug!(domain, port = self.port, proxy = ?self.proxy, "connected");
        if self.timeout.is_some() {
            tcp.set_read_timeout(self.timeout)?;
            tcp.set_write_timeout(self.timeout)?;
        }

        let name = self.tls_server_name.as_deref().unwrap_or(domain);
        let stream = handshake(name, tcp)?;
        let mut client = Client::new(stream);
        let greeting = client.read_greeting()?;
        tracing::debug!(greeting = %greeting, "server ready");
        Ok(client)
    }

    fn dialer(&self) -> Box<dyn Dialer> {
        match self.proxy {
            Some(ref proxy) => Box::new(Socks5::new(proxy.as_str())),
            None => Box::new(Direct {
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(feature = "native-tls")]
fn native_tls_handshake(name: &str, tcp: TcpStream) -> Result<Transport> {
    let ssl_conn = TlsConnector::builder().build()?;
    Ok(Box::new(ssl_conn.connect(name, tcp)?))
}

#[cfg(not(feature = "native-tls"))]
fn native_tls_handshake(_: &str, _: TcpStream) -> Result<Transport> {
    Err(crate::Error::TlsUnavailable)
}

#[cfg(feature = "rustls-tls")]
fn rustls_handshake(name: &str, tcp: TcpStream) -> Result<Transport> {
    let ssl_conn = RustlsConnector::new_with_native_certs()?;
    Ok(Box::new(ssl_conn.connect(name, tcp)?))
}

#[cfg(not(feature = "rustls-tls"))]
fn rustls_handshake(_: &str, _: TcpStream) -> Result<Transport> {
    Err(crate::Error::TlsUnavailable)
}
