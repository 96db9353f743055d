//! POP3 and Maildir error types.

use std::error::Error as StdError;
use std::fmt;
use std::io::Error as IoError;
#[cfg(any(feature = "native-tls", feature = "rustls-tls"))]
use std::net::TcpStream;
use std::path::PathBuf;
use std::result;

use bufstream::IntoInnerError as BufError;
#[cfg(feature = "native-tls")]
use native_tls::Error as TlsError;
#[cfg(feature = "native-tls")]
use native_tls::HandshakeError as TlsHandshakeError;
#[cfg(feature = "rustls-tls")]
use rustls_connector::HandshakeError as RustlsHandshakeError;

/// A convenience wrapper around `Result` for `popdir::Error`.
pub type Result<T> = result::Result<T, Error>;

/// A set of errors that can occur while moving mail from a POP3 server into a Maildir.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// An `io::Error` that occurred while trying to read or write to a network stream.
    Io(IoError),
    /// An error from the `native_tls` library during the TLS handshake.
    #[cfg(feature = "native-tls")]
    TlsHandshake(TlsHandshakeError<TcpStream>),
    /// An error from the `native_tls` library while managing the socket.
    #[cfg(feature = "native-tls")]
    Tls(TlsError),
    /// An error from the `rustls` library during the TLS handshake.
    #[cfg(feature = "rustls-tls")]
    RustlsHandshake(RustlsHandshakeError<TcpStream>),
    /// A TLS connection was requested, but the crate was built without a TLS backend.
    TlsUnavailable,
    /// A `-ERR` response from the POP3 server, carrying the server's explanation.
    Rejected(String),
    /// The connection was terminated unexpectedly.
    ConnectionLost,
    /// Error parsing a server response.
    Parse(ParseError),
    /// Error validating input data.
    Validate(ValidateError),
    /// A message could not be durably placed in the Maildir.
    Delivery(DeliveryError),
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Error {
        Error::Io(err)
    }
}

impl<T> From<BufError<T>> for Error {
    fn from(err: BufError<T>) -> Error {
        Error::Io(err.into())
    }
}

#[cfg(feature = "native-tls")]
impl From<TlsHandshakeError<TcpStream>> for Error {
    fn from(err: TlsHandshakeError<TcpStream>) -> Error {
        Error::TlsHandshake(err)
    }
}

#[cfg(feature = "native-tls")]
impl From<TlsError> for Error {
    fn from(err: TlsError) -> Error {
        Error::Tls(err)
    }
}

#[cfg(feature = "rustls-tls")]
impl From<RustlsHandshakeError<TcpStream>> for Error {
    fn from(err: RustlsHandshakeError<TcpStream>) -> Error {
        Error::RustlsHandshake(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<DeliveryError> for Error {
    fn from(err: DeliveryError) -> Error {
        Error::Delivery(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Io(ref e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "native-tls")]
            Error::Tls(ref e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "native-tls")]
            Error::TlsHandshake(ref e) => fmt::Display::fmt(e, f),
            #[cfg(feature = "rustls-tls")]
            Error::RustlsHandshake(ref e) => fmt::Display::fmt(e, f),
            Error::TlsUnavailable => f.write_str("No TLS backend compiled in"),
            Error::Rejected(ref text) => write!(f, "Server returned error: {}", text),
            Error::ConnectionLost => f.write_str("Connection lost"),
            Error::Parse(ref e) => fmt::Display::fmt(e, f),
            Error::Validate(ref e) => fmt::Display::fmt(e, f),
            Error::Delivery(ref e) => fmt::Display::fmt(e, f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            #[cfg(feature = "native-tls")]
            Error::Tls(ref e) => Some(e),
            #[cfg(feature = "native-tls")]
            Error::TlsHandshake(ref e) => Some(e),
            #[cfg(feature = "rustls-tls")]
            Error::RustlsHandshake(ref e) => Some(e),
            Error::Parse(ref e) => Some(e),
            Error::Validate(ref e) => Some(e),
            Error::Delivery(ref e) => Some(e),
            _ => None,
        }
    }
}

/// An error parsing a server response.
///
/// Any of these means the client and server no longer agree on where one response ends and the
/// next begins, so the session should be abandoned.
#[derive(Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The status line did not start with `+OK` or `-ERR`. Holds the offending token.
    Status(String),
    /// A `STAT` response was not of the form `count size`.
    Stat(String),
    /// A `LIST` scan listing was not of the form `index size`.
    ScanListing(String),
    /// A line ran past the given number of bytes without a line ending.
    LineTooLong(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ParseError::Status(ref token) => write!(f, "Malformed response status: {}", token),
            ParseError::Stat(ref line) => write!(f, "Malformed STAT response: {}", line),
            ParseError::ScanListing(ref line) => write!(f, "Malformed LIST response: {}", line),
            ParseError::LineTooLong(limit) => {
                write!(f, "Response line longer than {} bytes", limit)
            }
        }
    }
}

impl StdError for ParseError {}

/// An invalid character was found in a command argument.
#[derive(Debug)]
pub struct ValidateError(pub char);

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // print character in debug form because invalid ones are often whitespaces
        write!(f, "Invalid character in input: {:?}", self.0)
    }
}

impl StdError for ValidateError {}

/// A message could not be delivered into a Maildir.
///
/// Whenever this is returned the delivery did not complete and the remote copy must be left
/// alone. Only after [`DeliveryError::Sync`] is the file already present in `new/`; it is not
/// guaranteed to survive a crash.
#[derive(Debug)]
pub enum DeliveryError {
    /// No randomness was available to name the message.
    Entropy(rand::Error),
    /// The message could not be written to `tmp/`.
    Write {
        /// The staging file.
        path: PathBuf,
        /// The underlying failure.
        source: IoError,
    },
    /// The staged message could not be moved into `new/`.
    Rename {
        /// The staging file, which is left behind.
        from: PathBuf,
        /// The intended final location.
        to: PathBuf,
        /// The underlying failure.
        source: IoError,
    },
    /// The `new/` directory entry could not be flushed to disk.
    Sync {
        /// The directory that failed to sync.
        path: PathBuf,
        /// The underlying failure.
        source: IoError,
    },
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DeliveryError::Entropy(ref e) => write!(f, "Unable to generate message name: {}", e),
            DeliveryError::Write {
                ref path,
                ref source,
            } => write!(f, "Unable to write {}: {}", path.display(), source),
            DeliveryError::Rename {
                ref from,
                ref to,
                ref source,
            } => write!(
                f,
                "Unable to move {} to {}: {}",
                from.display(),
                to.display(),
                source
            ),
            DeliveryError::Sync {
                ref path,
                ref source,
            } => write!(f, "Unable to sync {}: {}", path.display(), source),
        }
    }
}

impl StdError for DeliveryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            DeliveryError::Entropy(ref e) => Some(e),
            DeliveryError::Write { ref source, .. }
            | DeliveryError::Rename { ref source, .. }
            | DeliveryError::Sync { ref source, .. } => Some(source),
        }
    }
}
