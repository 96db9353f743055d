//! Move mail from a POP3 maildrop into a local Maildir.
//!
//! This crate speaks the client side of [RFC 1939](https://tools.ietf.org/html/rfc1939) over any
//! blocking `Read + Write` stream and delivers each retrieved message into a
//! [Maildir](https://cr.yp.to/proto/maildir.html). A message is only marked for deletion on the
//! server after it has been written to disk and atomically moved into `new/`.
//!
//! # Usage
//!
//! ```no_run
//! # fn main() -> popdir::Result<()> {
//! let client = popdir::ClientBuilder::new("pop.example.com", 995).connect()?;
//! let mut session = client
//!     .login("me@example.com", "password")
//!     .map_err(|(e, _)| e)?;
//!
//! let maildir = popdir::Maildir::new("/home/me/Mail");
//! let summary = popdir::fetch_all(&mut session, &maildir)?;
//! println!("moved {} messages", summary.delivered.len());
//!
//! // messages are only removed from the server once the session ends cleanly
//! session.quit()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Session`] also exposes the individual commands (`STAT`, `LIST`, `RETR`, `DELE`, `RSET`,
//! `NOOP`, `QUIT`) for callers that want a different policy than [`fetch_all`].
//!
//! # Logging
//!
//! Everything is reported through [`tracing`]. Wire traffic is logged at `TRACE` as `C:` and
//! `S:` lines, with the `PASS` argument and message bodies left out.

#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod client_builder;
mod conn;
mod parse;
pub mod types;

pub mod dial;
pub mod error;
pub mod fetch;
pub mod maildir;

pub use crate::client::{Client, Connection, Session};
pub use crate::client_builder::{ClientBuilder, ConnectionMode, TlsKind};
pub use crate::conn::{PopConnection, Transport};
pub use crate::error::{Error, Result};
pub use crate::fetch::{fetch_all, FetchSummary};
pub use crate::maildir::Maildir;
pub use crate::parse::parse_response;
pub use crate::types::*;

#[cfg(test)]
mod mock_stream;
