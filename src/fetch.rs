//! Moving every message of a maildrop into a Maildir.

use std::io::{Read, Write};
use std::path::PathBuf;

use super::client::Session;
use super::error::Result;
use super::maildir::Maildir;

/// What [`fetch_all`] did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchSummary {
    /// Messages in the maildrop according to `STAT`.
    pub messages: u32,
    /// Size of the maildrop in octets according to `STAT`.
    pub octets: u64,
    /// Where each message ended up, in maildrop order.
    pub delivered: Vec<PathBuf>,
}

/// Retrieve every message, deliver it into `maildir`, and mark it for deletion.
///
/// `DELE n` is only sent once message `n` is durably in `new/`. The first error of any kind
/// stops the run and is returned; messages delivered before it stay marked for deletion, so
/// the caller decides whether to [`Session::quit`] (committing those deletions) or drop the
/// session (keeping everything on the server).
pub fn fetch_all<T: Read + Write>(
    session: &mut Session<T>,
    maildir: &Maildir,
) -> Result<FetchSummary> {
    let stat = session.stat()?;
    tracing::info!(
        "There are {} messages of total size {} bytes",
        stat.count,
        stat.size
    );

    let mut summary = FetchSummary {
        messages: stat.count,
        octets: stat.size,
        delivered: Vec::new(),
    };
    for i in 1..=stat.count {
        let message = session.retr(i)?;
        tracing::info!(
            "Fetching message {}/{} ({} bytes)",
            i,
            stat.count,
            message.octets.unwrap_or(message.len() as u64)
        );
        let path = maildir.deliver(&message.body)?;
        session.dele(i)?;
        summary.delivered.push(path);
    }
    Ok(summary)
}
