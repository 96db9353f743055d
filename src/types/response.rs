/// The status marker that leads every POP3 response line.
///
/// From [section 3 of RFC 1939](https://tools.ietf.org/html/rfc1939#section-3): responses consist
/// of a status indicator and a keyword possibly followed by additional information. There are
/// currently two status indicators: positive (`+OK`) and negative (`-ERR`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// `+OK`
    Ok,
    /// `-ERR`
    Err,
}

/// A decoded status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Whether the server accepted the command.
    pub status: Status,
    /// Everything after the first space of the status line, or the empty string.
    pub text: String,
}

impl Response {
    /// Returns `true` for a `+OK` response.
    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}
