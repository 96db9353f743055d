/// The drop listing returned by `STAT`.
///
/// See [section 5 of RFC 1939](https://tools.ietf.org/html/rfc1939#page-6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stat {
    /// Number of messages in the maildrop.
    pub count: u32,
    /// Size of the maildrop in octets.
    pub size: u64,
}

/// A single scan listing as returned by `LIST <index>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanListing {
    /// The message number.
    pub index: u32,
    /// The exact size of the message in octets.
    pub size: u64,
}
