/// A message retrieved with `RETR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The size the server announced on the status line, if it announced one.
    ///
    /// Servers conventionally answer `+OK 200 octets`, but RFC 1939 does not require it.
    pub octets: Option<u64>,
    /// The message exactly as transmitted, with byte-stuffing removed and the terminating `.`
    /// line dropped. Line terminators are kept as received.
    pub body: Vec<u8>,
}

impl Message {
    /// The number of bytes in the body.
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Returns `true` if the body is empty.
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}
