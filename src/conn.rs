use std::fmt::{Debug, Formatter};
use std::io::{Read, Write};

/// A POP3 transport: any duplex byte stream, plain or encrypted.
pub trait PopConnection: Read + Write + Send + private::Sealed {}

impl<T> PopConnection for T where T: Read + Write + Send {}

impl Debug for dyn PopConnection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "POP3 connection")
    }
}

/// A boxed transport, as produced by [`ClientBuilder::connect`](crate::ClientBuilder::connect).
pub type Transport = Box<dyn PopConnection>;

mod private {
    use super::{Read, Write};

    pub trait Sealed {}

    impl<T> Sealed for T where T: Read + Write {}
}
