//! This module contains types used throughout the POP3 protocol.

mod message;
pub use self::message::Message;

mod response;
pub use self::response::{Response, Status};

mod stat;
pub use self::stat::{ScanListing, Stat};
