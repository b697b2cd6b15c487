//! Protocol Module
//!
//! Defines the HEOS text protocol spoken over the device connection.
//!
//! ## Request Format
//! ```text
//! heos://<group>/<command>[?<attr1>[=<val1>]&<attr2>=<val2>...]\r\n
//! ```
//!
//! ## Response Format
//! One JSON line per request:
//! ```text
//! {"heos":{"command":"<group>/<command>","result":"success|fail","message":"<attrs>"}, ...}
//! ```
//!
//! Requests carry no identifiers, so replies are matched to requests purely
//! by order.

mod attributes;
mod command;
mod response;

pub use attributes::{Attributes, AttributesBuilder};
pub use command::{Command, CommandGroup, SCHEME};
pub use response::{ErrorId, Response, Status, NO_ERROR_MESSAGE};

/// Line terminator appended to every outgoing command
pub const LINE_TERMINATOR: &str = "\r\n";
