//! Interactive command-line front end over the shared engine handle.

mod command;
mod session;

pub use command::{Command, CommandParseError};
pub use session::Session;
