mod cli;

pub use cli::{Cli, LogLevel};
