use snafu::Snafu;

/// Recoverable outcomes of tree operations. Every engine, resolver and
/// search call reports its failure as one of these kinds; none of them is
/// fatal to the process.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FsError {
    #[snafu(display("No such file or directory: '{}'", path))]
    PathNotFound { path: String },
    #[snafu(display("Not a directory: '{}'", path))]
    NotADirectory { path: String },
    #[snafu(display("Not a file: '{}'", path))]
    NotAFile { path: String },
    #[snafu(display("Already exists: '{}'", path))]
    AlreadyExists { path: String },
    #[snafu(display("Invalid operation: {}", reason))]
    InvalidOperation { reason: String },
}
