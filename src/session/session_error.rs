//! Errors reported at the command boundary.
//!
//! None of them ends the session: the shell reports the error on one line and
//! goes back to the prompt.

use std::io;
use thiserror;

use crate::filesystem::fat_error::FATError;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The image path could not be opened.
    #[error("File system image not found: {path}: {source}")]
    ImageNotFound { path: String, source: io::Error },
    #[error("File system image already open")]
    AlreadyOpen,
    #[error("File system image must be opened first")]
    NotOpen,
    /// A command was invoked without one of its required arguments.
    #[error("Missing arg: {0}")]
    MissingArgument(String),
    #[error("Arg parsing error: {0}")]
    InvalidArgument(String),
    #[error("Unknown command: {0:?}")]
    UnknownCommand(String),
    /// Error raised by the traversal engine.
    #[error("{0}")]
    Fat(FATError),
    /// Wraps an I/O error on a file other than the image (extraction target, output).
    #[error("I/O error: {0}")]
    IOError(io::Error),
}

impl From<FATError> for SessionError {
    fn from(err: FATError) -> Self {
        SessionError::Fat(err)
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        SessionError::IOError(err)
    }
}
