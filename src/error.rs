//! Error types for the counter and its loaders.
//!
//! Lookups never fail: a missing key is `None` or an empty result. Errors only
//! come from turning text into numbers and from the initial load.

use std::num::ParseIntError;

use thiserror::Error;

/// Result type alias for fallible counter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while loading input or parsing commands.
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Initial load
    // =========================================================================
    /// Reading the input failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The input has no record-count header line
    #[error("input is empty, expected a record count on the first line")]
    MissingHeader,

    /// A line of the input file could not be parsed
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// The header count disagrees with the records that follow
    #[error("header declares {expected} records, found {found}")]
    RecordCount { expected: usize, found: usize },

    /// Ids are not strictly ascending
    #[error("line {line}: id {id} does not follow {previous} in ascending order")]
    Unsorted { line: usize, id: i64, previous: i64 },

    /// Key and value arrays handed to the bulk loader differ in length
    #[error("{keys} keys but {values} values")]
    LengthMismatch { keys: usize, values: usize },

    // =========================================================================
    // Commands
    // =========================================================================
    /// The verb is not one of the known commands
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// Wrong number of arguments for the verb
    #[error("'{command}' takes {expected} argument(s), got {found}")]
    Arity {
        command: &'static str,
        expected: usize,
        found: usize,
    },

    /// An argument is not a decimal integer
    #[error("invalid argument '{arg}': {source}")]
    InvalidArgument {
        arg: String,
        #[source]
        source: ParseIntError,
    },
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// True for errors that only abort a single command.
    pub fn is_command_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownCommand(_) | Error::Arity { .. } | Error::InvalidArgument { .. }
        )
    }
}
