//! Command status codes.

use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure status of a dispatched command.
#[derive(Error, Debug)]
pub enum Error {
    /// The device rejected a feature report.
    #[error("could not send feature report: {0}")]
    Transmission(String),

    /// The handler requires more parameters than were given.
    #[error("incorrect number of parameters for {command}: expected at least {expected}, got {actual}")]
    ArgumentCount { command: &'static str, expected: usize, actual: usize },

    /// The keyboard handle is absent or already closed.
    #[error("no open keyboard device")]
    NoDevice,

    /// Storage for the command tokens could not be reserved.
    #[error("memory allocation error")]
    OutOfMemory,

    /// No command with this name exists in the table.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// A parameter was present but is not part of the protocol.
    #[error("unknown {kind}: {value}")]
    UnknownValue { kind: &'static str, value: i32 },

    /// Commands could not be read from the input stream.
    #[error("unable to read commands: {0}")]
    Input(#[from] io::Error),
}

impl Error {
    /// Numeric status, in increasing order of severity.
    pub fn status(&self) -> u8 {
        match self {
            Self::Transmission(_) => 1,
            Self::ArgumentCount { .. } => 2,
            Self::NoDevice => 3,
            Self::OutOfMemory => 4,
            Self::UnknownCommand(_) => 5,
            Self::UnknownValue { .. } => 6,
            Self::Input(_) => 7,
        }
    }

    /// Process exit code for this status.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Transmission(_) => 1,
            Self::ArgumentCount { .. } | Self::UnknownCommand(_) | Self::UnknownValue { .. } => 3,
            Self::NoDevice | Self::OutOfMemory => 4,
            Self::Input(_) => 5,
        }
    }
}
