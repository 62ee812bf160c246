use std::io;
use thiserror::Error;

/// Errors while parsing an image byte stream or reading it from disk.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("Image is missing its origin word")]
    MissingOrigin,
    #[error("Could not read image file '{path}': {source}")]
    ImageFileUnreadable { path: String, source: io::Error },
}

/// Errors that terminate the execution loop.
///
/// [`ExecutionError::IllegalInstruction`] and
/// [`ExecutionError::UnknownTrapVector`] leave the emulator in the `Faulted`
/// state, the simulated hardware has no handler for them.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Illegal instruction with opcode {opcode:#06b} at address {address:#06X}")]
    IllegalInstruction { opcode: u8, address: u16 },
    #[error("Unknown trap vector {vector:#04X} at address {address:#06X}")]
    UnknownTrapVector { vector: u8, address: u16 },
    #[error("Error during reading Stdin or writing program output to Stdout: {0}")]
    InputOutput(String),
    #[error("Execution interrupted by user")]
    Interrupted,
}

impl ExecutionError {
    /// Maps an I/O failure to the matching loop-terminating error.
    ///
    /// `ErrorKind::Interrupted` marks a user-requested abort and keeps its
    /// own variant so the caller can exit with a distinguished code.
    pub(crate) fn from_io_error(error: &io::Error) -> Self {
        if error.kind() == io::ErrorKind::Interrupted {
            Self::Interrupted
        } else {
            Self::InputOutput(error.to_string())
        }
    }
}
