//! Error taxonomy shared by every part of the console.

use thiserror::Error;

/// Everything that can go wrong inside the console engine.
///
/// All kinds except [`ConsoleError::SinkUninitialized`] are reported as a log entry
/// and the session carries on.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Operand stack underflow, leftover operands or an empty expression.
    #[error("Invalid expression")]
    MalformedExpression,

    /// Operator outside of `+ - * /`.
    #[error("Invalid Operation `{0}`")]
    InvalidOperation(char),

    /// No command registered under the first word of the line. Holds the full line.
    #[error("Unknown command `{0}`")]
    UnknownCommand(String),

    /// A command with this name is already registered.
    #[error("Command `{0}` is already registered")]
    DuplicateCommand(String),

    /// The shell could not be started.
    #[error("Sh: Failed to execute command: {0}")]
    SubprocessSpawnFailure(#[source] std::io::Error),

    /// Something tried to log before a sink was attached to the pipeline.
    #[error("log sink used before it was initialized")]
    SinkUninitialized,
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ConsoleError>;
