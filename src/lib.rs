//! An embeddable, in-process command console.
//!
//! A host application registers named commands at startup and feeds the console one
//! line of user input at a time. The first word of a line selects the command and the
//! rest of the line is handed to it unparsed. Everything a command has to say, errors
//! included, becomes a timestamped, severity-labelled entry in a [`LogPipeline`] whose
//! sink the host renders however it likes.
//!
//! The main entry point is [`Console`]. The [`command`] module holds the traits for
//! writing commands, [`logging`] the pipeline and sinks, and [`rpn`] the postfix
//! evaluator behind the builtin `calc` command. The [`bridge`] module forwards records
//! from the `log` crate into the console.

pub mod bridge;
mod builtin;
pub mod command;
mod config;
mod console;
mod error;
pub mod logging;
mod registry;
pub mod rpn;
#[cfg(not(target_family = "wasm"))]
mod shell;

pub use builtin::register_builtins;
pub use command::{Arity, Command, CommandContext, CommandEntry};
pub use config::ConsoleConfig;
pub use console::Console;
pub use error::{ConsoleError, Result};
pub use logging::{LogBuffer, LogEntry, LogPipeline, LogSink, Severity, TerminalSink};
pub use registry::CommandRegistry;
