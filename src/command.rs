use crate::config::ConsoleConfig;
use crate::logging::LogPipeline;
use crate::registry::CommandRegistry;
use anyhow::Result;
use std::fmt;

/// Number of arguments a command declares.
///
/// This is descriptive metadata shown by `help`. The dispatcher never enforces it:
/// every handler receives the raw remainder of the line and validates it itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Any number of words, including none.
    Variadic,
    /// Exactly this many words.
    Exact(usize),
}

impl Arity {
    /// Convert the conventional integer form: negative means variadic.
    pub fn from_count(count: i32) -> Self {
        usize::try_from(count).map_or(Arity::Variadic, Arity::Exact)
    }
}

/// Everything a command handler may touch while it runs.
///
/// Passed explicitly on every invocation; there is no global console.
pub struct CommandContext<'a> {
    pub log: &'a LogPipeline,
    pub registry: &'a CommandRegistry,
    pub config: &'a ConsoleConfig,
}

/// Object-safe trait for anything the console can dispatch a line to.
///
/// `args` is the remainder of the input line after the command name, with leading
/// whitespace removed. It may be empty. Output goes through `ctx.log`; an `Err`
/// is reported by the dispatcher as an error entry.
///
/// Closures of the right shape implement it, which is the usual way for a host to
/// add its own commands:
///
/// ```
/// use dev_console::{Arity, CommandContext, CommandRegistry};
/// let ping = |_args: &str, ctx: &CommandContext<'_>| -> anyhow::Result<()> {
///     ctx.log.info("pong");
///     Ok(())
/// };
/// let mut registry = CommandRegistry::new();
/// registry.push("ping", Arity::Exact(0), "Answers pong", ping).unwrap();
/// assert!(registry.find("ping").is_some());
/// ```
pub trait Command {
    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()>;
}

impl<F> Command for F
where
    F: Fn(&str, &CommandContext<'_>) -> Result<()>,
{
    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        self(args, ctx)
    }
}

/// A registered command. Immutable once created.
pub struct CommandEntry {
    name: String,
    arity: Arity,
    help: String,
    handler: Box<dyn Command>,
}

impl CommandEntry {
    pub fn new(
        name: impl Into<String>,
        arity: Arity,
        help: impl Into<String>,
        handler: Box<dyn Command>,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            help: help.into(),
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn handler(&self) -> &dyn Command {
        self.handler.as_ref()
    }

    /// Run the handler with the given argument string.
    pub fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        self.handler.execute(args, ctx)
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}
