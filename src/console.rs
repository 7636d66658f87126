use crate::builtin::register_builtins;
use crate::command::{Arity, Command, CommandContext};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, Result};
use crate::logging::{LogBuffer, LogPipeline};
use crate::registry::CommandRegistry;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::{Arc, Mutex};

/// The command console: resolves input lines against a [`CommandRegistry`] and runs
/// the matching command, with all output going through a [`LogPipeline`].
///
/// Commands are registered during setup through [`Console::register`]; afterwards the
/// console only reads its registry. Dispatch is synchronous: a handler has finished,
/// including its logging, by the time [`Console::submit_line`] returns.
///
/// Example
/// ```
/// use dev_console::{Console, ConsoleConfig};
/// let (console, scrollback) = Console::in_memory(ConsoleConfig::default()).unwrap();
/// console.submit_line("calc 2 2 +");
/// let scrollback = scrollback.lock().unwrap();
/// assert_eq!(scrollback.last().unwrap().text, "Eval(2 2 +) = 4.000000");
/// ```
pub struct Console {
    config: ConsoleConfig,
    registry: CommandRegistry,
    log: LogPipeline,
}

impl Console {
    /// Console with the builtin commands registered.
    pub fn new(config: ConsoleConfig, log: LogPipeline) -> Result<Self> {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry, &config)?;
        Ok(Self::with_registry(config, log, registry))
    }

    /// Console with a custom set of commands.
    pub fn with_registry(config: ConsoleConfig, log: LogPipeline, registry: CommandRegistry) -> Self {
        Self {
            config,
            registry,
            log,
        }
    }

    /// Console with builtins whose scrollback is a plain [`LogBuffer`] the caller can read.
    pub fn in_memory(config: ConsoleConfig) -> Result<(Self, Arc<Mutex<LogBuffer>>)> {
        let buffer = Arc::new(Mutex::new(LogBuffer::new(config.log_capacity)));
        let log = LogPipeline::attached(config.max_message_len, buffer.clone());
        Ok((Self::new(config, log)?, buffer))
    }

    /// Add a host command. Meant for setup, before the first line is submitted.
    pub fn register<C: Command + 'static>(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        help: impl Into<String>,
        handler: C,
    ) -> Result<()> {
        self.registry.push(name, arity, help, handler)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn log(&self) -> &LogPipeline {
        &self.log
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Entry point for the console UI, called once per line the user submits.
    pub fn submit_line(&self, line: &str) {
        self.dispatch(line);
    }

    /// Resolve `line` and run the command it names.
    ///
    /// Unknown commands and handler failures end up as error entries in the log; blank
    /// lines are ignored. The declared [`Arity`] is not checked here.
    pub fn dispatch(&self, line: &str) {
        let Some((name, args)) = split_line(line) else {
            return;
        };
        let Some(entry) = self.registry.find(name) else {
            self.log
                .error(ConsoleError::UnknownCommand(line.to_string()));
            return;
        };

        let ctx = CommandContext {
            log: &self.log,
            registry: &self.registry,
            config: &self.config,
        };
        if let Err(err) = entry.execute(args, &ctx) {
            self.log.error(format!("{}: {:#}", entry.name(), err));
        }
    }

    /// Interactive loop on the terminal until Ctrl-C or Ctrl-D.
    pub fn repl(&self) -> rustyline::Result<()> {
        let mut rl = DefaultEditor::new()?;

        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.as_str())?;
                    }
                    self.submit_line(&line);
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }
}

/// Split a line into the command name and the rest.
///
/// The name is the first run of non-whitespace; the rest starts after the following
/// whitespace run and keeps everything else verbatim. `None` for blank lines.
pub(crate) fn split_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_start();
    if line.is_empty() {
        return None;
    }
    let end = line.find(char::is_whitespace).unwrap_or(line.len());
    let (name, rest) = line.split_at(end);
    Some((name, rest.trim_start()))
}
