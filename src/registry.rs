use crate::command::{Arity, Command, CommandEntry};
use crate::error::{ConsoleError, Result};

/// Ordered table of commands, filled once at startup.
///
/// Insertion order is kept and is the order `help` lists commands in. Names are
/// unique and matched exactly, case-sensitive.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: Vec<CommandEntry>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    ///
    /// Fails with [`ConsoleError::DuplicateCommand`] if the name is taken; the
    /// registry is left unchanged in that case.
    pub fn push<C: Command + 'static>(
        &mut self,
        name: impl Into<String>,
        arity: Arity,
        help: impl Into<String>,
        handler: C,
    ) -> Result<()> {
        self.push_entry(CommandEntry::new(name, arity, help, Box::new(handler)))
    }

    pub fn push_entry(&mut self, entry: CommandEntry) -> Result<()> {
        if self.find(entry.name()).is_some() {
            return Err(ConsoleError::DuplicateCommand(entry.name().to_string()));
        }
        log::debug!("registered command `{}`", entry.name());
        self.entries.push(entry);
        Ok(())
    }

    /// All commands in registration order.
    pub fn list(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn find(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
