use std::time::Duration;

/// Tunables for a [`Console`](crate::Console) instance.
///
/// The configuration contains:
/// - `log_capacity`: how many entries the scrollback keeps before evicting the oldest.
/// - `max_message_len`: upper bound, in bytes, of a single rendered message.
/// - `enable_shell`: whether the `sh` command is registered at all.
/// - `shell_program`: the shell `sh` pipes its argument to.
/// - `shell_timeout`: optional limit after which a running `sh` child is killed.
/// - `prompt`: the prompt shown by the interactive loop.
///
/// Fields are public and the struct is plain data; build it with struct update
/// syntax on top of [`ConsoleConfig::default`].
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Number of entries retained by the scrollback buffer.
    pub log_capacity: usize,
    /// Maximum length of a message in bytes; longer messages are truncated.
    pub max_message_len: usize,
    /// Register the `sh` command.
    pub enable_shell: bool,
    /// Program and leading arguments used to run a shell command line.
    pub shell_program: Vec<String>,
    /// Kill `sh` children that run for longer than this.
    pub shell_timeout: Option<Duration>,
    /// Prompt string for the interactive loop.
    pub prompt: String,
}

impl ConsoleConfig {
    pub const DEFAULT_LOG_CAPACITY: usize = 512;
    pub const DEFAULT_MAX_MESSAGE_LEN: usize = 1024;
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            log_capacity: Self::DEFAULT_LOG_CAPACITY,
            max_message_len: Self::DEFAULT_MAX_MESSAGE_LEN,
            enable_shell: cfg!(not(target_family = "wasm")),
            shell_program: default_shell_program(),
            shell_timeout: None,
            prompt: "> ".to_string(),
        }
    }
}

#[cfg(windows)]
fn default_shell_program() -> Vec<String> {
    vec!["cmd".to_string(), "/C".to_string()]
}

#[cfg(not(windows))]
fn default_shell_program() -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();
        assert_eq!(config.log_capacity, 512);
        assert_eq!(config.max_message_len, 1024);
        assert!(config.shell_timeout.is_none());
        assert!(!config.shell_program.is_empty());
    }
}
