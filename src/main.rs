use argh::FromArgs;
use dev_console::{Console, ConsoleConfig, LogPipeline, TerminalSink, bridge};
use log::LevelFilter;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(FromArgs)]
/// Interactive developer console. Type `help` at the prompt to list the commands.
struct Args {
    #[argh(option, default = "ConsoleConfig::DEFAULT_LOG_CAPACITY")]
    /// number of entries kept in the scrollback
    log_capacity: usize,

    #[argh(switch)]
    /// do not register the `sh` command
    no_shell: bool,

    #[argh(option)]
    /// kill `sh` commands that run longer than this many seconds
    shell_timeout: Option<u64>,

    #[argh(switch, short = 'v')]
    /// also show debug diagnostics in the console
    verbose: bool,

    #[argh(option, short = 'c')]
    /// run this line instead of starting the prompt; may be repeated
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    let defaults = ConsoleConfig::default();
    let config = ConsoleConfig {
        log_capacity: args.log_capacity,
        enable_shell: defaults.enable_shell && !args.no_shell,
        shell_timeout: args.shell_timeout.map(Duration::from_secs),
        ..defaults
    };

    let log = LogPipeline::new(config.max_message_len);
    log.attach(Arc::new(Mutex::new(TerminalSink::stdout(config.log_capacity))));
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    bridge::install(log.clone(), level)?;

    let console = Console::new(config, log)?;

    if !args.command.is_empty() {
        for line in &args.command {
            console.submit_line(line);
        }
        return Ok(());
    }

    console.log().info("Type `help` to list the available commands");
    console.repl()?;
    Ok(())
}
