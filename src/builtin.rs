use crate::command::{Arity, Command, CommandContext, CommandEntry};
use crate::config::ConsoleConfig;
use crate::error::Result as ConsoleResult;
use crate::registry::CommandRegistry;
use crate::rpn;
use anyhow::Result;

const HELP_BANNER: &str = "******************** HELP ********************";
const HELP_SEPARATOR: &str = "----------------------------------------------";

/// Commands shipped with the console and known at compile time.
pub(crate) trait BuiltinCommand: Default + 'static {
    /// Canonical name of the command, e.g. "echo" or "calc".
    fn name() -> &'static str;

    fn arity() -> Arity;

    /// One-line description shown by `help`.
    fn help() -> &'static str;

    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()>;
}

/// Adapts a [`BuiltinCommand`] to the object-safe [`Command`] trait.
struct Builtin<T>(T);

impl<T: BuiltinCommand> Command for Builtin<T> {
    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        self.0.execute(args, ctx)
    }
}

pub(crate) fn entry<T: BuiltinCommand>() -> CommandEntry {
    CommandEntry::new(
        T::name(),
        T::arity(),
        T::help(),
        Box::new(Builtin(T::default())),
    )
}

/// Register the default command set in order: `echo`, `clear`, `help`, `calc`, and
/// `sh` when the platform can spawn processes and the config allows it.
pub fn register_builtins(
    registry: &mut CommandRegistry,
    config: &ConsoleConfig,
) -> ConsoleResult<()> {
    registry.push_entry(entry::<Echo>())?;
    registry.push_entry(entry::<Clear>())?;
    registry.push_entry(entry::<Help>())?;
    registry.push_entry(entry::<Calc>())?;
    register_shell(registry, config)
}

#[cfg(not(target_family = "wasm"))]
fn register_shell(registry: &mut CommandRegistry, config: &ConsoleConfig) -> ConsoleResult<()> {
    if config.enable_shell {
        registry.push_entry(entry::<crate::shell::Sh>())?;
    }
    Ok(())
}

// No subprocesses in the browser.
#[cfg(target_family = "wasm")]
fn register_shell(_registry: &mut CommandRegistry, _config: &ConsoleConfig) -> ConsoleResult<()> {
    Ok(())
}

/// Log the argument verbatim.
#[derive(Default)]
pub(crate) struct Echo;

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn arity() -> Arity {
        Arity::Exact(1)
    }

    fn help() -> &'static str {
        "Prints a provided message in the console `echo Hello World`"
    }

    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        ctx.log.info(args);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct Clear;

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn arity() -> Arity {
        Arity::Exact(0)
    }

    fn help() -> &'static str {
        "Clears the console buffer"
    }

    fn execute(&self, _args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        ctx.log.clear();
        Ok(())
    }
}

/// List every command, or describe the one named by the argument.
#[derive(Default)]
pub(crate) struct Help;

impl Help {
    fn describe(entry: &CommandEntry, ctx: &CommandContext<'_>) {
        ctx.log
            .info(format!("\t\t`{}`\t\t{}", entry.name(), entry.help()));
        if let Arity::Exact(count @ 1..) = entry.arity() {
            ctx.log.info(format!("\t\ttakes {count} argument(s)"));
        }
    }
}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn help() -> &'static str {
        "Shows the available commands and/or specific one `help <command_name>`"
    }

    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        let wanted = args.trim();
        if !wanted.is_empty() {
            match ctx.registry.find(wanted) {
                Some(entry) => Self::describe(entry, ctx),
                None => ctx.log.warning(format!("help: no command named `{wanted}`")),
            }
            return Ok(());
        }

        ctx.log.info(HELP_BANNER);
        for entry in ctx.registry.list() {
            Self::describe(entry, ctx);
            ctx.log.info(HELP_SEPARATOR);
        }
        Ok(())
    }
}

/// Evaluate a postfix expression and log the result.
#[derive(Default)]
pub(crate) struct Calc;

impl BuiltinCommand for Calc {
    fn name() -> &'static str {
        "calc"
    }

    fn arity() -> Arity {
        Arity::Variadic
    }

    fn help() -> &'static str {
        "Evaluates a mathematical expression `calc 2 2 +`"
    }

    fn execute(&self, args: &str, ctx: &CommandContext<'_>) -> Result<()> {
        let result = rpn::evaluate_or_log(args, ctx.log);
        ctx.log.info(format!("Eval({args}) = {}", fixed_point(result)));
        Ok(())
    }
}

/// Six fractional digits, with non-finite values spelled `inf`, `-inf` and `nan`.
fn fixed_point(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{value:.6}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::tests::pipeline_with_buffer;
    use crate::logging::{LogBuffer, LogPipeline, Severity};
    use std::sync::{Arc, Mutex};

    struct Fixture {
        log: LogPipeline,
        buffer: Arc<Mutex<LogBuffer>>,
        registry: CommandRegistry,
        config: ConsoleConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let (log, buffer) = pipeline_with_buffer(64, 1024);
            let config = ConsoleConfig {
                enable_shell: false,
                ..ConsoleConfig::default()
            };
            let mut registry = CommandRegistry::new();
            register_builtins(&mut registry, &config).unwrap();
            Self {
                log,
                buffer,
                registry,
                config,
            }
        }

        fn run<T: BuiltinCommand>(&self, args: &str) -> Result<()> {
            let ctx = CommandContext {
                log: &self.log,
                registry: &self.registry,
                config: &self.config,
            };
            T::default().execute(args, &ctx)
        }

        fn texts(&self) -> Vec<String> {
            self.buffer
                .lock()
                .unwrap()
                .entries()
                .map(|e| e.text.clone())
                .collect()
        }
    }

    #[test]
    fn test_default_set_order() {
        let fixture = Fixture::new();
        let names: Vec<&str> = fixture
            .registry
            .list()
            .iter()
            .map(CommandEntry::name)
            .collect();
        assert_eq!(names, vec!["echo", "clear", "help", "calc"]);
    }

    #[test]
    fn test_echo_logs_verbatim_at_info() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Echo>("hello   world %s %d")?;

        let buffer = fixture.buffer.lock().unwrap();
        let entry = buffer.last().unwrap();
        assert_eq!(entry.severity, Some(Severity::Info));
        assert_eq!(entry.text, "hello   world %s %d");
        Ok(())
    }

    #[test]
    fn test_clear_empties_scrollback() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Echo>("one")?;
        fixture.run::<Echo>("two")?;
        fixture.run::<Clear>("")?;
        assert!(fixture.texts().is_empty());
        Ok(())
    }

    #[test]
    fn test_calc_logs_result() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Calc>("2 2 +")?;
        assert_eq!(fixture.texts(), vec!["Eval(2 2 +) = 4.000000"]);
        Ok(())
    }

    #[test]
    fn test_calc_reports_error_then_sentinel() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Calc>("2 2")?;
        assert_eq!(
            fixture.texts(),
            vec!["Invalid expression", "Eval(2 2) = 0.000000"]
        );
        Ok(())
    }

    #[test]
    fn test_calc_shows_non_finite_results() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Calc>("1 0 /")?;
        assert_eq!(fixture.texts(), vec!["Eval(1 0 /) = inf"]);
        Ok(())
    }

    #[test]
    fn test_calc_spells_nan_in_lowercase() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Calc>("0 0 /")?;
        fixture.run::<Calc>("-1 0 /")?;
        assert_eq!(
            fixture.texts(),
            vec!["Eval(0 0 /) = nan", "Eval(-1 0 /) = -inf"]
        );
        Ok(())
    }

    #[test]
    fn test_help_lists_everything() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Help>("")?;

        let texts = fixture.texts();
        assert_eq!(texts[0], HELP_BANNER);
        assert_eq!(
            texts[1],
            "\t\t`echo`\t\tPrints a provided message in the console `echo Hello World`"
        );
        assert_eq!(texts[2], "\t\ttakes 1 argument(s)");
        assert_eq!(texts[3], HELP_SEPARATOR);
        // clear takes no argument, so no `takes` line
        assert_eq!(texts[4], "\t\t`clear`\t\tClears the console buffer");
        assert_eq!(texts[5], HELP_SEPARATOR);
        assert_eq!(texts.iter().filter(|t| *t == HELP_SEPARATOR).count(), 4);
        Ok(())
    }

    #[test]
    fn test_help_for_one_command() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Help>("calc")?;
        assert_eq!(
            fixture.texts(),
            vec!["\t\t`calc`\t\tEvaluates a mathematical expression `calc 2 2 +`"]
        );
        Ok(())
    }

    #[test]
    fn test_help_for_unknown_command_warns() -> Result<()> {
        let fixture = Fixture::new();
        fixture.run::<Help>("nope")?;

        let buffer = fixture.buffer.lock().unwrap();
        let entry = buffer.last().unwrap();
        assert_eq!(entry.severity, Some(Severity::Warning));
        assert_eq!(entry.text, "help: no command named `nope`");
        Ok(())
    }
}
