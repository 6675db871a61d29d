use rand::seq::IndexedRandom;

use super::command::{CommandDescriptor, CommandError, CommandResult};
use super::convert::to_float;
use super::engine::CommandContext;
use super::output::OutputKind;
use super::registry::{CommandRegistry, RegistryError};
use super::scheduler::TimedCommand;
use super::tokenizer::{strip_wrappers, tokenize};

const WALL_TIME_FORMAT: &str = "%H:%M:%S";

/// Registers the engine-independent console commands in listing order.
pub fn register_builtins(registry: &mut CommandRegistry) -> Result<(), RegistryError> {
    for descriptor in builtin_commands() {
        registry.register(descriptor)?;
    }
    Ok(())
}

fn builtin_commands() -> Vec<CommandDescriptor> {
    vec![
        CommandDescriptor::nullary("help", "Show information about all available commands", "help", help)
            .with_examples(["help"]),
        CommandDescriptor::unary(
            "help_of",
            "Show information about a command",
            "help_of <str: commandId>",
            help_of,
        )
        .with_examples(["help_of help"])
        .with_input_suggestion(|registry, rng| {
            let others: Vec<&str> = registry.ids().filter(|id| *id != "help_of").collect();
            match others.choose(rng) {
                Some(id) => format!("help_of \"{id}\""),
                None => "help_of <str: commandId>".to_string(),
            }
        }),
        CommandDescriptor::nullary("clear", "Clear the console", "clear", |ctx| {
            ctx.clear_output();
            Ok(())
        })
        .with_examples(["clear"]),
        CommandDescriptor::unary("print", "Print text to the console", "print <str: text>", |ctx, text| {
            ctx.print(text, OutputKind::Explanation);
            Ok(())
        })
        .with_examples(["print \"Hello world!\""]),
        CommandDescriptor::nullary("quit", "Quit the game", "quit", |ctx| {
            ctx.request_quit();
            Ok(())
        })
        .with_examples(["quit"]),
        CommandDescriptor::nullary("get_command_ids", "Get all command ids", "get_command_ids", |ctx| {
            let registry = ctx.registry();
            for id in registry.ids() {
                ctx.print(id, OutputKind::Explanation);
            }
            Ok(())
        })
        .with_examples(["get_command_ids"]),
        CommandDescriptor::unary(
            "set_timescale",
            "Set the scale at which time passes",
            "set_timescale <flt: timeScale>",
            set_timescale,
        )
        .with_examples(["set_timescale 1"]),
        CommandDescriptor::ternary(
            "set_as_timed",
            "Set a command as an active timed command",
            "set_as_timed <flt: callTime> <flt: stopTime> <cmd: command>",
            set_as_timed,
        )
        .with_examples(["set_as_timed 1 10 { print \"Hello world!\" }"]),
        CommandDescriptor::unary(
            "stop_timed",
            "Stop an active timed command",
            "stop_timed <str: commandId>",
            stop_timed,
        )
        .with_examples(["stop_timed >all"]),
        CommandDescriptor::nullary(
            "get_all_timed",
            "Get all the active timed commands",
            "get_all_timed",
            get_all_timed,
        )
        .with_examples(["get_all_timed"]),
        CommandDescriptor::binary("set_alias", "Set alias", "set_alias <str: alias> <any: content>", set_alias)
            .with_examples(["set_alias \"h\" { help }"]),
        CommandDescriptor::unary("remove_alias", "Remove alias", "remove_alias <str: alias>", remove_alias)
            .with_examples(["remove_alias >all"]),
        CommandDescriptor::nullary("get_all_aliases", "Get all aliases", "get_all_aliases", get_all_aliases)
            .with_examples(["get_all_aliases"]),
    ]
}

fn help(ctx: &mut CommandContext<'_>) -> CommandResult {
    let registry = ctx.registry();
    for command in registry.iter() {
        ctx.print(
            format!("{} - {}", command.format(), command.description()),
            OutputKind::Explanation,
        );
    }
    Ok(())
}

fn help_of(ctx: &mut CommandContext<'_>, command_id: &str) -> CommandResult {
    let Some(command) = ctx.registry().find_by_id(command_id) else {
        return Err(CommandError::TargetNotFound {
            thing: "Command",
            name: command_id.to_string(),
        });
    };

    ctx.print(format!("Id: {}", command.id()), OutputKind::Explanation);
    ctx.print(
        format!("Description: {}", command.description()),
        OutputKind::Explanation,
    );
    ctx.print(format!("Format: {}", command.format()), OutputKind::Explanation);
    let example = command.random_example(ctx.rng()).unwrap_or_default();
    ctx.print(format!("Usage example: {example}"), OutputKind::Explanation);
    Ok(())
}

fn argument(name: &str) -> CommandError {
    CommandError::IncorrectArgumentType {
        thing: "Argument",
        name: name.to_string(),
    }
}

fn set_timescale(ctx: &mut CommandContext<'_>, time_scale: &str) -> CommandResult {
    let scale = to_float("timeScale", time_scale)?;
    if !ctx.clock_mut().set_time_scale(scale) {
        return Err(argument("timeScale"));
    }
    let applied = ctx.clock().time_scale();
    ctx.print(format!("Time scale is now {applied}"), OutputKind::Explanation);
    Ok(())
}

fn set_as_timed(
    ctx: &mut CommandContext<'_>,
    call_time: &str,
    stop_time: &str,
    command: &str,
) -> CommandResult {
    let interval = to_float("callTime", call_time)?;
    let total_duration = to_float("stopTime", stop_time)?;

    let nested = strip_wrappers(command, ctx.tokenizer_rules());
    let tokens = tokenize(&nested, ctx.tokenizer_rules());
    let Some((target_id, arguments)) = tokens.split_first() else {
        return Err(CommandError::IncorrectUsage("set_as_timed".to_string()));
    };

    let Some(target) = ctx.registry().find_by_id(target_id) else {
        return Err(CommandError::TargetNotFound {
            thing: "Command",
            name: target_id.clone(),
        });
    };

    let bound_arguments = match target.arity() {
        0 => Vec::new(),
        arity if arity == arguments.len() => arguments.to_vec(),
        _ => return Err(CommandError::IncorrectUsage(target_id.clone())),
    };

    let timed = TimedCommand::new(target.clone(), interval, total_duration, bound_arguments, 0.0)?;
    if ctx.scheduler_mut().arm(timed) {
        ctx.print(
            format!("Set {target_id} as an active timed command"),
            OutputKind::Explanation,
        );
    } else {
        ctx.print(
            format!("{target_id} is already an active timed command"),
            OutputKind::Warning,
        );
    }
    Ok(())
}

fn stop_timed(ctx: &mut CommandContext<'_>, command_id: &str) -> CommandResult {
    if ctx.is_all_keyword(command_id) {
        if ctx.scheduler_mut().stop_all() == 0 {
            return Err(CommandError::Unavailable(
                "No active timed commands to stop".to_string(),
            ));
        }
        ctx.print("Stopped all the active timed commands", OutputKind::Explanation);
        return Ok(());
    }

    if !ctx.scheduler_mut().stop(command_id) {
        return Err(CommandError::TargetNotFound {
            thing: "Timed command",
            name: command_id.to_string(),
        });
    }
    ctx.print(
        format!("Stopped the active timed command {command_id}"),
        OutputKind::Explanation,
    );
    Ok(())
}

fn get_all_timed(ctx: &mut CommandContext<'_>) -> CommandResult {
    if ctx.scheduler().is_empty() {
        return Err(CommandError::Unavailable(
            "No active timed commands found".to_string(),
        ));
    }

    let lines: Vec<String> = ctx
        .scheduler()
        .iter()
        .enumerate()
        .map(|(index, timed)| {
            let started = timed.created_at().format(WALL_TIME_FORMAT);
            match timed.ends_at() {
                Some(ends) => format!(
                    "{}. {} (started {started}, ends {})",
                    index + 1,
                    timed.id(),
                    ends.format(WALL_TIME_FORMAT)
                ),
                None => format!("{}. {} (started {started}, never ends)", index + 1, timed.id()),
            }
        })
        .collect();
    for line in lines {
        ctx.print(line, OutputKind::Explanation);
    }
    Ok(())
}

fn set_alias(ctx: &mut CommandContext<'_>, alias: &str, content: &str) -> CommandResult {
    let expansion = strip_wrappers(content, ctx.tokenizer_rules());
    let registry = ctx.registry();
    ctx.aliases_mut().set_alias(alias, &expansion, registry)?;
    ctx.print(format!("{alias} -> {{ {expansion} }}"), OutputKind::Explanation);
    Ok(())
}

fn remove_alias(ctx: &mut CommandContext<'_>, alias: &str) -> CommandResult {
    if ctx.is_all_keyword(alias) {
        if ctx.aliases_mut().remove_all() == 0 {
            return Err(CommandError::Unavailable("No aliases to remove".to_string()));
        }
        ctx.print("Removed all aliases", OutputKind::Explanation);
        return Ok(());
    }

    if !ctx.aliases_mut().remove_alias(alias) {
        return Err(CommandError::TargetNotFound {
            thing: "Alias",
            name: alias.to_string(),
        });
    }
    ctx.print(format!("Removed alias {alias}"), OutputKind::Explanation);
    Ok(())
}

fn get_all_aliases(ctx: &mut CommandContext<'_>) -> CommandResult {
    if ctx.aliases().is_empty() {
        return Err(CommandError::Unavailable("No aliases found".to_string()));
    }

    let lines: Vec<String> = ctx
        .aliases()
        .iter()
        .enumerate()
        .map(|(index, entry)| format!("{}. {} -> {{ {} }}", index + 1, entry.key, entry.expansion))
        .collect();
    for line in lines {
        ctx.print(line, OutputKind::Explanation);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::ConsoleConfig;
    use crate::console::engine::{ConsoleEngine, SubmitOutcome};

    fn engine() -> ConsoleEngine {
        let config = ConsoleConfig {
            suggestion_seed: Some(11),
            ..ConsoleConfig::default()
        };
        ConsoleEngine::with_builtins(&config).expect("builtins register once")
    }

    fn run(engine: &mut ConsoleEngine, line: &str) -> Vec<(String, OutputKind)> {
        let before = engine.output().len();
        engine.submit_line(line);
        engine
            .output()
            .lines()
            .skip(before + 1)
            .map(|line| (line.text.clone(), line.kind))
            .collect()
    }

    fn texts(lines: Vec<(String, OutputKind)>) -> Vec<String> {
        lines.into_iter().map(|(text, _)| text).collect()
    }

    #[test]
    fn builtins_register_in_listing_order() {
        let engine = engine();
        assert_eq!(
            engine.registry().ids().collect::<Vec<_>>(),
            vec![
                "help",
                "help_of",
                "clear",
                "print",
                "quit",
                "get_command_ids",
                "set_timescale",
                "set_as_timed",
                "stop_timed",
                "get_all_timed",
                "set_alias",
                "remove_alias",
                "get_all_aliases",
            ]
        );
    }

    #[test]
    fn registering_builtins_twice_fails() {
        let mut registry = CommandRegistry::new();
        register_builtins(&mut registry).expect("first");
        assert_eq!(
            register_builtins(&mut registry),
            Err(RegistryError::DuplicateCommandId("help".to_string()))
        );
    }

    #[test]
    fn help_lists_format_and_description() {
        let mut engine = engine();
        let lines = run(&mut engine, "help");
        assert_eq!(lines.len(), engine.registry().len());
        assert_eq!(
            lines[0],
            (
                "help - Show information about all available commands".to_string(),
                OutputKind::Explanation
            )
        );
        assert_eq!(lines[3].0, "print <str: text> - Print text to the console");
    }

    #[test]
    fn help_of_describes_one_command() {
        let mut engine = engine();
        assert_eq!(
            texts(run(&mut engine, "help_of print")),
            vec![
                "Id: print",
                "Description: Print text to the console",
                "Format: print <str: text>",
                "Usage example: print \"Hello world!\"",
            ]
        );
        assert_eq!(
            run(&mut engine, "help_of nope"),
            vec![("Command \"nope\" not found".to_string(), OutputKind::Error)]
        );
    }

    #[test]
    fn help_of_picks_a_random_usage_example() {
        let mut engine = engine();
        engine
            .register(
                CommandDescriptor::nullary("spawn", "Spawn a crate", "spawn", |_| Ok(()))
                    .with_examples(["spawn", "spawn now"]),
            )
            .expect("spawn registers");
        engine
            .register(CommandDescriptor::nullary("bare", "No examples", "bare", |_| Ok(())))
            .expect("bare registers");

        let mut seen = std::collections::HashSet::new();
        for _ in 0..32 {
            let lines = texts(run(&mut engine, "help_of spawn"));
            let example = lines.last().cloned().unwrap_or_default();
            assert!(example == "Usage example: spawn" || example == "Usage example: spawn now");
            seen.insert(example);
        }
        assert_eq!(seen.len(), 2);

        let bare = texts(run(&mut engine, "help_of bare"));
        assert_eq!(bare.last().map(String::as_str), Some("Usage example: "));
    }

    #[test]
    fn help_of_suggests_another_quoted_command() {
        let engine = engine();
        let help_of = engine.registry().find_by_id("help_of").expect("help_of");
        let mut rng = rand::SeedableRng::seed_from_u64(3);
        let suggestion = help_of.input_suggestion(engine.registry(), &mut rng);
        assert!(suggestion.starts_with("help_of \""));
        assert!(suggestion.ends_with('"'));
        assert_ne!(suggestion, "help_of \"help_of\"");
    }

    #[test]
    fn print_and_clear() {
        let mut engine = engine();
        assert_eq!(texts(run(&mut engine, "print \"Hello world!\"")), vec!["Hello world!"]);
        engine.submit_line("clear");
        assert!(engine.output().is_empty());
    }

    #[test]
    fn quit_sets_the_flag() {
        let mut engine = engine();
        assert!(!engine.quit_requested());
        engine.submit_line("quit");
        assert!(engine.quit_requested());
    }

    #[test]
    fn set_timescale_validates_the_argument() {
        let mut engine = engine();
        assert_eq!(texts(run(&mut engine, "set_timescale 0,5")), vec!["Time scale is now 0.5"]);
        assert_eq!(engine.clock().time_scale(), 0.5);
        assert_eq!(
            texts(run(&mut engine, "set_timescale fast")),
            vec!["Argument \"timeScale\" is not the correct type"]
        );
        assert_eq!(
            texts(run(&mut engine, "set_timescale -1")),
            vec!["Argument \"timeScale\" is not the correct type"]
        );
    }

    #[test]
    fn set_as_timed_arms_and_fires_nested_command() {
        let mut engine = engine();
        assert_eq!(
            texts(run(&mut engine, "set_as_timed 1 10 { print \"hi there\" }")),
            vec!["Set print as an active timed command"]
        );
        assert_eq!(engine.scheduler().len(), 1);
        assert_eq!(
            engine.scheduler().iter().next().map(|t| t.bound_arguments().to_vec()),
            Some(vec!["hi there".to_string()])
        );

        let before = engine.output().len();
        assert_eq!(engine.tick(Duration::from_millis(250)), 1);
        let fired: Vec<&str> = engine.output().texts().skip(before).collect();
        assert_eq!(fired, vec!["hi there", "Timed command print was just invoked"]);
    }

    #[test]
    fn set_as_timed_rejects_bad_input() {
        let mut engine = engine();
        assert_eq!(
            texts(run(&mut engine, "set_as_timed x 10 { help }")),
            vec!["Argument \"callTime\" is not the correct type"]
        );
        assert_eq!(
            texts(run(&mut engine, "set_as_timed 1 10 { nope }")),
            vec!["Command \"nope\" not found"]
        );
        assert_eq!(
            texts(run(&mut engine, "set_as_timed 1 10 { print a b }")),
            vec!["Incorrect usage of the command \"print\" (use \"help_of print\" to get details about the command)"]
        );
        assert_eq!(
            texts(run(&mut engine, "set_as_timed -1 10 { help }")),
            vec!["interval must be greater than or equal to 0 (got -1)"]
        );
        assert!(engine.scheduler().is_empty());
    }

    #[test]
    fn nullary_targets_ignore_extra_arguments_and_duplicates_warn() {
        let mut engine = engine();
        run(&mut engine, "set_as_timed 1 0 { get_command_ids extra }");
        assert_eq!(
            run(&mut engine, "set_as_timed 2 0 { get_command_ids }"),
            vec![(
                "get_command_ids is already an active timed command".to_string(),
                OutputKind::Warning
            )]
        );
        assert_eq!(engine.scheduler().len(), 1);
    }

    #[test]
    fn stop_timed_single_and_all() {
        let mut engine = engine();
        run(&mut engine, "set_as_timed 1 0 { help }");
        run(&mut engine, "set_as_timed 1 0 { clear }");

        assert_eq!(
            texts(run(&mut engine, "stop_timed help")),
            vec!["Stopped the active timed command help"]
        );
        assert_eq!(
            texts(run(&mut engine, "stop_timed help")),
            vec!["Timed command \"help\" not found"]
        );
        assert_eq!(
            texts(run(&mut engine, "stop_timed >ALL")),
            vec!["Stopped all the active timed commands"]
        );
        assert!(engine.scheduler().is_empty());
        assert_eq!(
            run(&mut engine, "stop_timed >all"),
            vec![("No active timed commands to stop".to_string(), OutputKind::Error)]
        );
    }

    #[test]
    fn timed_stop_voids_a_later_firing_in_the_same_tick() {
        let mut engine = engine();
        run(&mut engine, "set_as_timed 1 0 { stop_timed print }");
        run(&mut engine, "set_as_timed 1 0 { print boom }");

        let before = engine.output().len();
        assert_eq!(engine.tick(Duration::from_millis(16)), 1);
        let fired: Vec<&str> = engine.output().texts().skip(before).collect();
        assert_eq!(
            fired,
            vec![
                "Stopped the active timed command print",
                "Timed command stop_timed was just invoked",
            ]
        );
        assert!(!engine.scheduler().is_armed("print"));
    }

    #[test]
    fn get_all_timed_lists_start_and_end() {
        let mut engine = engine();
        assert_eq!(
            texts(run(&mut engine, "get_all_timed")),
            vec!["No active timed commands found"]
        );

        run(&mut engine, "set_as_timed 1 10 { help }");
        run(&mut engine, "set_as_timed 1 0 { clear }");
        let lines = texts(run(&mut engine, "get_all_timed"));
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1. help (started "));
        assert!(lines[0].contains(", ends "));
        assert!(lines[1].starts_with("2. clear (started "));
        assert!(lines[1].ends_with(", never ends)"));
    }

    #[test]
    fn alias_lifecycle() {
        let mut engine = engine();
        assert_eq!(
            texts(run(&mut engine, "set_alias hi { print \"hello there\" }")),
            vec!["hi -> { print \"hello there\" }"]
        );
        assert_eq!(texts(run(&mut engine, "hi")), vec!["hello there"]);
        assert_eq!(
            texts(run(&mut engine, "get_all_aliases")),
            vec!["1. hi -> { print \"hello there\" }"]
        );
        assert_eq!(
            texts(run(&mut engine, "set_alias help { clear }")),
            vec!["Alias can't be the same as any of the command ids"]
        );
        assert_eq!(
            texts(run(&mut engine, "set_alias \"a b\" { clear }")),
            vec!["Alias can't contain spaces"]
        );
        assert_eq!(texts(run(&mut engine, "remove_alias hi")), vec!["Removed alias hi"]);
        assert_eq!(
            texts(run(&mut engine, "remove_alias hi")),
            vec!["Alias \"hi\" not found"]
        );
        assert_eq!(
            texts(run(&mut engine, "remove_alias >all")),
            vec!["No aliases to remove"]
        );
        assert_eq!(
            texts(run(&mut engine, "get_all_aliases")),
            vec!["No aliases found"]
        );
    }

    #[test]
    fn aliased_line_is_recorded_as_typed() {
        let mut engine = engine();
        run(&mut engine, "set_alias ids { get_command_ids }");
        assert_eq!(engine.submit_line("ids"), SubmitOutcome::Dispatched);
        assert_eq!(engine.history().iter().last(), Some("ids"));
    }
}
