use std::fmt;

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use thiserror::Error;

use super::alias::AliasError;
use super::engine::CommandContext;
use super::registry::CommandRegistry;
use super::scheduler::ScheduleError;

pub type CommandResult = Result<(), CommandError>;

type NullaryFn = dyn Fn(&mut CommandContext<'_>) -> CommandResult + Send + Sync;
type UnaryFn = dyn Fn(&mut CommandContext<'_>, &str) -> CommandResult + Send + Sync;
type BinaryFn = dyn Fn(&mut CommandContext<'_>, &str, &str) -> CommandResult + Send + Sync;
type TernaryFn = dyn Fn(&mut CommandContext<'_>, &str, &str, &str) -> CommandResult + Send + Sync;
type SuggestFn = dyn Fn(&CommandRegistry, &mut SmallRng) -> String + Send + Sync;

/// Failures reported by a command body.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("{thing} \"{name}\" not found")]
    TargetNotFound { thing: &'static str, name: String },
    #[error("{thing} \"{name}\" is not the correct type")]
    IncorrectArgumentType { thing: &'static str, name: String },
    #[error(transparent)]
    AliasRejected(#[from] AliasError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error("Incorrect usage of the command \"{0}\" (use \"help_of {0}\" to get details about the command)")]
    IncorrectUsage(String),
    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DispatchError {
    #[error("nothing to dispatch")]
    EmptyInput,
    #[error("Unknown command \"{0}\"")]
    UnknownCommand(String),
    #[error("Incorrect usage of the command \"{id}\" (use \"help_of {id}\" to get details about the command)")]
    WrongArity {
        id: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Command(#[from] CommandError),
}

pub enum CommandAction {
    Nullary(Box<NullaryFn>),
    Unary(Box<UnaryFn>),
    Binary(Box<BinaryFn>),
    Ternary(Box<TernaryFn>),
}

impl CommandAction {
    pub fn arity(&self) -> usize {
        match self {
            Self::Nullary(_) => 0,
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
            Self::Ternary(_) => 3,
        }
    }
}

impl fmt::Debug for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandAction(arity = {})", self.arity())
    }
}

pub struct CommandDescriptor {
    id: String,
    description: String,
    format: String,
    examples: Vec<String>,
    action: CommandAction,
    input_suggestion: Option<Box<SuggestFn>>,
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("format", &self.format)
            .field("examples", &self.examples)
            .field("action", &self.action)
            .field("custom_suggestion", &self.input_suggestion.is_some())
            .finish()
    }
}

impl CommandDescriptor {
    fn with_action(
        id: impl Into<String>,
        description: impl Into<String>,
        format: impl Into<String>,
        action: CommandAction,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            format: format.into(),
            examples: Vec::new(),
            action,
            input_suggestion: None,
        }
    }

    pub fn nullary<F>(
        id: impl Into<String>,
        description: impl Into<String>,
        format: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: Fn(&mut CommandContext<'_>) -> CommandResult + Send + Sync + 'static,
    {
        Self::with_action(id, description, format, CommandAction::Nullary(Box::new(action)))
    }

    pub fn unary<F>(
        id: impl Into<String>,
        description: impl Into<String>,
        format: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &str) -> CommandResult + Send + Sync + 'static,
    {
        Self::with_action(id, description, format, CommandAction::Unary(Box::new(action)))
    }

    pub fn binary<F>(
        id: impl Into<String>,
        description: impl Into<String>,
        format: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &str, &str) -> CommandResult + Send + Sync + 'static,
    {
        Self::with_action(id, description, format, CommandAction::Binary(Box::new(action)))
    }

    pub fn ternary<F>(
        id: impl Into<String>,
        description: impl Into<String>,
        format: impl Into<String>,
        action: F,
    ) -> Self
    where
        F: Fn(&mut CommandContext<'_>, &str, &str, &str) -> CommandResult + Send + Sync + 'static,
    {
        Self::with_action(id, description, format, CommandAction::Ternary(Box::new(action)))
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_input_suggestion<F>(mut self, suggest: F) -> Self
    where
        F: Fn(&CommandRegistry, &mut SmallRng) -> String + Send + Sync + 'static,
    {
        self.input_suggestion = Some(Box::new(suggest));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// One of the examples picked at random, `None` when there are none.
    pub fn random_example(&self, rng: &mut SmallRng) -> Option<&str> {
        self.examples.choose(rng).map(String::as_str)
    }

    pub fn arity(&self) -> usize {
        self.action.arity()
    }

    /// Runs the bound action with `args` bound positionally. A count that
    /// does not match the arity is rejected before the action is touched.
    pub fn invoke(&self, ctx: &mut CommandContext<'_>, args: &[String]) -> Result<(), DispatchError> {
        match (&self.action, args) {
            (CommandAction::Nullary(action), []) => action(ctx)?,
            (CommandAction::Unary(action), [first]) => action(ctx, first.as_str())?,
            (CommandAction::Binary(action), [first, second]) => {
                action(ctx, first.as_str(), second.as_str())?
            }
            (CommandAction::Ternary(action), [first, second, third]) => {
                action(ctx, first.as_str(), second.as_str(), third.as_str())?
            }
            _ => {
                return Err(DispatchError::WrongArity {
                    id: self.id.clone(),
                    expected: self.arity(),
                    actual: args.len(),
                })
            }
        }
        Ok(())
    }

    /// Text offered to the user while typing this command.
    pub fn input_suggestion(&self, registry: &CommandRegistry, rng: &mut SmallRng) -> String {
        if let Some(suggest) = &self.input_suggestion {
            return suggest(registry, rng);
        }
        match self.examples.choose(rng) {
            Some(example) => example.clone(),
            None => self.format.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use rand::SeedableRng;

    use super::*;
    use crate::console::engine::ConsoleEngine;
    use crate::console::output::OutputKind;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn arity_follows_the_action_tag() {
        let nullary = CommandDescriptor::nullary("a", "", "a", |_| Ok(()));
        let ternary = CommandDescriptor::ternary("b", "", "b x y z", |_, _, _, _| Ok(()));
        assert_eq!(nullary.arity(), 0);
        assert_eq!(ternary.arity(), 3);
    }

    #[test]
    fn wrong_arity_never_invokes_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let descriptor = CommandDescriptor::binary("pair", "", "pair a b", move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let mut engine = ConsoleEngine::default();
        engine.with_context(|ctx| {
            let error = descriptor
                .invoke(ctx, &args(&["only"]))
                .expect_err("one argument for a binary command");
            assert_eq!(
                error,
                DispatchError::WrongArity {
                    id: "pair".to_string(),
                    expected: 2,
                    actual: 1,
                }
            );
            descriptor
                .invoke(ctx, &args(&["a", "b"]))
                .expect("two arguments");
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arguments_bind_positionally() {
        let descriptor = CommandDescriptor::ternary("join", "", "join a b c", |ctx, a, b, c| {
            ctx.print(format!("{a}|{b}|{c}"), OutputKind::Information);
            Ok(())
        });
        let mut engine = ConsoleEngine::default();
        engine.with_context(|ctx| {
            descriptor
                .invoke(ctx, &args(&["x", "y", "z"]))
                .expect("three arguments");
        });
        assert_eq!(engine.output().last().map(|l| l.text.as_str()), Some("x|y|z"));
    }

    #[test]
    fn command_errors_convert_into_dispatch_errors() {
        let descriptor = CommandDescriptor::unary("find", "", "find name", |_, name| {
            Err(CommandError::TargetNotFound {
                thing: "Object",
                name: name.to_string(),
            })
        });
        let mut engine = ConsoleEngine::default();
        let error = engine.with_context(|ctx| descriptor.invoke(ctx, &args(&["cube"])));
        assert_eq!(
            error.expect_err("body fails").to_string(),
            "Object \"cube\" not found"
        );
    }

    #[test]
    fn input_suggestion_prefers_custom_then_examples_then_format() {
        let registry = CommandRegistry::new();
        let mut rng = SmallRng::seed_from_u64(7);

        let plain = CommandDescriptor::nullary("plain", "", "plain", |_| Ok(()));
        assert_eq!(plain.input_suggestion(&registry, &mut rng), "plain");

        let with_examples = CommandDescriptor::unary("print", "", "print text", |_, _| Ok(()))
            .with_examples(["print a", "print b"]);
        let picked = with_examples.input_suggestion(&registry, &mut rng);
        assert!(picked == "print a" || picked == "print b");

        let custom = with_examples.with_input_suggestion(|_, _| "print custom".to_string());
        assert_eq!(custom.input_suggestion(&registry, &mut rng), "print custom");
    }

    #[test]
    fn wrong_arity_message_points_at_help_of() {
        let error = DispatchError::WrongArity {
            id: "print".to_string(),
            expected: 1,
            actual: 0,
        };
        assert_eq!(
            error.to_string(),
            "Incorrect usage of the command \"print\" (use \"help_of print\" to get details about the command)"
        );
    }
}
