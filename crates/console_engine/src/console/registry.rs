use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use super::command::CommandDescriptor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command id cannot be empty")]
    EmptyCommandId,
    #[error("command id cannot contain whitespace: {0:?}")]
    WhitespaceInCommandId(String),
    #[error("duplicate command registration: {0}")]
    DuplicateCommandId(String),
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<Arc<CommandDescriptor>>,
    lookup_by_id: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        let id = descriptor.id();
        if id.is_empty() {
            return Err(RegistryError::EmptyCommandId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(RegistryError::WhitespaceInCommandId(id.to_string()));
        }
        if self.lookup_by_id.contains_key(id) {
            return Err(RegistryError::DuplicateCommandId(id.to_string()));
        }

        self.lookup_by_id
            .insert(id.to_string(), self.commands.len());
        self.commands.push(Arc::new(descriptor));
        Ok(())
    }

    /// Exact, case-sensitive lookup.
    pub fn find_by_id(&self, id: &str) -> Option<&Arc<CommandDescriptor>> {
        let index = self.lookup_by_id.get(id)?;
        self.commands.get(*index)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup_by_id.contains_key(id)
    }

    /// Registration order, which is also the listing order of `help`.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<CommandDescriptor>> {
        self.commands.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|command| command.id())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(id: &str) -> CommandDescriptor {
        CommandDescriptor::nullary(id, "test command", id, |_| Ok(()))
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("help")).expect("register help");

        assert_eq!(registry.find_by_id("help").map(|c| c.id()), Some("help"));
        assert!(registry.find_by_id("HELP").is_none());
        assert!(registry.find_by_id("hel").is_none());
    }

    #[test]
    fn duplicate_id_is_rejected_and_first_registration_kept() {
        let mut registry = CommandRegistry::new();
        registry.register(noop("quit")).expect("first");
        let error = registry.register(noop("quit")).expect_err("duplicate");

        assert_eq!(error, RegistryError::DuplicateCommandId("quit".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn malformed_ids_are_rejected() {
        let mut registry = CommandRegistry::new();
        assert_eq!(registry.register(noop("")), Err(RegistryError::EmptyCommandId));
        assert!(matches!(
            registry.register(noop("two words")),
            Err(RegistryError::WhitespaceInCommandId(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn iteration_follows_registration_order() {
        let mut registry = CommandRegistry::new();
        for id in ["zeta", "alpha", "mid"] {
            registry.register(noop(id)).expect("register");
        }
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
    }
}
