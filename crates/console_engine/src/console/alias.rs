use std::borrow::Cow;

use thiserror::Error;

use super::registry::CommandRegistry;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AliasError {
    #[error("Alias can't be empty")]
    EmptyKey,
    #[error("Alias can't contain spaces")]
    ContainsWhitespace,
    #[error("Alias can't be the same as any of the command ids")]
    CollidesWithCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub key: String,
    pub expansion: String,
}

/// User-defined shorthands, kept in the order they were first defined.
#[derive(Debug, Default, Clone)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `key -> expansion`, replacing an existing expansion for `key`.
    pub fn set_alias(
        &mut self,
        key: &str,
        expansion: &str,
        registry: &CommandRegistry,
    ) -> Result<(), AliasError> {
        if key.is_empty() {
            return Err(AliasError::EmptyKey);
        }
        if key.chars().any(char::is_whitespace) {
            return Err(AliasError::ContainsWhitespace);
        }
        if registry.contains(key) {
            return Err(AliasError::CollidesWithCommand);
        }

        let expansion = expansion.trim().to_string();
        match self.entries.iter_mut().find(|entry| entry.key == key) {
            Some(entry) => entry.expansion = expansion,
            None => self.entries.push(AliasEntry {
                key: key.to_string(),
                expansion,
            }),
        }
        Ok(())
    }

    pub fn remove_alias(&mut self, key: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.key != key);
        self.entries.len() != before
    }

    pub fn remove_all(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.expansion.as_str())
    }

    /// Replaces the line only when the whole line is an alias key.
    pub fn expand<'a>(&self, line: &'a str) -> Cow<'a, str> {
        match self.get(line) {
            Some(expansion) => Cow::Owned(expansion.to_string()),
            None => Cow::Borrowed(line),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AliasEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
