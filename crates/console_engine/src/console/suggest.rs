use std::collections::HashMap;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use super::alias::AliasTable;
use super::history::{clamp_cursor, InputHistory};
use super::registry::CommandRegistry;
use super::tokenizer::first_word;

/// Fixed seed for reproducible picks, OS entropy otherwise.
pub(crate) fn seeded_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    }
}

/// Completion candidates for the line being typed.
///
/// A typing session lasts until the input is empty again. Within it, the
/// suggestion first offered for a command is remembered and offered again,
/// so randomly picked examples do not change under the user's cursor.
#[derive(Debug)]
pub struct SuggestionEngine {
    session: HashMap<String, String>,
    candidates: Vec<String>,
    selected: isize,
    last_input: String,
    history_cursor: isize,
    rng: SmallRng,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SuggestionEngine {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = seeded_rng(seed);
        Self {
            session: HashMap::new(),
            candidates: Vec::new(),
            selected: 0,
            last_input: String::new(),
            history_cursor: 0,
            rng,
        }
    }

    /// Alias keys first, then one suggestion per command, both matched as a
    /// case-insensitive prefix of `input`. Duplicates are dropped.
    pub fn suggestions_for(
        &mut self,
        input: &str,
        registry: &CommandRegistry,
        aliases: &AliasTable,
    ) -> &[String] {
        if input != self.last_input {
            self.selected = 0;
            self.last_input = input.to_string();
        }

        self.candidates.clear();
        if input.is_empty() {
            self.session.clear();
            return &self.candidates;
        }

        let typed = input.to_lowercase();
        for key in aliases.keys() {
            if key.to_lowercase().starts_with(&typed) {
                push_unique(&mut self.candidates, key.to_string());
            }
        }

        for command in registry.iter() {
            let suggestion = match self.session.get(command.id()) {
                Some(shown) => shown.clone(),
                None => command.input_suggestion(registry, &mut self.rng),
            };
            if suggestion.to_lowercase().starts_with(&typed) {
                self.session
                    .insert(command.id().to_string(), suggestion.clone());
                push_unique(&mut self.candidates, suggestion);
            }
        }

        &self.candidates
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Selected candidate, hidden once the input already equals a candidate.
    pub fn current(&self, input: &str) -> Option<&str> {
        if self.candidates.iter().any(|candidate| candidate == input) {
            return None;
        }
        let mut index = self.selected;
        let position = clamp_cursor(self.candidates.len(), &mut index, false)?;
        self.candidates.get(position).map(String::as_str)
    }

    /// The not-yet-typed tail of the current suggestion.
    pub fn ghost_text<'a>(&'a self, input: &str) -> Option<&'a str> {
        let suggestion = self.current(input)?;
        let tail = remove_typed_prefix(suggestion, input);
        (!tail.is_empty()).then_some(tail)
    }

    pub fn select_next(&mut self) {
        self.selected += 1;
        clamp_cursor(self.candidates.len(), &mut self.selected, false);
    }

    pub fn select_previous(&mut self) {
        self.selected -= 1;
        clamp_cursor(self.candidates.len(), &mut self.selected, false);
    }

    pub fn reset_selection(&mut self) {
        self.selected = 0;
    }

    pub fn selected_index(&self) -> isize {
        self.selected
    }

    /// Steps back through the history. From the "before first" sentinel it
    /// wraps to the newest entry.
    pub fn history_previous(&mut self, history: &InputHistory) -> Option<String> {
        if history.is_empty() {
            return None;
        }
        if self.history_cursor == -1 {
            self.history_cursor = history.len() as isize;
        }
        self.history_cursor -= 1;
        history
            .closest_at(&mut self.history_cursor, true)
            .map(str::to_string)
    }

    /// Steps forward through the history. From the "past last" sentinel it
    /// wraps to the oldest entry.
    pub fn history_next(&mut self, history: &InputHistory) -> Option<String> {
        if history.is_empty() {
            return None;
        }
        if self.history_cursor == history.len() as isize {
            self.history_cursor = -1;
        }
        self.history_cursor += 1;
        history
            .closest_at(&mut self.history_cursor, true)
            .map(str::to_string)
    }

    pub fn history_suggestion<'h>(&self, history: &'h InputHistory) -> Option<&'h str> {
        let mut index = self.history_cursor;
        history.closest_at(&mut index, true)
    }

    /// Parks the history cursor past the newest entry.
    pub fn reset_history_cursor(&mut self, history: &InputHistory) {
        self.history_cursor = history.len() as isize;
    }

    pub fn history_cursor(&self) -> isize {
        self.history_cursor
    }
}

/// Tab completion: the first word of the suggestion, or the full suggestion
/// once the input already equals that first word.
pub fn complete_suggestion(input: &str, suggestion: &str) -> String {
    let first = first_word(suggestion);
    if input.to_lowercase() == first.to_lowercase() {
        suggestion.to_string()
    } else {
        first.to_string()
    }
}

fn remove_typed_prefix<'a>(suggestion: &'a str, input: &str) -> &'a str {
    let typed_chars = input.chars().count();
    match suggestion.char_indices().nth(typed_chars) {
        Some((offset, _)) => &suggestion[offset..],
        None => "",
    }
}

fn push_unique(candidates: &mut Vec<String>, value: String) {
    if !candidates.contains(&value) {
        candidates.push(value);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::console::command::CommandDescriptor;
    use crate::console::history::HistoryMode;

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandDescriptor::nullary("help", "", "help", |_| Ok(())))
            .expect("help");
        registry
            .register(
                CommandDescriptor::unary("help_of", "", "help_of <command id>", |_, _| Ok(()))
                    .with_examples(["help_of \"clear\"", "help_of \"print\""]),
            )
            .expect("help_of");
        registry
            .register(CommandDescriptor::nullary("clear", "", "clear", |_| Ok(())))
            .expect("clear");
        registry
    }

    #[test]
    fn aliases_come_first_and_match_case_insensitively() {
        let registry = registry();
        let mut aliases = AliasTable::new();
        aliases.set_alias("Hx", "help", &registry).expect("alias");
        let mut engine = SuggestionEngine::new(Some(1));

        let candidates = engine.suggestions_for("h", &registry, &aliases).to_vec();
        assert_eq!(candidates[0], "Hx");
        assert_eq!(candidates[1], "help");
        assert!(candidates[2].starts_with("help_of \""));
        assert_eq!(candidates.len(), 3);

        assert!(engine.suggestions_for("CL", &registry, &aliases).iter().eq(["clear"]));
    }

    #[test]
    fn shown_suggestion_is_reused_until_input_empties() {
        let rolls = Arc::new(AtomicUsize::new(0));
        let counter = rolls.clone();
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::nullary("hello", "", "hello", |_| Ok(())).with_input_suggestion(
                    move |_, _| format!("hello {}", counter.fetch_add(1, Ordering::SeqCst)),
                ),
            )
            .expect("hello");
        let aliases = AliasTable::new();
        let mut engine = SuggestionEngine::new(Some(3));

        let first = engine.suggestions_for("he", &registry, &aliases).to_vec();
        let narrowed = engine.suggestions_for("hel", &registry, &aliases).to_vec();
        let widened = engine.suggestions_for("he", &registry, &aliases).to_vec();
        assert_eq!(first, vec!["hello 0"]);
        assert_eq!(narrowed, first);
        assert_eq!(widened, first);

        assert!(engine.suggestions_for("", &registry, &aliases).is_empty());
        assert_eq!(
            engine.suggestions_for("he", &registry, &aliases).to_vec(),
            vec!["hello 1"]
        );
    }

    #[test]
    fn selection_clamps_and_resets_on_input_change() {
        let registry = registry();
        let aliases = AliasTable::new();
        let mut engine = SuggestionEngine::new(Some(5));
        engine.suggestions_for("h", &registry, &aliases);

        engine.select_previous();
        assert_eq!(engine.selected_index(), 0);
        engine.select_next();
        engine.select_next();
        engine.select_next();
        assert_eq!(engine.selected_index(), 1);
        assert!(engine.current("h").expect("selected").starts_with("help_of"));

        engine.suggestions_for("he", &registry, &aliases);
        assert_eq!(engine.selected_index(), 0);
        assert_eq!(engine.current("he"), Some("help"));
    }

    #[test]
    fn exact_match_hides_suggestions() {
        let registry = registry();
        let aliases = AliasTable::new();
        let mut engine = SuggestionEngine::new(Some(5));
        engine.suggestions_for("help", &registry, &aliases);
        assert_eq!(engine.current("help"), None);
        assert_eq!(engine.ghost_text("help"), None);
    }

    #[test]
    fn ghost_text_is_the_untyped_tail() {
        let registry = registry();
        let aliases = AliasTable::new();
        let mut engine = SuggestionEngine::new(Some(5));
        engine.suggestions_for("CLE", &registry, &aliases);
        assert_eq!(engine.ghost_text("CLE"), Some("ar"));
    }

    #[test]
    fn tab_fills_first_word_then_full_suggestion() {
        let suggestion = "help_of \"clear\"";
        assert_eq!(complete_suggestion("he", suggestion), "help_of");
        assert_eq!(complete_suggestion("HELP_OF", suggestion), suggestion);
        assert_eq!(complete_suggestion("cl", "clear"), "clear");
    }

    #[test]
    fn history_walk_uses_sentinels() {
        let mut history = InputHistory::new(HistoryMode::Unique, 8);
        for line in ["a", "b", "c"] {
            history.record(line);
        }
        let mut engine = SuggestionEngine::new(Some(1));
        engine.reset_history_cursor(&history);

        assert_eq!(engine.history_previous(&history).as_deref(), Some("c"));
        assert_eq!(engine.history_previous(&history).as_deref(), Some("b"));
        assert_eq!(engine.history_previous(&history).as_deref(), Some("a"));
        assert_eq!(engine.history_previous(&history), None);
        assert_eq!(engine.history_cursor(), -1);
        assert_eq!(engine.history_previous(&history).as_deref(), Some("c"));

        assert_eq!(engine.history_next(&history), None);
        assert_eq!(engine.history_cursor(), 3);
        assert_eq!(engine.history_next(&history).as_deref(), Some("a"));
        assert_eq!(engine.history_suggestion(&history), Some("a"));
    }

    #[test]
    fn empty_history_never_suggests() {
        let history = InputHistory::default();
        let mut engine = SuggestionEngine::new(Some(1));
        assert_eq!(engine.history_previous(&history), None);
        assert_eq!(engine.history_next(&history), None);
    }
}
