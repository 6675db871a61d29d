use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::console::{
    HistoryMode, TimeMode, TokenizerRules, WrapperKind, WrapperPair, DEFAULT_MAX_HISTORY_LINES,
    DEFAULT_MAX_INPUT_LINE_CHARS, DEFAULT_MAX_OUTPUT_LINES, DEFAULT_QUOTE_CHARS,
    DEFAULT_WRAPPER_PAIRS,
};

pub const CONFIG_ENV_VAR: &str = "DEVCONSOLE_CONFIG";
pub const DEFAULT_ALL_KEYWORD: &str = ">all";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}': {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("failed to read env var {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
}

/// Console settings; every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsoleConfig {
    pub quote_chars: Vec<char>,
    pub wrapper_pairs: Vec<WrapperPair>,
    pub history_mode: HistoryMode,
    pub max_history_lines: usize,
    pub max_output_lines: usize,
    pub show_timestamps: bool,
    pub timed_command_time_mode: TimeMode,
    pub suggestion_scroll_debounce_secs: f64,
    pub suggestion_complete_debounce_secs: f64,
    pub suggestion_seed: Option<u64>,
    pub all_keyword: String,
    pub max_input_line_chars: usize,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            quote_chars: DEFAULT_QUOTE_CHARS.to_vec(),
            wrapper_pairs: DEFAULT_WRAPPER_PAIRS.to_vec(),
            history_mode: HistoryMode::default(),
            max_history_lines: DEFAULT_MAX_HISTORY_LINES,
            max_output_lines: DEFAULT_MAX_OUTPUT_LINES,
            show_timestamps: true,
            timed_command_time_mode: TimeMode::default(),
            suggestion_scroll_debounce_secs: 0.2,
            suggestion_complete_debounce_secs: 0.2,
            suggestion_seed: None,
            all_keyword: DEFAULT_ALL_KEYWORD.to_string(),
            max_input_line_chars: DEFAULT_MAX_INPUT_LINE_CHARS,
        }
    }
}

impl ConsoleConfig {
    pub fn tokenizer_rules(&self) -> TokenizerRules {
        TokenizerRules {
            quote_chars: self.quote_chars.clone(),
            wrapper_pairs: self.wrapper_pairs.clone(),
        }
    }

    /// Parses JSON, reporting the failing field path (`wrapper_pairs[1].kind`).
    pub fn from_json_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = match serde_path_to_error::deserialize::<_, ConsoleConfig>(&mut deserializer) {
            Ok(config) => config,
            Err(error) => {
                let path = error.path().to_string();
                let source = error.into_inner();
                let message = if path.is_empty() || path == "." {
                    source.to_string()
                } else {
                    format!("at {path}: {source}")
                };
                return Err(ConfigError::Parse {
                    path: origin.to_path_buf(),
                    message,
                });
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw, path)
    }

    /// Loads the file named by `DEVCONSOLE_CONFIG`, or defaults when unset.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(value) if value.trim().is_empty() => {
                warn!(env_var = CONFIG_ENV_VAR, "empty config env var; using defaults");
                Ok(Self::default())
            }
            Ok(value) => {
                let path = PathBuf::from(value);
                let config = Self::load(&path)?;
                info!(path = %path.display(), "console_config_loaded");
                Ok(config)
            }
            Err(env::VarError::NotPresent) => Ok(Self::default()),
            Err(source) => Err(ConfigError::EnvVar {
                var: CONFIG_ENV_VAR,
                source,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_lines == 0 {
            return Err(invalid("max_history_lines", "must be at least 1"));
        }
        if self.max_output_lines == 0 {
            return Err(invalid("max_output_lines", "must be at least 1"));
        }
        if self.max_input_line_chars == 0 {
            return Err(invalid("max_input_line_chars", "must be at least 1"));
        }
        for (field, value) in [
            ("suggestion_scroll_debounce_secs", self.suggestion_scroll_debounce_secs),
            ("suggestion_complete_debounce_secs", self.suggestion_complete_debounce_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(field, format!("expected a non-negative number, got {value}")));
            }
        }
        if self.all_keyword.trim().is_empty() || self.all_keyword.chars().any(char::is_whitespace) {
            return Err(invalid("all_keyword", "must be a single non-empty word"));
        }
        if let Some(quote) = self.quote_chars.iter().find(|ch| ch.is_whitespace()) {
            return Err(invalid("quote_chars", format!("whitespace is not a quote: {quote:?}")));
        }

        let mut openers = Vec::new();
        for pair in &self.wrapper_pairs {
            if pair.open == pair.close {
                return Err(invalid(
                    "wrapper_pairs",
                    format!("opener and closer must differ: {:?}", pair.open),
                ));
            }
            if self.quote_chars.contains(&pair.open) || self.quote_chars.contains(&pair.close) {
                return Err(invalid(
                    "wrapper_pairs",
                    format!("{}{} overlaps a quote character", pair.open, pair.close),
                ));
            }
            if openers.contains(&pair.open) {
                return Err(invalid(
                    "wrapper_pairs",
                    format!("duplicate opener {:?}", pair.open),
                ));
            }
            openers.push(pair.open);
        }
        if !self
            .wrapper_pairs
            .iter()
            .any(|pair| pair.kind == WrapperKind::Command)
        {
            return Err(invalid(
                "wrapper_pairs",
                "at least one command wrapper is required",
            ));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}
