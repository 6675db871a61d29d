use serde::{Deserialize, Serialize};

pub const DEFAULT_QUOTE_CHARS: [char; 2] = ['"', '\''];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapperKind {
    /// Keeps a nested command line intact, e.g. `{ print "hi" }`.
    Command,
    /// Keeps a composite value intact, e.g. `(1, 1, 0)`.
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct WrapperPair {
    pub open: char,
    pub close: char,
    pub kind: WrapperKind,
}

impl WrapperPair {
    pub const fn command(open: char, close: char) -> Self {
        Self {
            open,
            close,
            kind: WrapperKind::Command,
        }
    }

    pub const fn object(open: char, close: char) -> Self {
        Self {
            open,
            close,
            kind: WrapperKind::Object,
        }
    }
}

pub const DEFAULT_WRAPPER_PAIRS: [WrapperPair; 2] = [
    WrapperPair::command('{', '}'),
    WrapperPair::object('(', ')'),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerRules {
    pub quote_chars: Vec<char>,
    pub wrapper_pairs: Vec<WrapperPair>,
}

impl Default for TokenizerRules {
    fn default() -> Self {
        Self {
            quote_chars: DEFAULT_QUOTE_CHARS.to_vec(),
            wrapper_pairs: DEFAULT_WRAPPER_PAIRS.to_vec(),
        }
    }
}

impl TokenizerRules {
    fn is_quote(&self, ch: char) -> bool {
        self.quote_chars.contains(&ch)
    }

    fn pair_opened_by(&self, raw: &str) -> Option<WrapperPair> {
        let first = raw.chars().next()?;
        self.wrapper_pairs
            .iter()
            .copied()
            .find(|pair| pair.open == first)
    }
}

/// One whitespace-separated piece of the line. `raw` is the text as typed,
/// `value` has the quote characters of terminated quoted regions removed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Piece {
    raw: String,
    value: String,
}

/// Splits a console line into argument tokens.
///
/// Quoted regions never split and lose their quote characters. A run of
/// pieces opened by a wrapper character is joined back into one token up to
/// the piece that balances it, keeping its inner quoting untouched so the
/// token can be tokenized again later. Regions that never close are left as
/// plain pieces.
pub fn tokenize(line: &str, rules: &TokenizerRules) -> Vec<String> {
    let pieces = split_pieces(line, rules);
    if !pieces
        .iter()
        .any(|piece| rules.pair_opened_by(&piece.raw).is_some())
    {
        return pieces.into_iter().map(|piece| piece.value).collect();
    }

    let mut tokens = Vec::with_capacity(pieces.len());
    let mut index = 0usize;
    while index < pieces.len() {
        let piece = &pieces[index];
        if let Some(pair) = rules.pair_opened_by(&piece.raw) {
            if let Some(last) = find_region_end(&pieces[index..], pair, rules) {
                let joined = pieces[index..=index + last]
                    .iter()
                    .map(|piece| piece.raw.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                tokens.push(match pair.kind {
                    WrapperKind::Command => pad_command_region(&joined, pair),
                    WrapperKind::Object => joined,
                });
                index += last + 1;
                continue;
            }
        }

        tokens.push(piece.value.clone());
        index += 1;
    }
    tokens
}

fn split_pieces(line: &str, rules: &TokenizerRules) -> Vec<Piece> {
    let chars: Vec<char> = line.chars().collect();
    let mut pieces = Vec::new();
    let mut current: Option<Piece> = None;
    let mut index = 0usize;

    while index < chars.len() {
        let ch = chars[index];
        if ch.is_whitespace() {
            if let Some(piece) = current.take() {
                pieces.push(piece);
            }
            index += 1;
            continue;
        }

        let piece = current.get_or_insert_with(Piece::default);
        if rules.is_quote(ch) {
            if let Some(offset) = chars[index + 1..].iter().position(|c| *c == ch) {
                let end = index + 1 + offset;
                let inner = &chars[index + 1..end];
                piece.raw.push(ch);
                piece.raw.extend(inner.iter());
                piece.raw.push(ch);
                piece.value.extend(inner.iter());
                index = end + 1;
                continue;
            }
        }

        piece.raw.push(ch);
        piece.value.push(ch);
        index += 1;
    }

    if let Some(piece) = current {
        pieces.push(piece);
    }
    pieces
}

/// Offset of the piece that brings the wrapper depth back to zero.
fn find_region_end(pieces: &[Piece], pair: WrapperPair, rules: &TokenizerRules) -> Option<usize> {
    let mut depth = 0i32;
    for (offset, piece) in pieces.iter().enumerate() {
        depth += depth_delta(&piece.raw, pair, rules);
        if depth <= 0 {
            return Some(offset);
        }
    }
    None
}

fn depth_delta(raw: &str, pair: WrapperPair, rules: &TokenizerRules) -> i32 {
    let chars: Vec<char> = raw.chars().collect();
    let mut delta = 0i32;
    let mut index = 0usize;
    while index < chars.len() {
        let ch = chars[index];
        if rules.is_quote(ch) {
            if let Some(offset) = chars[index + 1..].iter().position(|c| *c == ch) {
                index += offset + 2;
                continue;
            }
        }
        if ch == pair.open {
            delta += 1;
        } else if ch == pair.close {
            delta -= 1;
        }
        index += 1;
    }
    delta
}

fn pad_command_region(joined: &str, pair: WrapperPair) -> String {
    let Some(inner) = joined
        .strip_prefix(pair.open)
        .and_then(|rest| rest.strip_suffix(pair.close))
    else {
        return joined.to_string();
    };

    let inner = inner.trim();
    if inner.is_empty() {
        format!("{} {}", pair.open, pair.close)
    } else {
        format!("{} {} {}", pair.open, inner, pair.close)
    }
}

/// Removes one outer command wrapper, `{ help }` becomes `help`.
pub fn strip_wrappers(text: &str, rules: &TokenizerRules) -> String {
    let trimmed = text.trim();
    for pair in rules
        .wrapper_pairs
        .iter()
        .filter(|pair| pair.kind == WrapperKind::Command)
    {
        if let Some(inner) = trimmed
            .strip_prefix(pair.open)
            .and_then(|rest| rest.strip_suffix(pair.close))
        {
            return inner.trim().to_string();
        }
    }
    trimmed.to_string()
}

pub fn strip_quotes(text: &str, rules: &TokenizerRules) -> String {
    text.chars().filter(|ch| !rules.is_quote(*ch)).collect()
}

pub fn first_word(text: &str) -> &str {
    text.split_whitespace().next().unwrap_or("")
}
