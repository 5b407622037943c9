//! `{$$name}` variable interpolation.
//!
//! Tokens are `{$$` + one or more characters other than `}` + `}`. The name
//! is trimmed of surrounding whitespace. Interpolation works on raw text and
//! is independent of markup tags.

use crate::schema::state::GameState;

/// Written in place of a token whose variable has no value.
pub const VALUE_NOT_FOUND: &str = "VALUE_NOT_FOUND";

const TOKEN_OPEN: &str = "{$$";

/// A variable token located in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token<'a> {
    /// Byte range of the whole token, braces included.
    start: usize,
    end: usize,
    name: &'a str,
}

/// Scan `text` for tokens, left to right, without overlap.
fn tokens(text: &str) -> Vec<Token<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find(TOKEN_OPEN) {
        let start = cursor + offset;
        let name_start = start + TOKEN_OPEN.len();
        match text[name_start..].find('}') {
            // `{$$}` has an empty name and is not a token
            Some(0) => cursor = start + 1,
            Some(len) => {
                let end = name_start + len + 1;
                found.push(Token {
                    start,
                    end,
                    name: text[name_start..name_start + len].trim(),
                });
                cursor = end;
            }
            None => break,
        }
    }

    found
}

/// Variable names in first-seen order, duplicates kept.
pub fn extract_variables(text: &str) -> Vec<String> {
    tokens(text)
        .into_iter()
        .map(|token| token.name.to_string())
        .collect()
}

/// Replace every token with the decimal value of its variable, or with
/// [`VALUE_NOT_FOUND`] when the state holds no value for it.
pub fn substitute(text: &str, state: &GameState) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for token in tokens(text) {
        out.push_str(&text[last..token.start]);
        match state.value(token.name) {
            Some(value) => out.push_str(&value.to_string()),
            None => out.push_str(VALUE_NOT_FOUND),
        }
        last = token.end;
    }

    out.push_str(&text[last..]);
    out
}
