//! Inline markup: `[b]`, `[i]`, `[s]` and `[color=NAME]` tags.
//!
//! Tags do not nest. An opening tag claims everything up to the next exact
//! occurrence of its closing tag, verbatim. An opening tag that is never
//! closed degrades to plain text together with the rest of the input, so
//! unfinished markup is never lost.

use serde::{Deserialize, Serialize};

/// A styling tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Bold,
    Italic,
    Strikethrough,
    Color(String),
}

impl Tag {
    /// Try to read an opening tag at the start of `input`.
    /// Returns the tag and its length in bytes.
    fn parse_opening(input: &str) -> Option<(Tag, usize)> {
        for (literal, tag) in [("[b]", Tag::Bold), ("[i]", Tag::Italic), ("[s]", Tag::Strikethrough)] {
            if input.starts_with(literal) {
                return Some((tag, literal.len()));
            }
        }

        let rest = input.strip_prefix("[color=")?;
        match rest.find(']') {
            Some(0) | None => None,
            Some(end) => Some((Tag::Color(rest[..end].to_string()), "[color=".len() + end + 1)),
        }
    }

    pub fn opening(&self) -> String {
        match self {
            Tag::Bold => "[b]".to_string(),
            Tag::Italic => "[i]".to_string(),
            Tag::Strikethrough => "[s]".to_string(),
            Tag::Color(name) => format!("[color={}]", name),
        }
    }

    pub fn closing(&self) -> &'static str {
        match self {
            Tag::Bold => "[/b]",
            Tag::Italic => "[/i]",
            Tag::Strikethrough => "[/s]",
            Tag::Color(_) => "[/color]",
        }
    }
}

/// A run of text with uniform styling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub content: String,
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub color: Option<String>,
}

impl Span {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn styled(content: impl Into<String>, tag: &Tag) -> Self {
        let mut span = Self::plain(content);
        match tag {
            Tag::Bold => span.bold = true,
            Tag::Italic => span.italic = true,
            Tag::Strikethrough => span.strikethrough = true,
            Tag::Color(name) => span.color = Some(name.clone()),
        }
        span
    }

    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.strikethrough && self.color.is_none()
    }
}

fn flush(spans: &mut Vec<Span>, pending: &mut String) {
    if !pending.is_empty() {
        spans.push(Span::plain(std::mem::take(pending)));
    }
}

/// Split `text` into styled spans, left to right.
pub fn parse_markup(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut pending = String::new();
    let mut cursor = 0;

    while cursor < text.len() {
        let Some(offset) = text[cursor..].find('[') else {
            pending.push_str(&text[cursor..]);
            break;
        };
        let open_at = cursor + offset;
        pending.push_str(&text[cursor..open_at]);

        let Some((tag, open_len)) = Tag::parse_opening(&text[open_at..]) else {
            // Not an opening tag (stray closer, unknown tag, lone bracket)
            pending.push('[');
            cursor = open_at + 1;
            continue;
        };

        flush(&mut spans, &mut pending);
        let content_start = open_at + open_len;
        let closing = tag.closing();
        match text[content_start..].find(closing) {
            Some(len) => {
                spans.push(Span::styled(&text[content_start..content_start + len], &tag));
                cursor = content_start + len + closing.len();
            }
            None => {
                spans.push(Span::plain(&text[open_at..]));
                cursor = text.len();
            }
        }
    }

    flush(&mut spans, &mut pending);
    spans
}

/// Concatenate span contents, dropping styling.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.content.as_str()).collect()
}

/// Wrap the character range `start..end` of `text` in `tag`.
///
/// Returns the new text and the cursor position (in characters): between
/// the tags for an empty selection, after the closing tag otherwise.
/// Out-of-range or reversed bounds are clamped.
pub fn wrap_selection(text: &str, start: usize, end: usize, tag: &Tag) -> (String, usize) {
    let char_count = text.chars().count();
    let end = end.min(char_count);
    let start = start.min(end);

    let byte_at = |char_idx: usize| {
        text.char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(text.len())
    };
    let (start_byte, end_byte) = (byte_at(start), byte_at(end));

    let opening = tag.opening();
    let closing = tag.closing();
    let wrapped = format!(
        "{}{}{}{}{}",
        &text[..start_byte],
        opening,
        &text[start_byte..end_byte],
        closing,
        &text[end_byte..]
    );

    let opening_len = opening.chars().count();
    let cursor = if start == end {
        start + opening_len
    } else {
        end + opening_len + closing.len()
    };
    (wrapped, cursor)
}
