//! Portrait lookup for a speaking character.

use crate::schema::tree::{Character, DialogueTree};

/// Portrait key used as the designated default when the host sets none.
pub const DEFAULT_PORTRAIT_KEY: &str = "default";

/// Resolve the portrait asset for `character` showing `emotion`.
///
/// Order: the emotion's portrait, then the character's default emotion,
/// then one designated default asset (`host_default`, or the character's
/// `"default"` entry). Never searches other characters.
pub fn resolve_portrait<'a>(
    character: &'a Character,
    emotion: Option<&str>,
    host_default: Option<&'a str>,
) -> Option<&'a str> {
    emotion
        .and_then(|e| character.portraits.get(e))
        .or_else(|| character.portraits.get(&character.default_emotion))
        .map(String::as_str)
        .or_else(|| host_default.or_else(|| character.portraits.get(DEFAULT_PORTRAIT_KEY).map(String::as_str)))
}

/// Resolve a portrait by character id. Unknown characters only get the
/// host default.
pub fn portrait_for<'a>(
    tree: &'a DialogueTree,
    character_id: &str,
    emotion: Option<&str>,
    host_default: Option<&'a str>,
) -> Option<&'a str> {
    match tree.character(character_id) {
        Some(character) => resolve_portrait(character, emotion, host_default),
        None => host_default,
    }
}
