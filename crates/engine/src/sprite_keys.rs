//! Sprite keys name PNGs under `assets/base/sprites` as `/`-separated lowercase segments.
//! They mirror dotted def names, so `ants.worker` draws `ants/worker.png` unless the def
//! names its own `<sprite>`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key segment {index} is empty")]
    EmptySegment { index: usize },
    #[error("sprite key segment '{segment}' contains invalid character '{character}'")]
    InvalidCharacter { segment: String, character: char },
}

pub(crate) fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    for (index, segment) in key.split('/').enumerate() {
        if segment.is_empty() {
            return Err(SpriteKeyError::EmptySegment { index });
        }
        if let Some(character) = segment.chars().find(|ch| !is_segment_char(*ch)) {
            return Err(SpriteKeyError::InvalidCharacter {
                segment: segment.to_string(),
                character,
            });
        }
    }
    Ok(())
}

fn is_segment_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '-')
}

/// `None` when the def name does not form a valid key.
pub(crate) fn sprite_key_for_def_name(def_name: &str) -> Option<String> {
    let key = def_name.replace('.', "/");
    validate_sprite_key(&key).ok().map(|()| key)
}
