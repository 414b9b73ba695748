use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteTagError {
    #[error("sprite tag must not be empty")]
    Empty,
    #[error("sprite tag must not contain whitespace")]
    Whitespace,
    #[error("sprite tag must not contain '\\\\'")]
    Backslash,
    #[error("sprite tag must not contain '..'")]
    ParentTraversal,
    #[error("sprite tag contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Name a layer uses to request a sprite, e.g. `t.l0.grassland1` or `grid.main.ns`.
///
/// Clones share one allocation, so layers can hand tags out per element without
/// copying strings.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteTag(Arc<str>);

impl SpriteTag {
    pub fn new(tag: &str) -> Result<Self, SpriteTagError> {
        validate_sprite_tag(tag)?;
        Ok(Self(Arc::from(tag)))
    }

    /// Builds a tag from text produced by the crate itself (formatted table names).
    pub(crate) fn from_trusted(tag: String) -> Self {
        Self(Arc::from(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SpriteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for SpriteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SpriteTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SpriteTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for SpriteTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SpriteTag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SpriteTag::new(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) fn validate_sprite_tag(tag: &str) -> Result<(), SpriteTagError> {
    if tag.is_empty() {
        return Err(SpriteTagError::Empty);
    }
    if tag.contains('\\') {
        return Err(SpriteTagError::Backslash);
    }
    if tag.contains("..") {
        return Err(SpriteTagError::ParentTraversal);
    }
    for ch in tag.chars() {
        if ch.is_whitespace() {
            return Err(SpriteTagError::Whitespace);
        }
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-' | '/' | ':') {
            continue;
        }
        return Err(SpriteTagError::InvalidCharacter { character: ch });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_tags() {
        for tag in [
            "t.l0.grassland1",
            "grid.main.ns",
            "t.fog_k_k_k_f",
            "city.european_city_16",
            "f.shield:large",
            "u/settlers",
        ] {
            assert!(validate_sprite_tag(tag).is_ok(), "tag={tag}");
        }
    }

    #[test]
    fn rejects_invalid_tags() {
        for tag in ["", "a..b", r"a\b", "a b", "a\tb", "tag#1", "ünits"] {
            assert!(validate_sprite_tag(tag).is_err(), "tag={tag}");
        }
    }

    #[test]
    fn clones_share_storage_and_compare_by_text() {
        let a = SpriteTag::new("t.fog").expect("tag");
        let b = a.clone();
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, SpriteTag::new("t.fog").expect("tag"));
        let borrowed: &str = a.borrow();
        assert_eq!(borrowed, "t.fog");
    }

    #[test]
    fn deserialize_rejects_invalid_text() {
        let ok: SpriteTag = serde_json::from_str("\"road.road_n\"").expect("valid");
        assert_eq!(ok.as_str(), "road.road_n");
        assert!(serde_json::from_str::<SpriteTag>("\"bad tag\"").is_err());
    }
}
