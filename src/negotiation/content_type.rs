//! Content type identifiers and ordered sets of them.
//!
//! # Design Decisions
//! - Equality is exact-string; normalization happens in the negotiator only
//! - Sets drop later duplicates (first occurrence wins)
//! - The cursor is the only mutable state of a set

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque wire format identifier, usually a MIME essence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentType(Cow<'static, str>);

impl ContentType {
    /// No content type at all.
    pub const NONE: ContentType = ContentType(Cow::Borrowed(""));
    /// `*/*`, what a client sends when anything goes.
    pub const DEFAULT: ContentType = ContentType(Cow::Borrowed("*/*"));
    pub const PLAIN_TEXT: ContentType = ContentType(Cow::Borrowed("text/plain"));
    pub const HTML: ContentType = ContentType(Cow::Borrowed("text/html"));
    pub const JSON: ContentType = ContentType(Cow::Borrowed("application/json"));
    pub const XML: ContentType = ContentType(Cow::Borrowed("application/xml"));
    pub const OCTET_STREAM: ContentType = ContentType(Cow::Borrowed("application/octet-stream"));
    pub const FORM: ContentType = ContentType(Cow::Borrowed("application/x-www-form-urlencoded"));
    pub const EVENT_STREAM: ContentType = ContentType(Cow::Borrowed("text/event-stream"));

    /// Wrap a value as-is.
    pub fn new(value: impl Into<String>) -> Self {
        Self(Cow::Owned(value.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for [`ContentType::NONE`].
    pub fn is_none(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContentType {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl AsRef<str> for ContentType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Ordered, de-duplicated content types with a single-pass cursor.
///
/// Used both for what the server supports (sorted) and for what the client
/// prefers (priority order).
#[derive(Debug, Clone, Default)]
pub struct ContentTypeSet {
    types: Vec<ContentType>,
    cursor: Option<usize>,
}

impl ContentTypeSet {
    /// Build a set preserving input order and dropping later duplicates.
    pub fn new<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ContentType>,
    {
        let mut seen = HashSet::new();
        let types = values
            .into_iter()
            .map(Into::into)
            .filter(|ct: &ContentType| seen.insert(ct.clone()))
            .collect();
        Self { types, cursor: None }
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Exact membership test.
    pub fn has(&self, ct: &ContentType) -> bool {
        self.types.iter().any(|t| t == ct)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ContentType> {
        self.types.iter()
    }

    pub fn as_slice(&self) -> &[ContentType] {
        &self.types
    }

    /// Move the cursor forward. Returns false once the set is exhausted.
    pub fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |i| i.saturating_add(1));
        if next < self.types.len() {
            self.cursor = Some(next);
            true
        } else {
            self.cursor = Some(self.types.len());
            false
        }
    }

    /// The element under the cursor; `None` before the first
    /// [`advance`](Self::advance) and after exhaustion.
    pub fn current(&self) -> Option<&ContentType> {
        self.cursor.and_then(|i| self.types.get(i))
    }

    /// Rewind the cursor to before the first element.
    pub fn reset(&mut self) {
        self.cursor = None;
    }
}

impl<'a> IntoIterator for &'a ContentTypeSet {
    type Item = &'a ContentType;
    type IntoIter = std::slice::Iter<'a, ContentType>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first() {
        let set = ContentTypeSet::new(["text/html", "application/json", "text/html"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0], ContentType::HTML);
        assert_eq!(set.as_slice()[1], ContentType::JSON);
    }

    #[test]
    fn test_has_is_exact() {
        let set = ContentTypeSet::new([ContentType::JSON]);
        assert!(set.has(&ContentType::JSON));
        assert!(!set.has(&ContentType::new("Application/JSON")));
    }

    #[test]
    fn test_cursor() {
        let mut set = ContentTypeSet::new(["a/a", "b/b"]);
        assert!(set.current().is_none());

        assert!(set.advance());
        assert_eq!(set.current().map(ContentType::as_str), Some("a/a"));
        assert!(set.advance());
        assert_eq!(set.current().map(ContentType::as_str), Some("b/b"));
        assert!(!set.advance());
        assert!(set.current().is_none());
        // stays exhausted
        assert!(!set.advance());

        set.reset();
        assert!(set.advance());
        assert_eq!(set.current().map(ContentType::as_str), Some("a/a"));
    }

    #[test]
    fn test_empty_cursor() {
        let mut set = ContentTypeSet::empty();
        assert!(!set.advance());
        assert!(set.current().is_none());
    }
}
