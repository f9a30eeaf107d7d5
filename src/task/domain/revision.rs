//! Version-control value objects recorded on tasks.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length for a validated bookmark name.
const MAX_BOOKMARK_NAME_LENGTH: usize = 200;

/// Characters rejected by `git check-ref-format` and by jj bookmark names.
const FORBIDDEN_BOOKMARK_CHARS: &[char] = &[':', '~', '^', '?', '*', '[', '\\'];

/// Validated named pointer to a revision (a Git branch or a jj bookmark).
///
/// Bookmark names must be non-empty after trimming, must not contain
/// whitespace, ref-format control characters or `..`, must not start with
/// `-`, and must not exceed `MAX_BOOKMARK_NAME_LENGTH` characters.
///
/// # Examples
///
///     use cairn::task::domain::BookmarkName;
///
///     let name = BookmarkName::new("task/alpha").expect("valid");
///     assert_eq!(name.as_str(), "task/alpha");
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookmarkName(String);

impl BookmarkName {
    /// Creates a validated bookmark name.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidBookmarkName`] when the value breaks
    /// any of the naming rules.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if Self::is_invalid_bookmark_name(normalized) {
            return Err(TaskDomainError::InvalidBookmarkName(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    fn is_invalid_bookmark_name(name: &str) -> bool {
        let is_empty = name.is_empty();
        let has_whitespace = name.chars().any(char::is_whitespace);
        let has_forbidden_char = name.contains(FORBIDDEN_BOOKMARK_CHARS);
        let has_dot_run = name.contains("..");
        let looks_like_flag = name.starts_with('-');
        let exceeds_length_limit = name.len() > MAX_BOOKMARK_NAME_LENGTH;

        is_empty
            || has_whitespace
            || has_forbidden_char
            || has_dot_run
            || looks_like_flag
            || exceeds_length_limit
    }

    /// Returns the bookmark name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BookmarkName {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BookmarkName> for String {
    fn from(value: BookmarkName) -> Self {
        value.0
    }
}

impl AsRef<str> for BookmarkName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for BookmarkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to a revision, such as a Git commit hash or a jj change
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PositionRef(String);

impl PositionRef {
    /// Creates a validated revision reference.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidPosition`] when the value is empty
    /// or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();

        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(TaskDomainError::InvalidPosition(raw));
        }

        Ok(Self(normalized.to_owned()))
    }

    /// Returns the revision reference as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PositionRef {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PositionRef> for String {
    fn from(value: PositionRef) -> Self {
        value.0
    }
}

impl AsRef<str> for PositionRef {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PositionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
