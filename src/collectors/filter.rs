use crate::error::UsageError;
use crate::models::FilesystemsItem;
use log::warn;
use regex::Regex;
use std::fmt;

/// Name filter applied to the file system listing before usage is queried
///
/// Matching uses search semantics: a name matches when the pattern matches
/// anywhere in it, so an empty pattern selects every file system.
#[derive(Debug, Clone)]
pub enum FilesystemFilter {
    /// Every name is kept
    All,
    /// Names matching the compiled pattern are kept
    Pattern(Regex),
    /// Nothing is kept; produced by [`FilesystemFilter::lenient`] for a
    /// pattern that does not compile
    MatchNone { pattern: String },
}

impl FilesystemFilter {
    /// Compile `pattern`, failing on invalid syntax
    ///
    /// # Errors
    ///
    /// Returns `UsageError::InvalidFilter` when `pattern` is not a valid regex.
    pub fn new(pattern: &str) -> Result<Self, UsageError> {
        Ok(Self::Pattern(Regex::new(pattern)?))
    }

    /// Compile `pattern`, treating invalid syntax as "match nothing"
    ///
    /// Compatibility mode for callers that relied on a bad pattern producing
    /// an empty result instead of an error.
    pub fn lenient(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => Self::Pattern(regex),
            Err(e) => {
                warn!(
                    "Filesystem filter '{}' is not a valid regex ({}); no file systems will match",
                    pattern, e
                );
                Self::MatchNone {
                    pattern: pattern.to_string(),
                }
            }
        }
    }

    /// Filter that keeps every file system
    pub fn all() -> Self {
        Self::All
    }

    /// Source text of the pattern
    pub fn pattern(&self) -> &str {
        match self {
            Self::All => "",
            Self::Pattern(regex) => regex.as_str(),
            Self::MatchNone { pattern } => pattern,
        }
    }

    /// Whether `name` is kept by this filter
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Pattern(regex) => regex.is_match(name),
            Self::MatchNone { .. } => false,
        }
    }

    /// Matching items in their original order
    pub fn apply(&self, items: &[FilesystemsItem]) -> Vec<FilesystemsItem> {
        items
            .iter()
            .filter(|item| self.matches(&item.name))
            .cloned()
            .collect()
    }
}

impl Default for FilesystemFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl fmt::Display for FilesystemFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "//"),
            Self::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
            Self::MatchNone { pattern } => write!(f, "/{}/ (invalid, matches nothing)", pattern),
        }
    }
}

/// Keep the file systems whose name matches `pattern`
///
/// A pattern that fails to compile selects nothing rather than failing.
pub fn filter_filesystems(items: &[FilesystemsItem], pattern: &str) -> Vec<FilesystemsItem> {
    FilesystemFilter::lenient(pattern).apply(items)
}
