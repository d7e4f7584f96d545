//! Key patterns for bulk invalidation

/// Matches cache keys for pattern invalidation.
///
/// # Example
///
/// ```
/// use erpdash_lib::cache::KeyPattern;
///
/// let pattern = KeyPattern::suffix(":tenant-A");
/// assert!(pattern.matches("transactions:Invoice:tenant-A"));
/// assert!(!pattern.matches("transactions:Invoice:tenant-AB"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Keys starting with the string.
    Prefix(String),
    /// Keys ending with the string.
    Suffix(String),
    /// Keys containing the string anywhere.
    Contains(String),
}

impl KeyPattern {
    /// Creates a prefix pattern.
    pub fn prefix(s: impl Into<String>) -> Self {
        Self::Prefix(s.into())
    }

    /// Creates a suffix pattern.
    pub fn suffix(s: impl Into<String>) -> Self {
        Self::Suffix(s.into())
    }

    /// Creates a substring pattern.
    pub fn contains(s: impl Into<String>) -> Self {
        Self::Contains(s.into())
    }

    /// Returns `true` if the key matches.
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Prefix(p) => key.starts_with(p.as_str()),
            Self::Suffix(s) => key.ends_with(s.as_str()),
            Self::Contains(s) => key.contains(s.as_str()),
        }
    }
}

impl std::fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prefix(p) => write!(f, "{}*", p),
            Self::Suffix(s) => write!(f, "*{}", s),
            Self::Contains(s) => write!(f, "*{}*", s),
        }
    }
}
