//! Cache key construction

/// Separator between key segments.
pub const KEY_SEPARATOR: char = ':';

/// Builder for colon-separated cache keys.
///
/// The first part is a resource tag taken verbatim. Every following segment
/// is percent-encoded, so an identifier containing `:` cannot make two
/// different parameter tuples produce the same key.
///
/// # Example
///
/// ```
/// use erpdash_lib::cache::CacheKey;
///
/// let key = CacheKey::new("transactions").segment("Invoice").segment("tenant-A").build();
/// assert_eq!(key, "transactions:Invoice:tenant-A");
///
/// let key = CacheKey::new("transactions").segment("a:b").segment("c").build();
/// assert_eq!(key, "transactions:a%3Ab:c");
/// ```
#[derive(Debug, Clone)]
pub struct CacheKey {
    parts: Vec<String>,
}

impl CacheKey {
    /// Starts a key with the given resource tag.
    pub fn new(tag: &str) -> Self {
        Self {
            parts: vec![tag.to_string()],
        }
    }

    /// Appends an encoded parameter segment.
    pub fn segment(mut self, part: impl AsRef<str>) -> Self {
        self.parts.push(encode_segment(part.as_ref()));
        self
    }

    /// Builds the final key.
    pub fn build(self) -> String {
        self.parts.join(":")
    }
}

/// Percent-encodes one key segment.
pub fn encode_segment(part: &str) -> String {
    urlencoding::encode(part).into_owned()
}
