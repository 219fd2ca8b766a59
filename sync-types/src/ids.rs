//! Identity and ordering types for monto-sync.
//!
//! A product document is addressed as `<scheme>:<sourcePath>-<name>.<language>`.
//! [`UriCodec`] performs the mapping in both directions; the reverse mapping
//! only recovers the source document, not the product name or language.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::MontoError;

/// Scheme reserved for product documents.
pub const DEFAULT_SCHEME: &str = "monto";

/// Scheme restored on source documents by [`UriCodec::decode`].
pub const DEFAULT_SOURCE_SCHEME: &str = "file";

fn parse_url(raw: &str) -> Result<Url, MontoError> {
    Url::parse(raw).map_err(|source| MontoError::InvalidUri {
        uri: raw.to_string(),
        source,
    })
}

/// Identifier of a source document (the file the analysis process reads).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SourceUri(Url);

impl SourceUri {
    /// Parse a source identifier.
    pub fn parse(raw: &str) -> Result<Self, MontoError> {
        parse_url(raw).map(Self)
    }

    /// Wrap an already-parsed URL.
    pub fn from_url(url: Url) -> Self {
        Self(url)
    }

    /// The path component, percent-encoded as it appears in the identifier.
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// Get the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Whether both identifiers name the same document, ignoring query and
    /// fragment.
    pub fn same_document(&self, other: &SourceUri) -> bool {
        self.0.scheme() == other.0.scheme()
            && self.0.host_str() == other.0.host_str()
            && self.0.path() == other.0.path()
    }

    /// The identifier carried by placeholder products (`file:///`).
    pub fn root() -> Self {
        Self(Url::parse("file:///").expect("static url is valid"))
    }
}

impl FromStr for SourceUri {
    type Err = MontoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceUri({})", self.0)
    }
}

/// Identifier of a product (derived, read-only) document.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TargetUri(Url);

impl TargetUri {
    /// Parse a product identifier.
    pub fn parse(raw: &str) -> Result<Self, MontoError> {
        parse_url(raw).map(Self)
    }

    /// Wrap an already-parsed URL.
    pub fn from_url(url: Url) -> Self {
        Self(url)
    }

    /// The path component, `<sourcePath>-<name>.<language>`.
    pub fn path(&self) -> &str {
        self.0.path()
    }

    /// The scheme component.
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Get the inner URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl FromStr for TargetUri {
    type Err = MontoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TargetUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TargetUri({})", self.0)
    }
}

/// Deterministic mapping between source and product identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriCodec {
    scheme: String,
    source_scheme: String,
}

impl UriCodec {
    /// Create a codec for the given product and source schemes.
    pub fn new(scheme: &str, source_scheme: &str) -> Result<Self, MontoError> {
        // Both must be usable as URL schemes.
        parse_url(&format!("{scheme}:/"))?;
        parse_url(&format!("{source_scheme}:/"))?;
        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            source_scheme: source_scheme.to_ascii_lowercase(),
        })
    }

    /// The product scheme.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Derive the product identifier for `(source, name, language)`.
    ///
    /// Only the source path is kept; the source scheme, host and query are
    /// replaced by the product scheme.
    pub fn encode(
        &self,
        source: &SourceUri,
        name: &str,
        language: &str,
    ) -> Result<TargetUri, MontoError> {
        let raw = format!("{}:{}-{}.{}", self.scheme, source.path(), name, language);
        TargetUri::parse(&raw)
    }

    /// Recover the source identifier by cutting the path at its last `-`.
    ///
    /// Lossy: the product name and language are discarded. A source path that
    /// itself ends in `-<x>.<y>` cannot be told apart from a product suffix.
    pub fn decode(&self, target: &TargetUri) -> Result<SourceUri, MontoError> {
        let path = target.path();
        let cut = path
            .rfind('-')
            .ok_or_else(|| MontoError::NotAProductUri(target.to_string()))?;
        SourceUri::parse(&format!("{}:{}", self.source_scheme, &path[..cut]))
    }

    /// Whether `url` lives in the product scheme.
    pub fn is_target(&self, url: &Url) -> bool {
        url.scheme() == self.scheme
    }
}

impl Default for UriCodec {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            source_scheme: DEFAULT_SOURCE_SCHEME.to_string(),
        }
    }
}

/// Store-assigned, monotonically increasing publish counter.
///
/// Pending selection applications are tagged with the generation of the
/// product they were computed from, so they can be dropped once a newer
/// publish has replaced it.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    /// Create a new Generation with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this Generation.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Generation of the placeholder product (never published).
    pub fn zero() -> Self {
        Self(0)
    }

    /// Increment the generation by one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generation({})", self.0)
    }
}
