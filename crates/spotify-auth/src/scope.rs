//! Permission scopes
//!
//! A `Scope` is a set: order and duplicates never matter, and every way of
//! spelling "no scopes" (absent, empty string, empty list) is the same value.
//! The granted scope comes back from the token endpoint as a space-delimited
//! string, so a cached token is reused only when that string parses to the
//! same set as the configured scope.

use std::collections::BTreeSet;
use std::fmt;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Characters left unescaped by [`Scope::quoted`]: RFC 3986 unreserved plus `/`.
pub(crate) const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

/// A normalized set of permission strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    entries: BTreeSet<String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a space-delimited scope string.
    pub fn parse(s: &str) -> Self {
        s.split_whitespace().collect()
    }

    /// Space-joined, percent-encoded form for URL transmission.
    pub fn quoted(&self) -> String {
        utf8_percent_encode(&self.to_string(), QUERY_VALUE).to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.entries.contains(permission)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(entry)?;
        }
        Ok(())
    }
}

impl<S: AsRef<str>> FromIterator<S> for Scope {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .flat_map(|s| {
                s.as_ref()
                    .split_whitespace()
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { entries }
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for Scope {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Option<&str>> for Scope {
    fn from(s: Option<&str>) -> Self {
        s.map(Self::parse).unwrap_or_default()
    }
}

impl<S: AsRef<str>> From<Vec<S>> for Scope {
    fn from(list: Vec<S>) -> Self {
        list.into_iter().collect()
    }
}

impl<S: AsRef<str>, const N: usize> From<[S; N]> for Scope {
    fn from(list: [S; N]) -> Self {
        list.into_iter().collect()
    }
}

impl Serialize for Scope {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        serializer.collect_str(self)
    }
}

/// Accepted input shapes. Anything else normalizes to the empty scope.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScopeRepr {
    Text(String),
    List(Vec<String>),
    Other(serde::de::IgnoredAny),
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ScopeRepr::deserialize(deserializer)? {
            ScopeRepr::Text(s) => Scope::parse(&s),
            ScopeRepr::List(list) => list.into_iter().collect(),
            ScopeRepr::Other(_) => {
                debug!("scope is neither a string nor a list of strings, treating as empty");
                Scope::new()
            }
        })
    }
}
