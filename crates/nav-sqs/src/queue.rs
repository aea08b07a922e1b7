//! Remote queue identity.

use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// A named remote queue endpoint.
///
/// The URL is authoritative. The name is either what the caller asked for when
/// creating the queue or the one derived from the URL by [`name_from_url`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Queue {
    pub name: String,
    pub url: String,
}

impl Queue {
    /// Create a queue handle from an explicit name and URL
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Create a queue handle whose name is derived from the URL
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            name: name_from_url(&url),
            url,
        }
    }

    /// Case-insensitive URL comparison, the identity rule for queues
    pub fn same_url(&self, url: &str) -> bool {
        self.url.eq_ignore_ascii_case(url)
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name: {}, URL: {}", self.name, self.url)
    }
}

/// Derive a queue name from its URL.
///
/// The URL is split on `/`. A slash-terminated URL yields the second-to-last
/// segment, anything else yields the last one.
pub fn name_from_url(url: &str) -> String {
    let segments: Vec<&str> = url.split('/').collect();
    let index = if url.ends_with('/') {
        segments.len().checked_sub(2)
    } else {
        segments.len().checked_sub(1)
    };

    index
        .and_then(|i| segments.get(i))
        .map(|s| s.to_string())
        .unwrap_or_default()
}
