//! Core types for the remote document store.

use serde::{Deserialize, Serialize};

/// Opaque version token assigned by the remote store to each document
/// revision (a content hash).
///
/// Holding a token proves which revision a writer last observed; `put`
/// performs a compare-and-swap against it. Tokens are never inspected,
/// only carried and compared remotely.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(pub String);

impl std::fmt::Display for VersionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VersionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VersionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A document fetched from the store together with its version token.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub value: serde_json::Value,
    pub token: VersionToken,
}
