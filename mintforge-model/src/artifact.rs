use serde::{Deserialize, Serialize};

/// Deterministic identifier of one immutable compiled contract build.
///
/// Keys are derived from a token kind plus a normalized feature-module set
/// and are never invented at request time: a key is only usable once a
/// matching prebuilt artifact pair exists on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    /// Wraps an already-derived key string.
    ///
    /// Derivation itself lives in the resolver; this type only carries the
    /// result around.
    pub fn new(key: impl Into<String>) -> Self {
        ArtifactKey(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<ArtifactKey> for String {
    fn from(key: ArtifactKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
