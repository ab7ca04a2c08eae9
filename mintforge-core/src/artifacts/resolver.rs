//! Deterministic artifact-key resolution.
//!
//! Pure and side-effect free: whether a build actually exists for the
//! resolved key is the artifact store's concern.

use mintforge_model::{ArtifactKey, TokenKind};

use crate::errors::{DeployError, Result};

/// Feature modules each token kind may combine with.
///
/// A violation is a caller error and is rejected before any filesystem or
/// network access happens. Lists are sorted so the error output is stable.
pub fn allowed_modules(kind: TokenKind) -> &'static [&'static str] {
    match kind {
        TokenKind::Erc20 => &["burnable", "capped", "mintable", "pausable", "permit"],
        TokenKind::Erc721 => &[
            "burnable",
            "enumerable",
            "mintable",
            "pausable",
            "royalty",
            "uristorage",
        ],
        TokenKind::Erc1155 => &["burnable", "mintable", "pausable", "supply", "uristorage"],
    }
}

/// Normalizes a caller-supplied module list to its canonical set form:
/// trimmed, lowercased, empties dropped, sorted, deduplicated.
pub fn normalize_modules(modules: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = modules
        .iter()
        .map(|m| m.trim().to_ascii_lowercase())
        .filter(|m| !m.is_empty())
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}

/// Maps a token kind plus an unordered module set to exactly one artifact key.
///
/// Two requests naming the same set (any order, casing, whitespace or
/// duplication) resolve to the same key. The empty set resolves to the kind's
/// base build.
pub fn resolve_artifact_key(kind: TokenKind, modules: &[String]) -> Result<ArtifactKey> {
    let normalized = normalize_modules(modules);

    let allowed = allowed_modules(kind);
    let rejected: Vec<&str> = normalized
        .iter()
        .filter(|m| !allowed.contains(&m.as_str()))
        .map(|m| m.as_str())
        .collect();
    if !rejected.is_empty() {
        return Err(DeployError::InvalidModuleCombination {
            kind: kind.to_string(),
            modules: rejected.join(", "),
        });
    }

    let key = if normalized.is_empty() {
        format!("{kind}__base")
    } else {
        format!("{kind}__{}", normalized.join("_"))
    };
    Ok(ArtifactKey::new(key))
}
