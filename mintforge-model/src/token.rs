use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Token standard a deployment request targets.
///
/// The canonical string form is the uppercase standard name, which is also
/// the prefix of every artifact key derived for the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    Erc20,
    Erc721,
    Erc1155,
}

impl TokenKind {
    pub const ALL: [TokenKind; 3] = [TokenKind::Erc20, TokenKind::Erc721, TokenKind::Erc1155];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Erc20 => "ERC20",
            TokenKind::Erc721 => "ERC721",
            TokenKind::Erc1155 => "ERC1155",
        }
    }
}

impl std::str::FromStr for TokenKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ERC20" => Ok(TokenKind::Erc20),
            "ERC721" => Ok(TokenKind::Erc721),
            "ERC1155" => Ok(TokenKind::Erc1155),
            other => Err(ModelError::UnknownTokenKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(TokenKind::from_str("erc1155").unwrap(), TokenKind::Erc1155);
        assert_eq!(TokenKind::from_str(" ERC20 ").unwrap(), TokenKind::Erc20);
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(TokenKind::from_str("ERC4626").is_err());
    }
}
