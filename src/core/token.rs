use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the asset an intent is denominated in.
///
/// Tokens are never converted into each other: netting only ever cancels
/// amounts of the same token around a cycle. Any string works, whether a
/// ticker (`ETH`, `USDC`) or a contract address.
///
/// # Examples
///
/// ```
/// use intent_netting::core::token::TokenId;
///
/// let eth = TokenId::new("ETH");
/// let usdc = TokenId::new("USDC");
/// assert_ne!(eth, usdc);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TokenId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
