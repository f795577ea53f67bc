use crate::game::TokenId;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenIdError {
    Missing,
    Malformed(String),
    /// A well-formed non-negative integer that cannot be an issued id.
    OutOfRange(String),
}

impl fmt::Display for TokenIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenIdError::Missing => write!(f, "missing token id"),
            TokenIdError::Malformed(raw) => write!(f, "invalid token id '{raw}'"),
            TokenIdError::OutOfRange(raw) => write!(f, "token id '{raw}' is out of range"),
        }
    }
}

impl std::error::Error for TokenIdError {}

/// Accepts only plain non-negative integer strings. Signs, whitespace,
/// fractions and exponents are rejected before any contract read.
pub fn parse_token_id(raw: &str) -> Result<TokenId, TokenIdError> {
    if raw.is_empty() {
        return Err(TokenIdError::Missing);
    }
    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenIdError::Malformed(raw.to_string()));
    }
    raw.parse::<TokenId>()
        .map_err(|_| TokenIdError::OutOfRange(raw.to_string()))
}
