use crate::token_id::TokenIdError;
use std::fmt;

/// Outcome classes of reading the primary record of a view.
#[derive(Debug)]
pub enum LookupError {
    InvalidTokenId(TokenIdError),
    NotFound,
    /// RPC or contract failure. The inner error is for logs only.
    Upstream(anyhow::Error),
}

impl LookupError {
    pub fn status_code(&self) -> u16 {
        match self {
            LookupError::InvalidTokenId(_) => 400,
            LookupError::NotFound => 404,
            LookupError::Upstream(_) => 500,
        }
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidTokenId(e) => write!(f, "{e}"),
            LookupError::NotFound => write!(f, "game not found"),
            LookupError::Upstream(e) => write!(f, "upstream read failed: {e:#}"),
        }
    }
}

impl std::error::Error for LookupError {}

impl From<TokenIdError> for LookupError {
    fn from(e: TokenIdError) -> Self {
        match e {
            TokenIdError::OutOfRange(_) => LookupError::NotFound,
            other => LookupError::InvalidTokenId(other),
        }
    }
}
