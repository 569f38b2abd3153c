use thiserror::Error;

use crate::constants::TOKEN_CODE_LENGTH;

/// Authentication failures the caller can act on.
///
/// Provider, store and spawn failures stay as `anyhow::Error` with context
/// and are surfaced verbatim at the top level.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no MFA devices are set up on this account")]
    NoMfaDevice,

    #[error("token codes are 6 characters, got {length}")]
    InvalidTokenCode { length: usize },
}

/// Validate an MFA token code before it goes anywhere near the network.
pub fn validate_token_code(code: &str) -> Result<(), AuthError> {
    if code.len() != TOKEN_CODE_LENGTH {
        return Err(AuthError::InvalidTokenCode { length: code.len() });
    }
    Ok(())
}
