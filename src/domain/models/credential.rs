use std::fmt;

use crate::domain::DomainError;

/// Literal every Replicate API token starts with.
pub const TOKEN_PREFIX: &str = "r8_";
/// Exact token length in characters, prefix included.
pub const TOKEN_LENGTH: usize = 40;

/// Shape check for API tokens. Only the prefix and the length matter; the
/// characters after the prefix are opaque.
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && token.starts_with(TOKEN_PREFIX) && token.chars().count() == TOKEN_LENGTH
}

/// A bearer token that has passed [`is_valid_token`].
///
/// The only way to build one is [`Credential::parse`], so holding a
/// `Credential` proves the gate was passed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn parse(token: impl Into<String>) -> Result<Self, DomainError> {
        let token = token.into();
        if !is_valid_token(&token) {
            return Err(DomainError::invalid_credential(format!(
                "expected a {TOKEN_LENGTH}-character token starting with '{TOKEN_PREFIX}'"
            )));
        }
        Ok(Self(token))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({TOKEN_PREFIX}***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_body(body: char) -> String {
        format!("{TOKEN_PREFIX}{}", body.to_string().repeat(TOKEN_LENGTH - TOKEN_PREFIX.len()))
    }

    #[test]
    fn accepts_prefix_and_length_regardless_of_body() {
        for body in ['a', 'Z', '0', '_', '-'] {
            assert!(is_valid_token(&token_with_body(body)), "body {body:?}");
        }
    }

    #[test]
    fn rejects_wrong_shapes() {
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("r8_"));
        assert!(!is_valid_token(&format!("{}x", token_with_body('a'))));
        assert!(!is_valid_token(&token_with_body('a')[..TOKEN_LENGTH - 1]));
        assert!(!is_valid_token(&format!("r9_{}", "a".repeat(37))));
        assert!(!is_valid_token(&format!("R8_{}", "a".repeat(37))));
    }

    #[test]
    fn parse_rejects_padded_token() {
        let padded = format!(" {}", token_with_body('a'));
        assert!(!is_valid_token(&padded));
        assert!(Credential::parse(padded).unwrap_err().is_invalid_credential());
        assert!(Credential::parse(format!("{}\n", token_with_body('a'))).is_err());
    }

    #[test]
    fn parse_reports_invalid_credential() {
        let err = Credential::parse("sk-not-a-replicate-token").unwrap_err();
        assert!(err.is_invalid_credential());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let credential = Credential::parse(token_with_body('s')).unwrap();
        let printed = format!("{credential:?}");
        assert!(!printed.contains("sss"));
    }
}
