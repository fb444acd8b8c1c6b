use tracing::debug;

/// Environment variable holding a pre-provisioned API token.
pub const TOKEN_ENV_VAR: &str = "REPLICATE_API_TOKEN";

/// Where the session's token came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Pre-provisioned through [`TOKEN_ENV_VAR`].
    Provisioned(String),
    /// Nothing provisioned; the user has to type one in.
    Missing,
}

/// Look up a pre-provisioned token. Blank values count as missing; anything
/// else is passed on verbatim for the credential gate to judge.
pub fn provisioned_token() -> TokenSource {
    match std::env::var(TOKEN_ENV_VAR) {
        Ok(token) if !token.trim().is_empty() => {
            debug!("Found API token in {}", TOKEN_ENV_VAR);
            TokenSource::Provisioned(token)
        }
        _ => TokenSource::Missing,
    }
}
