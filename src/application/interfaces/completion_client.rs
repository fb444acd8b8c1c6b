use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::domain::{CompletionRequest, Credential, DomainError};

/// Lazily produced reply fragments, in emission order.
///
/// Finite and one-shot: it ends when the provider signals completion and
/// cannot be restarted. A provider failure after the call was accepted shows
/// up as an `Err` item.
pub type FragmentStream = BoxStream<'static, Result<String, DomainError>>;

/// An interface for submitting a prompt to a hosted model and streaming the
/// generated text back.
///
/// Implementors own transport, serialization and vendor-specific API details;
/// the chat session only sees fragments.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Start a completion for `request`, authenticated with `credential`.
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, DomainError>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &str;
}
