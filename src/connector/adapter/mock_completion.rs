use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use crate::application::{CompletionClient, FragmentStream};
use crate::domain::{CompletionRequest, Credential, DomainError};

const CANNED_REPLY: &str = "This is a simulated reply. For anything serious, please consult a certified doctor.";

#[derive(Debug, Clone)]
enum Script {
    Reply(Vec<String>),
    FailOnCall(String),
    FailAfter(Vec<String>, String),
}

/// Scripted [`CompletionClient`] for tests and offline runs.
///
/// Records every request it receives. By default it streams a canned reply
/// word by word.
pub struct MockCompletion {
    script: Mutex<Script>,
    delay: Option<Duration>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCompletion {
    pub fn new() -> Self {
        Self::with_fragments(CANNED_REPLY.split_inclusive(' '))
    }

    pub fn with_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(Script::Reply(collect(fragments)))
    }

    /// Fails the call itself, before any fragment.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::scripted(Script::FailOnCall(message.into()))
    }

    /// Streams `fragments`, then yields an error item.
    pub fn failing_after<I, S>(fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(Script::FailAfter(collect(fragments), message.into()))
    }

    /// Sleep for `delay` before each fragment.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace the script with a successful reply.
    pub fn set_fragments<I, S>(&self, fragments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *lock(&self.script) = Script::Reply(collect(fragments));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        lock(&self.requests).last().cloned()
    }

    fn scripted(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }
}

fn collect<I, S>(fragments: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    fragments.into_iter().map(Into::into).collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl CompletionClient for MockCompletion {
    async fn complete(
        &self,
        _credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, DomainError> {
        lock(&self.requests).push(request.clone());
        let script = lock(&self.script).clone();

        let (fragments, failure) = match script {
            Script::Reply(fragments) => (fragments, None),
            Script::FailOnCall(message) => {
                debug!("Mock completion failing on call: {}", message);
                return Err(DomainError::provider(message));
            }
            Script::FailAfter(fragments, message) => (fragments, Some(message)),
        };

        debug!(
            "Mock completion streaming {} fragments for {}",
            fragments.len(),
            request.model().identifier()
        );

        let delay = self.delay;
        let stream = async_stream::stream! {
            for fragment in fragments {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield Ok(fragment);
            }
            if let Some(message) = failure {
                yield Err(DomainError::provider(message));
            }
        };

        Ok(stream.boxed())
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use futures_util::TryStreamExt;

    use super::*;
    use crate::domain::GenerationParameters;

    fn credential() -> Credential {
        Credential::parse(format!("r8_{}", "m".repeat(37))).unwrap()
    }

    fn request() -> CompletionRequest {
        CompletionRequest::new("prompt", "system", &GenerationParameters::default())
    }

    #[tokio::test]
    async fn streams_scripted_fragments_and_records_request() {
        let mock = MockCompletion::with_fragments(["a", "b"]);
        let stream = mock.complete(&credential(), &request()).await.unwrap();
        let fragments: Vec<String> = stream.try_collect().await.unwrap();

        assert_eq!(fragments, vec!["a", "b"]);
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.last_request().unwrap().prompt(), "prompt");
    }

    #[tokio::test]
    async fn default_reply_rebuilds_canned_text() {
        let mock = MockCompletion::new();
        let stream = mock.complete(&credential(), &request()).await.unwrap();
        let fragments: Vec<String> = stream.try_collect().await.unwrap();

        assert!(fragments.len() > 1);
        assert_eq!(fragments.concat(), CANNED_REPLY);
    }

    #[tokio::test]
    async fn failing_after_yields_error_item() {
        let mock = MockCompletion::failing_after(["x"], "boom");
        let mut stream = mock.complete(&credential(), &request()).await.unwrap();

        assert_eq!(stream.next().await.unwrap().unwrap(), "x");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
