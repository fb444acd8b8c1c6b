use futures_util::StreamExt;
use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::application::{FragmentStream, ResponseRenderer};
use crate::domain::DomainError;

/// Drains a fragment stream into the final reply text.
///
/// After every fragment the running text is handed to the renderer before the
/// next fragment is polled, so display is incremental. An optional deadline
/// bounds the whole drain; hitting it yields [`DomainError::Timeout`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseAccumulator {
    deadline: Option<Instant>,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(deadline: Option<Instant>) -> Self {
        Self { deadline }
    }

    pub async fn consume(
        &self,
        mut stream: FragmentStream,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<String, DomainError> {
        let mut text = String::new();
        let mut fragments = 0usize;

        while let Some(fragment) = self.next_fragment(&mut stream).await? {
            fragments += 1;
            text.push_str(&fragment);
            renderer.render(&text);
        }

        debug!(
            "Accumulated {} fragments into {} bytes",
            fragments,
            text.len()
        );

        Ok(text)
    }

    async fn next_fragment(
        &self,
        stream: &mut FragmentStream,
    ) -> Result<Option<String>, DomainError> {
        let next = match self.deadline {
            Some(deadline) => timeout_at(deadline, stream.next())
                .await
                .map_err(|_| DomainError::timeout("provider did not finish streaming in time"))?,
            None => stream.next().await,
        };

        next.transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::stream;

    use super::*;
    use crate::application::RecordingRenderer;

    fn fragments(items: Vec<Result<&'static str, DomainError>>) -> FragmentStream {
        stream::iter(items.into_iter().map(|r| r.map(str::to_string))).boxed()
    }

    #[tokio::test]
    async fn exposes_every_prefix_in_order() {
        let mut renderer = RecordingRenderer::default();
        let text = ResponseAccumulator::new()
            .consume(fragments(vec![Ok("Drink "), Ok("plenty of "), Ok("water.")]), &mut renderer)
            .await
            .unwrap();

        assert_eq!(text, "Drink plenty of water.");
        assert_eq!(
            renderer.frames,
            vec!["Drink ", "Drink plenty of ", "Drink plenty of water."]
        );
    }

    #[tokio::test]
    async fn empty_stream_yields_empty_text() {
        let mut renderer = RecordingRenderer::default();
        let text = ResponseAccumulator::new()
            .consume(fragments(vec![]), &mut renderer)
            .await
            .unwrap();

        assert!(text.is_empty());
        assert!(renderer.frames.is_empty());
    }

    #[tokio::test]
    async fn surfaces_mid_stream_error() {
        let mut renderer = RecordingRenderer::default();
        let err = ResponseAccumulator::new()
            .consume(
                fragments(vec![Ok("partial"), Err(DomainError::provider("reset"))]),
                &mut renderer,
            )
            .await
            .unwrap_err();

        assert!(err.is_provider_error());
        assert_eq!(renderer.frames, vec!["partial"]);
    }

    #[tokio::test]
    async fn deadline_expiry_is_timeout() {
        let stalled: FragmentStream = stream::pending().boxed();
        let deadline = Instant::now() + Duration::from_millis(20);

        let err = ResponseAccumulator::with_deadline(Some(deadline))
            .consume(stalled, &mut RecordingRenderer::default())
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Timeout(_)));
    }
}
