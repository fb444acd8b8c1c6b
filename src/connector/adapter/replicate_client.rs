use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::{CompletionClient, FragmentStream};
use crate::connector::adapter::sse::{SseDecoder, SseEvent};
use crate::domain::{CompletionRequest, Credential, DomainError};

pub const DEFAULT_BASE_URL: &str = "https://api.replicate.com";

#[derive(Serialize)]
struct PredictionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: PredictionInput<'a>,
    stream: bool,
}

#[derive(Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
    temperature: f64,
    top_p: f64,
    system_prompt: &'a str,
}

/// Minimal subset of the prediction object we care about.
#[derive(Deserialize)]
struct Prediction {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Deserialize)]
struct PredictionUrls {
    #[serde(default)]
    stream: Option<String>,
}

#[derive(Deserialize, Default)]
struct EventPayload {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug)]
enum ServerEvent {
    Output(String),
    Done,
    Ignored,
}

/// HTTP client for the Replicate predictions API with server-sent-event
/// streaming.
///
/// A completion is two requests: `POST` creates a prediction with
/// `"stream": true`, then `GET` on the returned `urls.stream` delivers the
/// output as `output` events until a `done` event.
///
/// Official models (`owner/name`) are addressed through
/// `/v1/models/{owner}/{name}/predictions`; versioned models
/// (`owner/name:version`) through `/v1/predictions` with a `version` field.
///
/// ```text
/// REPLICATE_BASE_URL=https://api.replicate.com
/// ```
pub struct ReplicateClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReplicateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        Self {
            // No overall timeout: streams may legitimately run long. The chat
            // session applies its own deadline.
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: base.trim_end_matches('/').to_string(),
        }
    }

    /// Construct from the environment:
    ///
    /// | Variable             | Default                      |
    /// |----------------------|------------------------------|
    /// | `REPLICATE_BASE_URL` | `https://api.replicate.com`  |
    pub fn from_env() -> Self {
        let base = std::env::var("REPLICATE_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint and optional version hash for a model identifier.
    fn prediction_target<'a>(&self, identifier: &'a str) -> (String, Option<&'a str>) {
        match identifier.split_once(':') {
            Some((_, version)) => (format!("{}/v1/predictions", self.base_url), Some(version)),
            None => (
                format!("{}/v1/models/{}/predictions", self.base_url, identifier),
                None,
            ),
        }
    }

    async fn create_prediction(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Prediction, DomainError> {
        let (url, version) = self.prediction_target(request.model().identifier());
        let body = PredictionRequest {
            version,
            input: PredictionInput {
                prompt: request.prompt(),
                temperature: request.temperature(),
                top_p: request.top_p(),
                system_prompt: request.system_prompt(),
            },
            stream: true,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("ReplicateClient: API returned {status}: {body}");
            return Err(DomainError::provider(format!(
                "ReplicateClient: API returned {status}"
            )));
        }

        let prediction: Prediction = response.json().await.map_err(|e| {
            DomainError::provider(format!("ReplicateClient: failed to parse prediction: {e}"))
        })?;

        if let Some(error) = prediction.error.as_ref().filter(|e| !e.is_null()) {
            return Err(DomainError::provider(format!(
                "ReplicateClient: prediction {} failed: {error}",
                prediction.id
            )));
        }

        Ok(prediction)
    }
}

#[async_trait]
impl CompletionClient for ReplicateClient {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<FragmentStream, DomainError> {
        let prediction = self.create_prediction(credential, request).await?;
        let stream_url = prediction
            .urls
            .and_then(|u| u.stream)
            .ok_or_else(|| {
                DomainError::provider(format!(
                    "ReplicateClient: prediction {} has no stream URL",
                    prediction.id
                ))
            })?;

        info!(
            "ReplicateClient: prediction {} created (status={})",
            prediction.id,
            prediction.status.as_deref().unwrap_or("unknown")
        );

        let response = self
            .client
            .get(&stream_url)
            .bearer_auth(credential.expose())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| transport_error("stream request failed", e))?;

        if !response.status().is_success() {
            let status = response.status();
            warn!("ReplicateClient: stream returned {status}");
            return Err(DomainError::provider(format!(
                "ReplicateClient: stream returned {status}"
            )));
        }

        let mut bytes = Box::pin(response.bytes_stream());
        let prediction_id = prediction.id;

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(transport_error("stream interrupted", e));
                        return;
                    }
                };

                for event in decoder.push(&chunk) {
                    match interpret(event) {
                        Ok(ServerEvent::Output(text)) => {
                            yield Ok(text);
                        }
                        Ok(ServerEvent::Done) => {
                            debug!("ReplicateClient: prediction {} done", prediction_id);
                            return;
                        }
                        Ok(ServerEvent::Ignored) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            if let Some(event) = decoder.finish() {
                match interpret(event) {
                    Ok(ServerEvent::Output(text)) => {
                        yield Ok(text);
                    }
                    Ok(_) => {}
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            warn!("ReplicateClient: stream for {} closed without a done event", prediction_id);
        };

        Ok(stream.boxed())
    }

    fn provider_name(&self) -> &str {
        "replicate"
    }
}

fn interpret(event: SseEvent) -> Result<ServerEvent, DomainError> {
    match event.event.as_str() {
        "output" => Ok(ServerEvent::Output(event.data)),
        "done" => {
            let payload: EventPayload = serde_json::from_str(&event.data).unwrap_or_default();
            match payload.reason.as_deref() {
                Some(reason @ ("error" | "canceled")) => Err(DomainError::provider(format!(
                    "ReplicateClient: prediction ended early ({reason})"
                ))),
                _ => Ok(ServerEvent::Done),
            }
        }
        "error" => {
            let payload: EventPayload = serde_json::from_str(&event.data).unwrap_or_default();
            let detail = payload.detail.unwrap_or(event.data);
            Err(DomainError::provider(format!("ReplicateClient: {detail}")))
        }
        _ => Ok(ServerEvent::Ignored),
    }
}

fn transport_error(context: &str, e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::timeout(format!("ReplicateClient: {context}: {e}"))
    } else {
        DomainError::provider(format!("ReplicateClient: {context}: {e}"))
    }
}
