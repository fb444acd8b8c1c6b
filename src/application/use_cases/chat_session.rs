use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::{timeout_at, Instant as Deadline};
use tracing::{debug, info, warn};

use crate::application::use_cases::prompt_assembler::build_prompt;
use crate::application::use_cases::response_accumulator::ResponseAccumulator;
use crate::application::{CompletionClient, DomainFilter, FragmentStream, ResponseRenderer};
use crate::domain::{
    CompletionRequest, Credential, DomainError, GenerationParameters, Message, Transcript,
    APOLOGY_MESSAGE, DEFAULT_GREETING, REFUSAL_MESSAGE,
};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// What to do when the provider call fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderErrorPolicy {
    /// Commit the apology message as the reply and carry on.
    #[default]
    Apologize,
    /// Return the error; the user message stays pending for
    /// [`ChatSession::respond_pending`].
    Propagate,
}

/// Where the current submission is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingGate,
    Rejected,
    Prompting,
    Streaming,
    Committed,
}

/// How a turn ended. Every variant carries the committed assistant text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed(String),
    /// The domain filter rejected the message; the provider was not called.
    Refused(String),
    /// The provider failed and the apology was committed instead.
    Recovered(String),
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            TurnOutcome::Completed(t) | TurnOutcome::Refused(t) | TurnOutcome::Recovered(t) => t,
        }
    }
}

/// Behaviour knobs for a [`ChatSession`], fixed at construction.
#[derive(Clone)]
pub struct SessionConfig {
    system_prompt: String,
    domain_filter: Option<Arc<dyn DomainFilter>>,
    on_provider_error: ProviderErrorPolicy,
    greeting: String,
    refusal_message: String,
    apology_message: String,
    history_window: Option<usize>,
    request_timeout: Option<Duration>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("domain_filter", &self.domain_filter.is_some())
            .field("on_provider_error", &self.on_provider_error)
            .field("history_window", &self.history_window)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionConfig {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            domain_filter: None,
            on_provider_error: ProviderErrorPolicy::default(),
            greeting: DEFAULT_GREETING.to_string(),
            refusal_message: REFUSAL_MESSAGE.to_string(),
            apology_message: APOLOGY_MESSAGE.to_string(),
            history_window: None,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }

    pub fn with_domain_filter(mut self, filter: Arc<dyn DomainFilter>) -> Self {
        self.domain_filter = Some(filter);
        self
    }

    pub fn with_error_policy(mut self, policy: ProviderErrorPolicy) -> Self {
        self.on_provider_error = policy;
        self
    }

    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    pub fn with_refusal_message(mut self, message: impl Into<String>) -> Self {
        self.refusal_message = message.into();
        self
    }

    pub fn with_apology_message(mut self, message: impl Into<String>) -> Self {
        self.apology_message = message.into();
        self
    }

    /// Feed only the last `messages` transcript entries to the prompt.
    pub fn with_history_window(mut self, messages: Option<usize>) -> Self {
        self.history_window = messages;
        self
    }

    /// `None` disables the provider deadline.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn has_domain_filter(&self) -> bool {
        self.domain_filter.is_some()
    }

    pub fn error_policy(&self) -> ProviderErrorPolicy {
        self.on_provider_error
    }

    pub fn history_window(&self) -> Option<usize> {
        self.history_window
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

/// The conversation controller: owns the transcript and drives one submission
/// at a time through filter, prompt, provider and accumulation.
///
/// Every mutating operation takes `&mut self`, so a second submission cannot
/// begin while one is still streaming.
pub struct ChatSession {
    config: SessionConfig,
    client: Arc<dyn CompletionClient>,
    credential: Option<Credential>,
    params: GenerationParameters,
    transcript: Transcript,
    state: SessionState,
    #[cfg(test)]
    trail: Vec<SessionState>,
}

impl ChatSession {
    pub fn new(
        config: SessionConfig,
        client: Arc<dyn CompletionClient>,
        params: GenerationParameters,
    ) -> Self {
        let transcript = Transcript::new(config.greeting.clone());
        Self {
            config,
            client,
            credential: None,
            params,
            transcript,
            state: SessionState::Idle,
            #[cfg(test)]
            trail: Vec::new(),
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Re-run the credential gate for a new token. An invalid token disables
    /// input until a valid one is supplied.
    pub fn set_credential(&mut self, token: &str) -> Result<(), DomainError> {
        match Credential::parse(token) {
            Ok(credential) => {
                info!("Credential accepted");
                self.credential = Some(credential);
                Ok(())
            }
            Err(e) => {
                warn!("Credential rejected: {}", e);
                self.credential = None;
                Err(e)
            }
        }
    }

    pub fn is_input_enabled(&self) -> bool {
        self.credential.is_some()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    pub fn parameters(&self) -> &GenerationParameters {
        &self.params
    }

    pub fn set_parameters(&mut self, params: GenerationParameters) {
        debug!("Generation parameters updated: {:?}", params);
        self.params = params;
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn provider_name(&self) -> &str {
        self.client.provider_name()
    }

    /// Reset the transcript to its greeting.
    pub fn clear(&mut self) {
        info!("Clearing chat history ({} messages)", self.transcript.len());
        self.transcript.clear();
        self.transition(SessionState::Idle);
    }

    /// Append `text` as a user message and produce the assistant reply.
    pub async fn submit(
        &mut self,
        text: &str,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<TurnOutcome, DomainError> {
        if self.credential.is_none() {
            return Err(DomainError::invalid_credential(
                "enter a valid API token before sending messages",
            ));
        }
        if text.trim().is_empty() {
            return Err(DomainError::invalid_input("message is empty"));
        }

        info!("New user message ({} chars)", text.chars().count());
        self.transcript.push_user(text);
        self.transition(SessionState::AwaitingGate);

        let in_scope = self
            .config
            .domain_filter
            .as_ref()
            .map_or(true, |filter| filter.is_in_scope(text));
        if !in_scope {
            info!("Message rejected by domain filter");
            self.transition(SessionState::Rejected);
            let refusal = self.config.refusal_message.clone();
            self.append_reply(&refusal, renderer)?;
            self.transition(SessionState::Idle);
            return Ok(TurnOutcome::Refused(refusal));
        }

        self.generate(renderer).await
    }

    /// Produce a reply for a user message left pending by an earlier failed
    /// turn. Refuses to run when the last message is already a reply.
    pub async fn respond_pending(
        &mut self,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<TurnOutcome, DomainError> {
        if self.credential.is_none() {
            return Err(DomainError::invalid_credential(
                "enter a valid API token before sending messages",
            ));
        }
        if !self.transcript.awaiting_reply() {
            return Err(DomainError::invalid_state("no user message is awaiting a reply"));
        }
        self.transition(SessionState::AwaitingGate);
        self.generate(renderer).await
    }

    async fn generate(
        &mut self,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<TurnOutcome, DomainError> {
        let credential = match &self.credential {
            Some(c) => c.clone(),
            None => {
                self.transition(SessionState::Idle);
                return Err(DomainError::invalid_credential("no API token"));
            }
        };

        let request = self.build_request();
        self.transition(SessionState::Prompting);
        renderer.begin();

        let started = Instant::now();
        let deadline = self.config.request_timeout.map(|t| Deadline::now() + t);

        info!(
            "Requesting completion from {} ({}, temperature={}, top_p={})",
            self.client.provider_name(),
            request.model().identifier(),
            request.temperature(),
            request.top_p()
        );

        let result = match self.open_stream(&credential, &request, deadline).await {
            Ok(stream) => {
                self.transition(SessionState::Streaming);
                ResponseAccumulator::with_deadline(deadline)
                    .consume(stream, renderer)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(reply) => {
                info!(
                    "Completion finished in {:.2}s ({} chars)",
                    started.elapsed().as_secs_f64(),
                    reply.chars().count()
                );
                self.commit(&reply, renderer)?;
                Ok(TurnOutcome::Completed(reply))
            }
            Err(e) if e.is_provider_error() => match self.config.on_provider_error {
                ProviderErrorPolicy::Apologize => {
                    warn!("Completion failed: {}. Replying with apology.", e);
                    let apology = self.config.apology_message.clone();
                    renderer.render(&apology);
                    self.commit(&apology, renderer)?;
                    Ok(TurnOutcome::Recovered(apology))
                }
                ProviderErrorPolicy::Propagate => {
                    warn!("Completion failed: {}. Message left pending.", e);
                    self.transition(SessionState::Idle);
                    Err(e)
                }
            },
            Err(e) => {
                self.transition(SessionState::Idle);
                Err(e)
            }
        }
    }

    async fn open_stream(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
        deadline: Option<Deadline>,
    ) -> Result<FragmentStream, DomainError> {
        let call = self.client.complete(credential, request);
        match deadline {
            Some(deadline) => timeout_at(deadline, call)
                .await
                .map_err(|_| DomainError::timeout("provider did not respond in time"))?,
            None => call.await,
        }
    }

    /// The whole transcript, pending user turn included, is replayed before
    /// the pending turn is appended once more as the new user text.
    fn build_request(&self) -> CompletionRequest {
        let history = self.transcript.messages();
        let history = match self.config.history_window {
            Some(window) if history.len() > window => &history[history.len() - window..],
            _ => history,
        };
        let pending = self.transcript.last().content();
        let prompt = build_prompt(&self.config.system_prompt, history, pending);

        debug!(
            "Assembled prompt from {} history messages ({} bytes)",
            history.len(),
            prompt.len()
        );

        CompletionRequest::new(prompt, self.config.system_prompt.clone(), &self.params)
    }

    fn append_reply(
        &mut self,
        text: &str,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<(), DomainError> {
        self.transcript.push_assistant(text)?;
        renderer.finish(text);
        Ok(())
    }

    /// Append a generated (or apology) reply and pass through `Committed`.
    fn commit(
        &mut self,
        text: &str,
        renderer: &mut dyn ResponseRenderer,
    ) -> Result<(), DomainError> {
        self.append_reply(text, renderer)?;
        self.transition(SessionState::Committed);
        self.transition(SessionState::Idle);
        Ok(())
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!("Session state {:?} -> {:?}", self.state, next);
        }
        self.state = next;
        #[cfg(test)]
        self.trail.push(next);
    }
}
