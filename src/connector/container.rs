use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::application::{
    ChatSession, CompletionClient, ProviderErrorPolicy, SessionConfig,
};
use crate::connector::adapter::{KeywordDomainFilter, MockCompletion, ReplicateClient};
use crate::domain::{AssistantProfile, DomainError, GenerationParameters, ModelChoice};

pub struct ContainerConfig {
    pub profile: AssistantProfile,
    pub model: ModelChoice,
    pub temperature: f64,
    pub top_p: f64,
    /// Provider deadline in seconds; `0` disables it.
    pub timeout_secs: u64,
    pub history_window: Option<usize>,
    /// Return provider errors instead of replying with the apology.
    pub no_recover: bool,
    /// Use the scripted offline client instead of Replicate.
    pub mock_provider: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            profile: AssistantProfile::default(),
            model: ModelChoice::default(),
            temperature: crate::domain::DEFAULT_TEMPERATURE,
            top_p: crate::domain::DEFAULT_TOP_P,
            timeout_secs: 120,
            history_window: None,
            no_recover: false,
            mock_provider: false,
        }
    }
}

/// Wires the provider client, the session configuration and the generation
/// parameters from command-line settings.
pub struct Container {
    client: Arc<dyn CompletionClient>,
    session_config: SessionConfig,
    params: GenerationParameters,
    profile: AssistantProfile,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self, DomainError> {
        let params = GenerationParameters::new(config.model, config.temperature, config.top_p)?;

        let client: Arc<dyn CompletionClient> = if config.mock_provider {
            debug!("Using mock completion client");
            Arc::new(MockCompletion::new())
        } else {
            let client = ReplicateClient::from_env();
            debug!("Using Replicate at {}", client.base_url());
            Arc::new(client)
        };

        let policy = if config.no_recover {
            ProviderErrorPolicy::Propagate
        } else {
            ProviderErrorPolicy::Apologize
        };
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));

        let session_config = session_config_for(config.profile)
            .with_error_policy(policy)
            .with_request_timeout(timeout)
            .with_history_window(config.history_window);

        debug!("Session configuration: {:?}", session_config);

        Ok(Self {
            client,
            session_config,
            params,
            profile: config.profile,
        })
    }

    pub fn chat_session(&self) -> ChatSession {
        ChatSession::new(
            self.session_config.clone(),
            Arc::clone(&self.client),
            self.params,
        )
    }

    pub fn profile(&self) -> AssistantProfile {
        self.profile
    }
}

/// Session configuration preset for an assistant profile: its system prompt,
/// plus the keyword domain filter for `strict`.
pub fn session_config_for(profile: AssistantProfile) -> SessionConfig {
    let config = SessionConfig::new(profile.system_prompt());
    if profile.uses_domain_filter() {
        config.with_domain_filter(Arc::new(KeywordDomainFilter::new()))
    } else {
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_profile_gets_filter() {
        assert!(session_config_for(AssistantProfile::Strict).has_domain_filter());
        assert!(!session_config_for(AssistantProfile::Open).has_domain_filter());
    }

    #[test]
    fn zero_timeout_disables_deadline() {
        let container = Container::new(ContainerConfig {
            timeout_secs: 0,
            mock_provider: true,
            ..ContainerConfig::default()
        })
        .unwrap();

        let session = container.chat_session();
        assert!(session.config().request_timeout().is_none());
        assert_eq!(session.provider_name(), "mock");
    }

    #[test]
    fn no_recover_selects_propagate() {
        let container = Container::new(ContainerConfig {
            no_recover: true,
            mock_provider: true,
            ..ContainerConfig::default()
        })
        .unwrap();

        assert_eq!(
            container.chat_session().config().error_policy(),
            ProviderErrorPolicy::Propagate
        );
    }

    #[test]
    fn rejects_out_of_range_parameters() {
        let result = Container::new(ContainerConfig {
            temperature: 3.0,
            mock_provider: true,
            ..ContainerConfig::default()
        });

        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
    }
}
