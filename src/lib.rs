pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    ChatSession, CompletionClient, DomainFilter, FragmentStream,
    ProviderErrorPolicy, RecordingRenderer, ResponseRenderer, SessionConfig, SessionState,
    TurnOutcome,
};

pub use connector::{
    Container, ContainerConfig, KeywordDomainFilter, MockCompletion, ReplicateClient,
    TerminalChat, TerminalRenderer,
};

pub use domain::{
    AssistantProfile, CompletionRequest, Credential, DomainError, GenerationParameters, Message,
    ModelChoice, Role, Transcript,
};
