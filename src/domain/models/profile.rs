use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Committed instead of a model reply when the domain filter rejects a message.
pub const REFUSAL_MESSAGE: &str = "❌ Sorry, I can only help with medical-related queries.";

/// Committed instead of a model reply when the provider call fails.
pub const APOLOGY_MESSAGE: &str = "I'm sorry, something went wrong. Please try again later.";

const OPEN_SYSTEM_PROMPT: &str = "You are a professional medical assistant. \
You help users by giving information related to general health, symptoms, medications, mental wellness, \
and basic first aid. You do not provide diagnosis or prescribe medications. \
Always suggest consulting a certified doctor for serious issues.";

const STRICT_SYSTEM_PROMPT: &str = "You are a professional medical assistant. \
You only answer questions about general health, symptoms, medications, mental wellness and basic first aid. \
If a question is not related to health or medicine, do not answer it and reply with exactly: \
\"❌ Sorry, I can only help with medical-related queries.\" \
You do not provide diagnosis or prescribe medications. \
Always suggest consulting a certified doctor for serious issues.";

/// Assistant flavours the session can be configured with.
///
/// `Open` answers anything framed as a medical assistant; `Strict` also gates
/// input through the keyword domain filter and instructs the model to refuse
/// off-topic questions with [`REFUSAL_MESSAGE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AssistantProfile {
    #[default]
    Open,
    Strict,
}

impl AssistantProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantProfile::Open => "open",
            AssistantProfile::Strict => "strict",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            AssistantProfile::Open => OPEN_SYSTEM_PROMPT,
            AssistantProfile::Strict => STRICT_SYSTEM_PROMPT,
        }
    }

    pub fn uses_domain_filter(&self) -> bool {
        matches!(self, AssistantProfile::Strict)
    }
}

impl fmt::Display for AssistantProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssistantProfile {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "general" => Ok(AssistantProfile::Open),
            "strict" | "filtered" => Ok(AssistantProfile::Strict),
            other => Err(DomainError::invalid_input(format!(
                "unknown profile '{other}', expected 'open' or 'strict'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_prompt_names_refusal_literal() {
        assert!(AssistantProfile::Strict
            .system_prompt()
            .contains(REFUSAL_MESSAGE));
        assert!(!AssistantProfile::Open.system_prompt().contains(REFUSAL_MESSAGE));
    }

    #[test]
    fn only_strict_filters() {
        assert!(AssistantProfile::Strict.uses_domain_filter());
        assert!(!AssistantProfile::Open.uses_domain_filter());
    }

    #[test]
    fn parses_names() {
        assert_eq!("STRICT".parse::<AssistantProfile>().unwrap(), AssistantProfile::Strict);
        assert_eq!("open".parse::<AssistantProfile>().unwrap(), AssistantProfile::Open);
        assert!("lenient".parse::<AssistantProfile>().is_err());
    }
}
