use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Models a session can be pointed at.
///
/// New entries only need a label, an identifier and a short key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelChoice {
    #[default]
    Llama3Instruct8b,
    Llama2Chat13b,
}

impl ModelChoice {
    pub const ALL: [ModelChoice; 2] = [ModelChoice::Llama3Instruct8b, ModelChoice::Llama2Chat13b];

    /// Human-facing name shown in the model picker.
    pub fn label(&self) -> &'static str {
        match self {
            ModelChoice::Llama3Instruct8b => "LLaMA 3 (8B Instruct)",
            ModelChoice::Llama2Chat13b => "LLaMA 2 (13B Chat)",
        }
    }

    /// Provider-side model identifier, `owner/name` or `owner/name:version`.
    pub fn identifier(&self) -> &'static str {
        match self {
            ModelChoice::Llama3Instruct8b => "meta/meta-llama-3-8b-instruct",
            ModelChoice::Llama2Chat13b => {
                "a16z-infra/llama13b-v2-chat:df7690f1994d94e96ad9d568eac121aecf50684a0b0963b25a41cc40061269e5"
            }
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            ModelChoice::Llama3Instruct8b => "llama3-8b",
            ModelChoice::Llama2Chat13b => "llama2-13b",
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ModelChoice {
    type Err = DomainError;

    /// Accepts the short key, the label or the full identifier, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ModelChoice::ALL
            .into_iter()
            .find(|m| {
                wanted.eq_ignore_ascii_case(m.key())
                    || wanted.eq_ignore_ascii_case(m.label())
                    || wanted.eq_ignore_ascii_case(m.identifier())
            })
            .ok_or_else(|| {
                let known: Vec<&str> = ModelChoice::ALL.iter().map(|m| m.key()).collect();
                DomainError::invalid_input(format!(
                    "unknown model '{}', expected one of: {}",
                    wanted,
                    known.join(", ")
                ))
            })
    }
}
