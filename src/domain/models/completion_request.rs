use serde::Serialize;

use super::{GenerationParameters, ModelChoice};

/// Everything the provider needs for one completion call.
///
/// The system prompt travels twice: inline at the head of `prompt` and as the
/// structured `system_prompt` field. Both carry the same instructions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    model: ModelChoice,
    prompt: String,
    system_prompt: String,
    temperature: f64,
    top_p: f64,
}

impl CompletionRequest {
    pub fn new(
        prompt: impl Into<String>,
        system_prompt: impl Into<String>,
        params: &GenerationParameters,
    ) -> Self {
        Self {
            model: params.model(),
            prompt: prompt.into(),
            system_prompt: system_prompt.into(),
            temperature: params.temperature(),
            top_p: params.top_p(),
        }
    }

    pub fn model(&self) -> ModelChoice {
        self.model
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn top_p(&self) -> f64 {
        self.top_p
    }
}
