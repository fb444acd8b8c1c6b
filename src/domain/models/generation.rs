use std::ops::RangeInclusive;

use super::ModelChoice;
use crate::domain::DomainError;

pub const TEMPERATURE_RANGE: RangeInclusive<f64> = 0.01..=2.0;
pub const TOP_P_RANGE: RangeInclusive<f64> = 0.01..=1.0;
/// Slider granularity for both sampling knobs.
pub const PARAMETER_STEP: f64 = 0.01;

pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_TOP_P: f64 = 0.9;

/// Sampling settings sent with every completion request.
/// Only built through validated constructors, so it does not derive
/// `Deserialize`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParameters {
    model: ModelChoice,
    temperature: f64,
    top_p: f64,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self {
            model: ModelChoice::default(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
        }
    }
}

impl GenerationParameters {
    pub fn new(model: ModelChoice, temperature: f64, top_p: f64) -> Result<Self, DomainError> {
        Ok(Self {
            model,
            temperature: checked("temperature", temperature, &TEMPERATURE_RANGE)?,
            top_p: checked("top_p", top_p, &TOP_P_RANGE)?,
        })
    }

    pub fn with_model(mut self, model: ModelChoice) -> Self {
        self.model = model;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Result<Self, DomainError> {
        self.temperature = checked("temperature", temperature, &TEMPERATURE_RANGE)?;
        Ok(self)
    }

    pub fn with_top_p(mut self, top_p: f64) -> Result<Self, DomainError> {
        self.top_p = checked("top_p", top_p, &TOP_P_RANGE)?;
        Ok(self)
    }

    pub fn model(&self) -> ModelChoice {
        self.model
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn top_p(&self) -> f64 {
        self.top_p
    }
}

/// Snaps `value` to the slider step and checks it against `range`.
fn checked(name: &str, value: f64, range: &RangeInclusive<f64>) -> Result<f64, DomainError> {
    if !value.is_finite() {
        return Err(DomainError::invalid_input(format!("{name} must be a number")));
    }
    let steps = (value / PARAMETER_STEP).round();
    let snapped = steps / (1.0 / PARAMETER_STEP).round();
    if !range.contains(&snapped) {
        return Err(DomainError::invalid_input(format!(
            "{name} must be between {} and {}, got {value}",
            range.start(),
            range.end()
        )));
    }
    Ok(snapped)
}
