use tracing::debug;

use crate::application::DomainFilter;

/// Health and medical vocabulary that marks a message as in scope.
///
/// Matched as plain substrings, so stems like "allerg" cover "allergy" and
/// "allergic". Keep entries long enough not to hit everyday words.
const MEDICAL_KEYWORDS: &[&str] = &[
    // general
    "health", "medical", "medicine", "medic", "doctor", "physician", "nurse", "hospital",
    "clinic", "patient", "symptom", "diagnos", "treatment", "illness", "disease",
    "condition", "wellness", "first aid",
    // symptoms
    "pain", "ache", "fever", "cough", "sneez", "sore throat", "nausea", "vomit", "diarrh",
    "constipat", "dizz", "fatigue", "tired", "rash", "itch", "swell", "bleed", "blood",
    "breath", "cramp", "migraine", "insomnia", "sleep",
    // conditions
    "infection", "virus", "bacteri", "flu", "covid", "allerg", "asthma", "diabet", "cancer",
    "tumor", "hypertension", "cholesterol", "arthritis", "injur", "wound", "burn", "fractur",
    "sprain", "pregnan", "period", "menstrua",
    // body
    "heart", "lung", "kidney", "liver", "stomach", "skin", "bone", "muscle", "joint", "knee",
    "back", "chest", "throat", "tooth", "teeth",
    // medication
    "medication", "drug", "pill", "tablet", "dose", "dosage", "prescription", "antibiotic",
    "vaccin", "ibuprofen", "paracetamol", "acetaminophen", "aspirin", "side effect",
    // mental
    "mental", "anxiety", "depress", "stress", "panic", "therap",
    // lifestyle
    "diet", "nutrition", "vitamin", "weight", "exercise", "hydrat",
];

/// A [`DomainFilter`] that accepts a message when any keyword occurs in it,
/// ignoring case.
///
/// A coarse heuristic rather than a classifier: "my laptop has a virus"
/// passes, "I keep throwing up" does not.
pub struct KeywordDomainFilter {
    keywords: Vec<String>,
}

impl Default for KeywordDomainFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordDomainFilter {
    pub fn new() -> Self {
        Self::with_keywords(MEDICAL_KEYWORDS.iter().copied())
    }

    /// Build a filter over a custom vocabulary. Blank keywords are dropped.
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

impl DomainFilter for KeywordDomainFilter {
    fn is_in_scope(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        let hit = self.keywords.iter().find(|k| lowered.contains(k.as_str()));
        if let Some(keyword) = hit {
            debug!("Domain filter matched keyword '{}'", keyword);
        }
        hit.is_some()
    }
}
