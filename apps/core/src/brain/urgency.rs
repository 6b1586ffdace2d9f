//! Urgency / emergency detection.
//!
//! Keyword and phrase based, deliberately conservative: over-triggering is the
//! acceptable failure mode. Runs on the raw lower-cased text before any intent
//! matching, and a `High` result pre-empts matching entirely.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use super::intent::Urgency;

/// Multi-word phrases that always mean an emergency.
const CRITICAL_PHRASES: &[&str] = &[
    // French
    "bébé ne bouge plus",
    "bébé ne bouge pas",
    "ne sens plus bébé",
    "ne sens plus le bébé",
    "ne sens plus mon bébé",
    "saignement abondant",
    "saignements abondants",
    "perte de liquide",
    "perte des eaux",
    "contractions régulières",
    "douleur intense",
    "difficulté à respirer",
    "ne respire plus",
    "perte de connaissance",
    "convulse",
    // English
    "baby not moving",
    "baby stopped moving",
    "heavy bleeding",
    "water broke",
    "can't breathe",
    "cannot breathe",
    "passed out",
];

/// Single-word stems; a word matches when it starts with the stem.
const EMERGENCY_KEYWORDS: &[&str] = &[
    "urgence",
    "urgent",
    "grave",
    "danger",
    "saignement",
    "saigne",
    "contraction",
    "hémorragie",
    "convulsion",
    "évanoui",
    "inconscient",
    "emergency",
    "bleeding",
    "seizure",
];

// NOTE: expect() is acceptable here: the patterns are constants.
static WARNING_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            "pain_location",
            Regex::new(r"\b(mal|douleurs?|pain|hurts?)\b.*\b(ventre|tête|poitrine|dos|bas-ventre|abdomen|belly|head|chest|back)\b")
                .expect("Invalid regex: pain location"),
        ),
        (
            "newborn_fever",
            Regex::new(r"\b(fièvre|température|fever)\b.*\b(nouveau-né|nourrisson|bébé|newborn|baby)\b|\b(nouveau-né|nourrisson|bébé|newborn|baby)\b.*\b(fièvre|température|fever)\b")
                .expect("Invalid regex: newborn fever"),
        ),
        (
            "swelling_headache",
            Regex::new(r"\b(gonflement|gonflée?s?|oedème|œdème|swelling|swollen)\b.*\b(maux de tête|migraine|vision|headache)\b")
                .expect("Invalid regex: swelling with headache"),
        ),
        (
            "persistent_vomiting",
            Regex::new(r"\b(vomi\w*|vomit\w*)\b.*\b(tout le temps|sans arrêt|plusieurs jours|ne garde rien|all day|constantly)\b")
                .expect("Invalid regex: persistent vomiting"),
        ),
    ]
});

/// What triggered an urgency level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum UrgencyTrigger {
    CriticalPhrase(String),
    EmergencyKeywords(Vec<String>),
    WarningPattern(String),
    None,
}

/// Result of urgency detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrgencyAssessment {
    pub level: Urgency,
    pub trigger: UrgencyTrigger,
}

impl UrgencyAssessment {
    pub fn is_emergency(&self) -> bool {
        self.level == Urgency::High
    }
}

/// Classifies raw text into low / medium / high urgency.
pub struct UrgencyDetector {
    critical_phrases: Vec<String>,
    emergency_keywords: Vec<String>,
}

impl Default for UrgencyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UrgencyDetector {
    pub fn new() -> Self {
        Self {
            critical_phrases: CRITICAL_PHRASES.iter().map(|s| s.to_string()).collect(),
            emergency_keywords: EMERGENCY_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn assess(&self, text: &str) -> UrgencyAssessment {
        // Apostrophes vary between keyboards.
        let lowered = text.to_lowercase().replace('’', "'");

        if let Some(phrase) = self
            .critical_phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
        {
            return UrgencyAssessment {
                level: Urgency::High,
                trigger: UrgencyTrigger::CriticalPhrase(phrase.clone()),
            };
        }

        let matched = self.matched_keywords(&lowered);
        match matched.len() {
            0 => {}
            1 => {
                return UrgencyAssessment {
                    level: Urgency::Medium,
                    trigger: UrgencyTrigger::EmergencyKeywords(matched),
                }
            }
            _ => {
                return UrgencyAssessment {
                    level: Urgency::High,
                    trigger: UrgencyTrigger::EmergencyKeywords(matched),
                }
            }
        }

        if let Some((name, _)) = WARNING_PATTERNS
            .iter()
            .find(|(_, pattern)| pattern.is_match(&lowered))
        {
            return UrgencyAssessment {
                level: Urgency::Medium,
                trigger: UrgencyTrigger::WarningPattern(name.to_string()),
            };
        }

        UrgencyAssessment {
            level: Urgency::Low,
            trigger: UrgencyTrigger::None,
        }
    }

    /// Shortcut returning only the level.
    pub fn detect(&self, text: &str) -> Urgency {
        self.assess(text).level
    }

    /// Distinct emergency keywords, in order of appearance. Each word counts for
    /// at most one keyword (the first stem it starts with).
    fn matched_keywords(&self, lowered: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut matched = Vec::new();

        for word in lowered
            .split(|c: char| !c.is_alphanumeric() && c != '-')
            .filter(|w| !w.is_empty())
        {
            if let Some(keyword) = self
                .emergency_keywords
                .iter()
                .find(|keyword| word.starts_with(keyword.as_str()))
            {
                if seen.insert(keyword.as_str()) {
                    matched.push(keyword.clone());
                }
            }
        }

        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_phrase_is_high() {
        let detector = UrgencyDetector::new();
        let result = detector.assess("Mon bébé ne bouge plus depuis ce matin");
        assert_eq!(result.level, Urgency::High);
        assert_eq!(
            result.trigger,
            UrgencyTrigger::CriticalPhrase("bébé ne bouge plus".to_string())
        );
        assert_eq!(detector.detect("HELP, baby not moving"), Urgency::High);
    }

    #[test]
    fn test_two_keywords_is_high() {
        let detector = UrgencyDetector::new();
        let result = detector.assess("C'est urgent, j'ai un saignement");
        assert_eq!(result.level, Urgency::High);
        assert_eq!(
            result.trigger,
            UrgencyTrigger::EmergencyKeywords(vec!["urgent".to_string(), "saignement".to_string()])
        );
    }

    #[test]
    fn test_single_keyword_is_medium() {
        let detector = UrgencyDetector::new();
        assert_eq!(detector.detect("J'ai eu quelques contractions"), Urgency::Medium);
        // Plural and singular forms are one keyword.
        assert_eq!(detector.detect("saignements légers"), Urgency::Medium);
    }

    #[test]
    fn test_warning_pattern_is_medium() {
        let detector = UrgencyDetector::new();
        let result = detector.assess("j'ai mal au ventre");
        assert_eq!(result.level, Urgency::Medium);
        assert_eq!(
            result.trigger,
            UrgencyTrigger::WarningPattern("pain_location".to_string())
        );
        assert_eq!(detector.detect("mon bébé a de la fièvre"), Urgency::Medium);
    }

    #[test]
    fn test_default_is_low() {
        let detector = UrgencyDetector::new();
        let result = detector.assess("Quels aliments privilégier pendant la grossesse ?");
        assert_eq!(result.level, Urgency::Low);
        assert_eq!(result.trigger, UrgencyTrigger::None);
        assert!(!result.is_emergency());
    }

    #[test]
    fn test_typographic_apostrophe() {
        let detector = UrgencyDetector::new();
        assert_eq!(detector.detect("J’ai une perte de liquide"), Urgency::High);
    }
}
