use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::brain::{QueryResult, Urgency};

/// Symptom vocabulary recorded with a consultation.
const SYMPTOM_KEYWORDS: &[&str] = &[
    "mal",
    "douleur",
    "fièvre",
    "toux",
    "fatigue",
    "nausée",
    "vomissement",
    "migraine",
    "brûlure",
    "crampe",
];

/// Characters of the question quoted in a health alert.
const ALERT_EXCERPT_CHARS: usize = 50;

/// User id recorded when the caller has no session.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Lifecycle state of a consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsultationStatus {
    /// Answered by the chatbot.
    Completed,
    /// Emergency: the caller should alert the user's contacts.
    Escalated,
}

/// One question/answer exchange, as stored by the chat API.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Consultation {
    /// The unique identifier for the consultation (UUID).
    pub id: String,
    #[validate(length(min = 1))]
    pub user_id: String,
    /// The question as typed by the user.
    #[validate(length(min = 1))]
    pub question: String,
    /// The text the chatbot answered with.
    pub response: String,
    pub urgency: Urgency,
    pub category: String,
    pub tag: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub confidence: f32,
    pub status: ConsultationStatus,
    /// Symptom words found in the question.
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// Follow-up suggestions offered with the answer.
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Consultation {
    /// Builds the record for `question` answered with `result`.
    pub fn from_result(question: &str, user_id: Option<&str>, result: &QueryResult) -> Self {
        let status = if result.urgency == Urgency::High {
            ConsultationStatus::Escalated
        } else {
            ConsultationStatus::Completed
        };

        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .unwrap_or(ANONYMOUS_USER)
                .to_string(),
            question: question.trim().to_string(),
            response: result.response_text.clone(),
            urgency: result.urgency,
            category: result.category.clone(),
            tag: result.tag.clone(),
            confidence: result.confidence,
            status,
            symptoms: extract_symptoms(question),
            recommendations: result.quick_replies.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn requires_escalation(&self) -> bool {
        self.status == ConsultationStatus::Escalated
    }

    /// Short alert text quoting the start of the question.
    pub fn alert_text(&self) -> String {
        let excerpt: String = self.question.chars().take(ALERT_EXCERPT_CHARS).collect();
        format!("🔔 Alerte Santé: {}...", excerpt)
    }
}

/// Symptom keywords present in `text`, in vocabulary order.
pub fn extract_symptoms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    SYMPTOM_KEYWORDS
        .iter()
        .filter(|symptom| lowered.contains(*symptom))
        .map(|symptom| symptom.to_string())
        .collect()
}
