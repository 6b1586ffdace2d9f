//! Query Result - Output structures of the health processor.

use serde::{Deserialize, Serialize};

use super::intent::Urgency;

/// Tag reported when no intent was selected.
pub const UNKNOWN_TAG: &str = "unknown";
/// Tag and category reported for emergencies.
pub const EMERGENCY_TAG: &str = "emergency";
pub const GENERAL_CATEGORY: &str = "general";

/// Answer to one chat question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub response_text: String,
    pub urgency: Urgency,
    pub category: String,
    pub tag: String,
    /// How well the question matched `tag` (0.0 - 1.0)
    pub confidence: f32,
    pub processing_time_ms: f64,
    /// At most four short follow-up suggestions
    pub quick_replies: Vec<String>,
}

impl QueryResult {
    pub fn is_emergency(&self) -> bool {
        self.urgency == Urgency::High && self.category == EMERGENCY_TAG
    }

    pub fn is_unknown(&self) -> bool {
        self.tag == UNKNOWN_TAG
    }

    /// Get a summary for logging
    pub fn summary(&self) -> String {
        format!(
            "Tag: {} ({:.0}%), Category: {}, Urgency: {}, Quick replies: {}",
            self.tag,
            self.confidence * 100.0,
            self.category,
            self.urgency,
            self.quick_replies.len()
        )
    }
}

/// Field-renamed shape of [`QueryResult`] for older callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageReply {
    pub text: String,
    pub quick_replies: Vec<String>,
    pub urgency: Urgency,
    pub confidence: f32,
}

impl From<QueryResult> for (String, MessageReply) {
    fn from(result: QueryResult) -> Self {
        (
            result.tag,
            MessageReply {
                text: result.response_text,
                quick_replies: result.quick_replies,
                urgency: result.urgency,
                confidence: result.confidence,
            },
        )
    }
}
