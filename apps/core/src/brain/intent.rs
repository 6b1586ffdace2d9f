//! Intent records and the fail-soft intent loader.
//!
//! Intents are reference data: they are read once from a JSON source, validated,
//! and never mutated afterwards. A reload produces a brand new collection.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};
use validator::Validate;

use crate::error::AppError;

/// Severity attached to a query or an intent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn label(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn default_category() -> String {
    "general".to_string()
}

/// A configured category of user question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Intent {
    #[validate(length(min = 1))]
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub urgency: Urgency,
    #[validate(length(min = 1))]
    pub responses: Vec<String>,
}

/// Accepted layouts of an intents document.
#[derive(Deserialize)]
#[serde(untagged)]
enum IntentDocument {
    Wrapped { intents: Vec<serde_json::Value> },
    Bare(Vec<serde_json::Value>),
}

/// Parses an intents document held in memory.
///
/// Records that fail to deserialize or validate are skipped; a duplicate tag
/// keeps the first record that used it. Only an unreadable document is an error.
pub fn parse_intents(raw: &str) -> Result<Vec<Intent>, AppError> {
    let document: IntentDocument = serde_json::from_str(raw)?;
    let records = match document {
        IntentDocument::Wrapped { intents } => intents,
        IntentDocument::Bare(intents) => intents,
    };

    let mut seen = HashSet::new();
    let mut intents = Vec::with_capacity(records.len());

    for (position, record) in records.into_iter().enumerate() {
        let mut intent: Intent = match serde_json::from_value(record) {
            Ok(intent) => intent,
            Err(e) => {
                warn!("Skipping intent #{}: {}", position, e);
                continue;
            }
        };
        intent.tag = intent.tag.trim().to_string();

        if let Err(e) = intent.validate() {
            warn!("Skipping intent #{} ({:?}): {}", position, intent.tag, e);
            continue;
        }
        if !seen.insert(intent.tag.clone()) {
            warn!("Skipping duplicate intent tag {:?}", intent.tag);
            continue;
        }
        intents.push(intent);
    }

    Ok(intents)
}

/// Loads intents from a JSON file.
pub fn load_intents(path: &Path) -> Result<Vec<Intent>, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("intents file {:?} unavailable: {}", path, e)))?;
    let intents = parse_intents(&raw)?;
    info!("Loaded {} intents from {:?}", intents.len(), path);
    Ok(intents)
}

/// Loads intents, recovering from a missing or malformed source with an empty set.
pub fn load_intents_or_empty(path: &Path) -> Vec<Intent> {
    match load_intents(path) {
        Ok(intents) => intents,
        Err(e) => {
            warn!("{}; falling back to default responses only", e);
            Vec::new()
        }
    }
}
