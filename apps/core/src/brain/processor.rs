//! Health Processor - Main orchestrator of the brain module.
//!
//! Flow for one question:
//! 1. Empty text: fixed rephrase response, nothing else runs
//! 2. Urgency detection: an emergency returns the safety message immediately
//! 3. Intent matching against the current snapshot
//! 4. Response assembly (template, greeting, name, quick replies)
//!
//! Lifecycle: build once at startup with [`HealthProcessor::from_config`], share
//! it (it is `Send + Sync`), optionally [`HealthProcessor::reload`] to swap in a
//! new intent snapshot, drop on shutdown.

use chrono::{Local, Timelike};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::intent::{self, Intent, Urgency};
use super::matcher::{IntentMatcher, IntentSnapshot, MatchParams};
use super::query_result::{
    MessageReply, QueryResult, EMERGENCY_TAG, GENERAL_CATEGORY, UNKNOWN_TAG,
};
use super::responder;
use super::scorer::{LexicalPlusSemanticScorer, LexicalScorer, Scorer};
use super::semantic_intent::{self, Embedder};
use super::urgency::UrgencyDetector;
use crate::config::ProcessorConfig;
use crate::error::AppError;

/// Who is asking. Both fields are optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryContext {
    pub user_id: Option<String>,
    /// Substituted for `{name}` in response templates.
    pub display_name: Option<String>,
}

impl QueryContext {
    pub fn for_user(user_id: Option<&str>) -> Self {
        Self {
            user_id: user_id.map(str::to_string),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Outcome of the deterministic part of processing one question.
enum Resolution {
    Rephrase,
    Emergency,
    Matched {
        snapshot: Arc<IntentSnapshot>,
        index: usize,
        confidence: f32,
        detected: Urgency,
    },
    Unmatched {
        detected: Urgency,
    },
}

/// Maternal and child health question processor.
pub struct HealthProcessor {
    snapshot: RwLock<Arc<IntentSnapshot>>,
    matcher: IntentMatcher,
    detector: UrgencyDetector,
    max_quick_replies: usize,
    intents_path: PathBuf,
    rng: Option<Mutex<StdRng>>,
}

impl HealthProcessor {
    /// Builds a processor from configuration: picks the scoring strategy and
    /// loads intents from `config.intents_path` (an unreadable source yields an
    /// empty intent set).
    pub fn from_config(config: &ProcessorConfig) -> Self {
        let scorer = select_scorer(config);
        let intents = intent::load_intents_or_empty(&config.intents_path);
        Self::with_scorer(intents, config, scorer)
    }

    /// Builds a lexical-only processor over the given intents.
    pub fn new(intents: Vec<Intent>, config: &ProcessorConfig) -> Self {
        Self::with_scorer(intents, config, Arc::new(LexicalScorer))
    }

    /// Builds a processor with an explicit embedding backend.
    pub fn with_embedder(
        intents: Vec<Intent>,
        config: &ProcessorConfig,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        let scorer = Arc::new(LexicalPlusSemanticScorer::new(
            embedder,
            config.lexical_weight,
            config.semantic_weight,
            config.embedding_cache_size,
        ));
        Self::with_scorer(intents, config, scorer)
    }

    fn with_scorer(intents: Vec<Intent>, config: &ProcessorConfig, scorer: Arc<dyn Scorer>) -> Self {
        let snapshot = IntentSnapshot::build(intents, scorer.as_ref());
        info!(
            "Health processor ready: {} intents, scorer={}",
            snapshot.len(),
            scorer.name()
        );

        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
            matcher: IntentMatcher::new(scorer, MatchParams::from(config)),
            detector: UrgencyDetector::new(),
            max_quick_replies: config.max_quick_replies,
            intents_path: config.intents_path.clone(),
            rng: config.rng_seed.map(|seed| Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// The snapshot new queries will use.
    pub fn snapshot(&self) -> Arc<IntentSnapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn intent_count(&self) -> usize {
        self.snapshot().len()
    }

    pub fn scorer_name(&self) -> &'static str {
        self.matcher.scorer().name()
    }

    /// Replaces the intent set. The new snapshot is built before the swap;
    /// queries already running keep the snapshot they started with.
    pub fn reload(&self, intents: Vec<Intent>) -> usize {
        let snapshot = Arc::new(IntentSnapshot::build(intents, self.matcher.scorer()));
        let count = snapshot.len();
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
        info!("Intent snapshot swapped: {} intents", count);
        count
    }

    /// Reloads from a file. On failure the current snapshot stays in place.
    pub fn reload_from_path(&self, path: &Path) -> Result<usize, AppError> {
        let intents = intent::load_intents(path)?;
        Ok(self.reload(intents))
    }

    /// Reloads from the configured intents path.
    pub fn reload_from_config_path(&self) -> Result<usize, AppError> {
        self.reload_from_path(&self.intents_path)
    }

    /// Answers a question. Never fails: every problem degrades to a safe response.
    pub fn process_question(&self, text: Option<&str>, user_id: Option<&str>) -> QueryResult {
        self.process_question_with_context(text, &QueryContext::for_user(user_id))
    }

    /// Scoring runs without any lock; a seeded RNG is held only while the
    /// response text is picked.
    pub fn process_question_with_context(
        &self,
        text: Option<&str>,
        context: &QueryContext,
    ) -> QueryResult {
        let start = Instant::now();
        let resolution = self.resolve(text, context);

        let result = match &self.rng {
            Some(rng) => {
                let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
                self.render(resolution, context, &mut *guard)
            }
            None => self.render(resolution, context, &mut rand::thread_rng()),
        };
        finish(result, start)
    }

    /// Same as [`Self::process_question_with_context`] with a caller-supplied RNG.
    pub fn process_question_with_rng<R: Rng + ?Sized>(
        &self,
        text: Option<&str>,
        context: &QueryContext,
        rng: &mut R,
    ) -> QueryResult {
        let start = Instant::now();
        let resolution = self.resolve(text, context);
        finish(self.render(resolution, context, rng), start)
    }

    /// Validation, urgency detection and matching. Uses no randomness.
    fn resolve(&self, text: Option<&str>, context: &QueryContext) -> Resolution {
        let text = match validate_question(text) {
            Ok(text) => text,
            Err(_) => {
                debug!("Empty question from {:?}", context.user_id);
                return Resolution::Rephrase;
            }
        };

        let assessment = self.detector.assess(text);
        if assessment.is_emergency() {
            warn!(
                "Emergency detected for user {:?}: {:?}",
                context.user_id, assessment.trigger
            );
            return Resolution::Emergency;
        }

        let snapshot = self.snapshot();
        let outcome = self.matcher.find_best(&snapshot, text);
        debug!(
            "Top score {:.3} ({} candidates, full scan: {})",
            outcome.top_score, outcome.candidates_scored, outcome.full_scan
        );

        match outcome.best {
            Some(best) if snapshot.intent(best.index).is_some() => Resolution::Matched {
                snapshot,
                index: best.index,
                confidence: best.confidence,
                detected: assessment.level,
            },
            _ => Resolution::Unmatched {
                detected: assessment.level,
            },
        }
    }

    /// Builds the answer; only template and default choices draw from `rng`.
    fn render<R: Rng + ?Sized>(
        &self,
        resolution: Resolution,
        context: &QueryContext,
        rng: &mut R,
    ) -> QueryResult {
        match resolution {
            Resolution::Rephrase => QueryResult {
                response_text: responder::REPHRASE_RESPONSE.to_string(),
                urgency: Urgency::Low,
                category: GENERAL_CATEGORY.to_string(),
                tag: UNKNOWN_TAG.to_string(),
                confidence: 0.0,
                processing_time_ms: 0.0,
                quick_replies: responder::quick_replies_for(UNKNOWN_TAG, self.max_quick_replies),
            },
            Resolution::Emergency => self.emergency_result(),
            Resolution::Matched {
                snapshot,
                index,
                confidence,
                detected,
            } => match snapshot.intent(index) {
                Some(intent) => QueryResult {
                    response_text: responder::compose(
                        &intent.responses,
                        &intent.tag,
                        context.display_name.as_deref(),
                        Local::now().hour(),
                        rng,
                    ),
                    urgency: detected.max(intent.urgency),
                    category: intent.category.clone(),
                    tag: intent.tag.clone(),
                    confidence,
                    processing_time_ms: 0.0,
                    quick_replies: responder::quick_replies_for(
                        &intent.tag,
                        self.max_quick_replies,
                    ),
                },
                None => self.default_result(detected, rng),
            },
            Resolution::Unmatched { detected } => self.default_result(detected, rng),
        }
    }

    /// Compatibility wrapper: `(tag, {text, quick_replies, urgency, confidence})`.
    pub fn process_message(
        &self,
        text: Option<&str>,
        user_id: Option<&str>,
    ) -> (String, MessageReply) {
        self.process_question(text, user_id).into()
    }

    fn emergency_result(&self) -> QueryResult {
        QueryResult {
            response_text: responder::EMERGENCY_RESPONSE.to_string(),
            urgency: Urgency::High,
            category: EMERGENCY_TAG.to_string(),
            tag: EMERGENCY_TAG.to_string(),
            confidence: 1.0,
            processing_time_ms: 0.0,
            quick_replies: responder::emergency_quick_replies(),
        }
    }

    fn default_result<R: Rng + ?Sized>(&self, detected: Urgency, rng: &mut R) -> QueryResult {
        QueryResult {
            response_text: responder::choose_default(rng).to_string(),
            urgency: detected,
            category: GENERAL_CATEGORY.to_string(),
            tag: UNKNOWN_TAG.to_string(),
            confidence: 0.0,
            processing_time_ms: 0.0,
            quick_replies: responder::quick_replies_for(UNKNOWN_TAG, self.max_quick_replies),
        }
    }
}

/// Rejects missing and blank questions.
fn validate_question(text: Option<&str>) -> Result<&str, AppError> {
    match text.map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(AppError::EmptyInput),
    }
}

fn finish(mut result: QueryResult, start: Instant) -> QueryResult {
    result.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    result
}

/// Semantic scoring when enabled and the backend initialises, lexical otherwise.
fn select_scorer(config: &ProcessorConfig) -> Arc<dyn Scorer> {
    if !config.semantic_enabled {
        return Arc::new(LexicalScorer);
    }

    match semantic_intent::default_embedder(&config.embeddings_dir) {
        Ok(embedder) => Arc::new(LexicalPlusSemanticScorer::new(
            embedder,
            config.lexical_weight,
            config.semantic_weight,
            config.embedding_cache_size,
        )),
        Err(e) => {
            warn!("Semantic scoring disabled: {}", e);
            Arc::new(LexicalScorer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProcessorConfig {
        ProcessorConfig {
            rng_seed: Some(1),
            ..ProcessorConfig::default()
        }
    }

    fn intents() -> Vec<Intent> {
        intent::parse_intents(
            r#"[
                {"tag": "greeting", "patterns": ["bonjour", "salut"], "category": "general",
                 "responses": ["Comment puis-je vous aider {name} ?"]},
                {"tag": "nausea", "patterns": ["nausées matin"], "keywords": ["nausée"],
                 "category": "grossesse", "responses": ["Les nausées sont fréquentes."]}
            ]"#,
        )
        .expect("parse")
    }

    #[test]
    fn test_validate_question() {
        assert_eq!(validate_question(Some("  bonjour ")).ok(), Some("bonjour"));
        assert!(matches!(validate_question(Some("   ")), Err(AppError::EmptyInput)));
        assert!(matches!(validate_question(None), Err(AppError::EmptyInput)));
    }

    #[test]
    fn test_greeting_personalized() {
        let processor = HealthProcessor::new(intents(), &config());
        let context = QueryContext::for_user(Some("u1")).with_display_name("Awa");
        let result = processor.process_question_with_context(Some("Bonjour !"), &context);
        assert_eq!(result.tag, "greeting");
        assert!(result.response_text.contains("Awa"));
        assert!(
            result.response_text.starts_with("Bonjour !")
                || result.response_text.starts_with("Bonsoir !")
        );
    }

    #[test]
    fn test_semantic_disabled_selects_lexical() {
        let processor = HealthProcessor::from_config(&ProcessorConfig {
            intents_path: std::path::PathBuf::from("/nonexistent/intents.json"),
            semantic_enabled: false,
            ..config()
        });
        assert_eq!(processor.scorer_name(), "lexical");
        assert_eq!(processor.intent_count(), 0);
    }

    #[cfg(not(feature = "semantic"))]
    #[test]
    fn test_semantic_unavailable_degrades_to_lexical() {
        let processor = HealthProcessor::from_config(&ProcessorConfig {
            intents_path: std::path::PathBuf::from("/nonexistent/intents.json"),
            semantic_enabled: true,
            ..config()
        });
        assert_eq!(processor.scorer_name(), "lexical");
    }
}
