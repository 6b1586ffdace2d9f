//! Intent scoring and selection.
//!
//! Candidates come from the keyword index; when the index yields too few, the
//! whole collection is scored. Each candidate scores the best of its patterns,
//! plus fixed bonuses for literal keywords and priority tags. The strictly
//! highest score above the acceptance threshold wins, and ties go to the
//! candidate seen first (lowest intent position).

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::index::KeywordIndex;
use super::intent::Intent;
use super::keywords;
use super::scorer::{PreparedPattern, PreparedQuery, Scorer};
use crate::config::ProcessorConfig;

/// Per-intent data derived at snapshot build time.
#[derive(Debug, Clone)]
struct CompiledIntent {
    patterns: Vec<PreparedPattern>,
    keywords: Vec<String>,
}

/// An immutable intent collection together with everything derived from it.
#[derive(Debug, Clone)]
pub struct IntentSnapshot {
    intents: Vec<Intent>,
    compiled: Vec<CompiledIntent>,
    index: KeywordIndex,
}

impl IntentSnapshot {
    /// Builds the index and prepares every pattern for `scorer`.
    pub fn build(intents: Vec<Intent>, scorer: &dyn Scorer) -> Self {
        let all_patterns: Vec<String> = intents
            .iter()
            .flat_map(|intent| intent.patterns.iter().cloned())
            .collect();
        let mut embeddings = scorer.embed_patterns(&all_patterns).into_iter();

        let compiled = intents
            .iter()
            .map(|intent| CompiledIntent {
                patterns: intent
                    .patterns
                    .iter()
                    .map(|pattern| PreparedPattern {
                        tokens: keywords::tokenize(pattern).into_iter().collect(),
                        embedding: embeddings.next().flatten(),
                    })
                    .collect(),
                keywords: compile_keywords(intent),
            })
            .collect();

        let index = KeywordIndex::build(&intents);
        debug!(
            "Built intent snapshot: {} intents, {} index entries",
            intents.len(),
            index.len()
        );

        Self {
            intents,
            compiled,
            index,
        }
    }

    pub fn empty() -> Self {
        Self {
            intents: Vec::new(),
            compiled: Vec::new(),
            index: KeywordIndex::default(),
        }
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn intent(&self, idx: usize) -> Option<&Intent> {
        self.intents.get(idx)
    }

    pub fn index(&self) -> &KeywordIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}

/// Keywords in normalized form, so they compare against the normalized query.
/// A keyword made only of stop words or short tokens can never match and is dropped.
fn compile_keywords(intent: &Intent) -> Vec<String> {
    intent
        .keywords
        .iter()
        .filter_map(|keyword| {
            let normalized = keywords::normalize(keyword);
            if normalized.is_empty() {
                warn!(
                    "Intent {:?}: keyword {:?} has no matchable token, ignored",
                    intent.tag, keyword
                );
                None
            } else {
                Some(normalized)
            }
        })
        .collect()
}

/// Tunables of the matcher, taken from [`ProcessorConfig`].
#[derive(Debug, Clone)]
pub struct MatchParams {
    pub acceptance_threshold: f32,
    pub keyword_bonus: f32,
    pub priority_tag_bonus: f32,
    pub priority_tags: HashSet<String>,
    pub min_candidates: usize,
}

impl From<&ProcessorConfig> for MatchParams {
    fn from(config: &ProcessorConfig) -> Self {
        Self {
            acceptance_threshold: config.acceptance_threshold,
            keyword_bonus: config.keyword_bonus,
            priority_tag_bonus: config.priority_tag_bonus,
            priority_tags: config.priority_tags.iter().map(|t| t.to_lowercase()).collect(),
            min_candidates: config.min_candidates,
        }
    }
}

impl Default for MatchParams {
    fn default() -> Self {
        Self::from(&ProcessorConfig::default())
    }
}

/// The selected intent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentMatch {
    /// Position of the intent in its snapshot.
    pub index: usize,
    /// Raw score, bonuses included (may exceed 1).
    pub score: f32,
    /// Score clamped to [0, 1].
    pub confidence: f32,
}

/// Everything the matcher learned about a query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub best: Option<IntentMatch>,
    /// Highest score seen, accepted or not.
    pub top_score: f32,
    pub candidates_scored: usize,
    /// True when the index produced too few candidates.
    pub full_scan: bool,
}

pub struct IntentMatcher {
    scorer: Arc<dyn Scorer>,
    params: MatchParams,
}

impl IntentMatcher {
    pub fn new(scorer: Arc<dyn Scorer>, params: MatchParams) -> Self {
        Self { scorer, params }
    }

    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }

    pub fn params(&self) -> &MatchParams {
        &self.params
    }

    /// Tokenizes and (optionally) embeds a query once for all candidates.
    pub fn prepare(&self, text: &str) -> (PreparedQuery, String) {
        let tokens = keywords::tokenize(text);
        let normalized = tokens.join(" ");
        let embedding = if tokens.is_empty() {
            None
        } else {
            self.scorer.embed_query(text.trim())
        };
        (
            PreparedQuery {
                tokens: tokens.into_iter().collect(),
                embedding,
            },
            normalized,
        )
    }

    /// Score of one intent: best pattern plus keyword and priority-tag bonuses.
    pub fn score_intent(
        &self,
        snapshot: &IntentSnapshot,
        idx: usize,
        query: &PreparedQuery,
        normalized: &str,
    ) -> f32 {
        let (Some(intent), Some(compiled)) = (snapshot.intents.get(idx), snapshot.compiled.get(idx))
        else {
            return 0.0;
        };

        let pattern_score = compiled
            .patterns
            .iter()
            .map(|pattern| self.scorer.score(query, pattern))
            .fold(0.0f32, f32::max);

        let keyword_hits = compiled
            .keywords
            .iter()
            .filter(|keyword| normalized.contains(keyword.as_str()))
            .count();

        let mut score = pattern_score + keyword_hits as f32 * self.params.keyword_bonus;
        if self.params.priority_tags.contains(&intent.tag.to_lowercase()) {
            score += self.params.priority_tag_bonus;
        }
        score
    }

    /// Selects the best intent for `text`, if any clears the threshold.
    pub fn find_best(&self, snapshot: &IntentSnapshot, text: &str) -> MatchOutcome {
        let (query, normalized) = self.prepare(text);

        let tokens: Vec<&String> = query.tokens.iter().collect();
        let indexed: Vec<usize> = snapshot
            .index
            .candidates(tokens.as_slice())
            .into_iter()
            .collect();
        let full_scan = indexed.len() < self.params.min_candidates;
        let candidates: Vec<usize> = if full_scan {
            (0..snapshot.len()).collect()
        } else {
            indexed
        };

        let mut best: Option<IntentMatch> = None;
        let mut top_score = 0.0f32;

        for &idx in &candidates {
            let score = self.score_intent(snapshot, idx, &query, &normalized);
            if score > top_score {
                top_score = score;
            }
            let beats_best = best.map_or(true, |b| score > b.score);
            if beats_best && score > self.params.acceptance_threshold {
                best = Some(IntentMatch {
                    index: idx,
                    score,
                    confidence: score.clamp(0.0, 1.0),
                });
            }
        }

        MatchOutcome {
            best,
            top_score,
            candidates_scored: candidates.len(),
            full_scan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::intent::Urgency;
    use crate::brain::scorer::LexicalScorer;

    fn intent(tag: &str, patterns: &[&str], keywords: &[&str]) -> Intent {
        Intent {
            tag: tag.to_string(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            category: "general".to_string(),
            urgency: Urgency::Low,
            responses: vec!["ok".to_string()],
        }
    }

    fn matcher() -> IntentMatcher {
        IntentMatcher::new(Arc::new(LexicalScorer), MatchParams::default())
    }

    fn sample() -> IntentSnapshot {
        IntentSnapshot::build(
            vec![
                intent("nausea", &["nausées matin", "envie de vomir"], &["nausée"]),
                intent("vaccination", &["calendrier vaccinal bébé"], &["vaccin"]),
                intent("sleep", &["sommeil bébé nuit"], &["sommeil"]),
                intent("nutrition", &["alimentation grossesse"], &["manger"]),
            ],
            &LexicalScorer,
        )
    }

    #[test]
    fn test_selects_matching_intent() {
        let snapshot = sample();
        let outcome = matcher().find_best(&snapshot, "J'ai des nausées le matin, est-ce normal ?");
        let best = outcome.best.expect("match");
        assert_eq!(snapshot.intent(best.index).map(|i| i.tag.as_str()), Some("nausea"));
        // jaccard 2/3 + keyword bonus 0.15
        assert!((best.score - (2.0 / 3.0 + 0.15)).abs() < 1e-5);
        assert!(best.confidence > 0.3 && best.confidence <= 1.0);
    }

    #[test]
    fn test_no_match_below_threshold() {
        let snapshot = sample();
        let outcome = matcher().find_best(&snapshot, "xylophone quantique bleu");
        assert!(outcome.best.is_none());
        assert_eq!(outcome.top_score, 0.0);
        assert!(outcome.full_scan);
        assert_eq!(outcome.candidates_scored, 4);
    }

    #[test]
    fn test_sparse_index_falls_back_to_full_scan() {
        let snapshot = sample();
        let outcome = matcher().find_best(&snapshot, "sommeil");
        assert!(outcome.full_scan);
        assert_eq!(outcome.candidates_scored, snapshot.len());
    }

    #[test]
    fn test_tie_goes_to_first_intent() {
        let snapshot = IntentSnapshot::build(
            vec![
                intent("first", &["allaitement douleur"], &[]),
                intent("second", &["allaitement douleur"], &[]),
            ],
            &LexicalScorer,
        );
        let outcome = matcher().find_best(&snapshot, "allaitement douleur");
        assert_eq!(outcome.best.map(|b| b.index), Some(0));
    }

    #[test]
    fn test_priority_tag_bonus() {
        let snapshot = IntentSnapshot::build(
            vec![
                intent("fever", &["fièvre bébé"], &[]),
                intent("emergency", &["fièvre bébé"], &[]),
            ],
            &LexicalScorer,
        );
        let m = matcher();
        let (query, normalized) = m.prepare("fièvre bébé");
        let plain = m.score_intent(&snapshot, 0, &query, &normalized);
        let priority = m.score_intent(&snapshot, 1, &query, &normalized);
        assert!((priority - plain - 0.10).abs() < 1e-5);
        assert_eq!(m.find_best(&snapshot, "fièvre bébé").best.map(|b| b.index), Some(1));
    }

    #[test]
    fn test_keyword_bonus_per_keyword() {
        let snapshot = IntentSnapshot::build(
            vec![intent("breastfeeding", &["tétée"], &["allaitement", "sein"])],
            &LexicalScorer,
        );
        let m = matcher();
        let (query, normalized) = m.prepare("allaitement sein gauche");
        let score = m.score_intent(&snapshot, 0, &query, &normalized);
        assert!((score - 0.30).abs() < 1e-5);
    }

    #[test]
    fn test_superset_query_outscores_disjoint_intents() {
        let snapshot = sample();
        let m = matcher();
        let text = "calendrier vaccinal bébé rappel";
        let (query, normalized) = m.prepare(text);
        let target = m.score_intent(&snapshot, 1, &query, &normalized);
        let nutrition = m.score_intent(&snapshot, 3, &query, &normalized);
        assert!(target >= nutrition);
        assert_eq!(m.find_best(&snapshot, text).best.map(|b| b.index), Some(1));
    }

    #[test]
    fn test_empty_snapshot() {
        let outcome = matcher().find_best(&IntentSnapshot::empty(), "bonjour");
        assert!(outcome.best.is_none());
        assert_eq!(outcome.candidates_scored, 0);
    }

    #[test]
    fn test_multi_word_keyword_earns_bonus() {
        let snapshot = IntentSnapshot::build(
            vec![intent("back_pain", &["douleur lombaire"], &["mal de dos", "rendez-vous"])],
            &LexicalScorer,
        );
        let m = matcher();
        let (query, normalized) = m.prepare("J'ai mal de dos, je prends rendez-vous ?");
        let score = m.score_intent(&snapshot, 0, &query, &normalized);
        assert!((score - 0.30).abs() < 1e-5);
    }

    #[test]
    fn test_stopword_only_keyword_is_ignored() {
        let snapshot = IntentSnapshot::build(
            vec![intent("odd", &["douleur lombaire"], &["de la", "pour"])],
            &LexicalScorer,
        );
        let m = matcher();
        let (query, normalized) = m.prepare("douleur lombaire pour la nuit");
        let score = m.score_intent(&snapshot, 0, &query, &normalized);
        // jaccard {douleur, lombaire} vs {douleur, lombaire, nuit}, no bonus
        assert!((score - 2.0 / 3.0).abs() < 1e-5);
    }
}
