//! Pattern scoring strategies.
//!
//! The strategy is chosen once, when the processor is built: lexical only, or
//! lexical blended with embedding cosine similarity when an embedding backend
//! initialised. A failed query embedding falls back to the lexical score for
//! that query only.

use std::collections::HashSet;
use std::sync::Arc;

use super::semantic_intent::{cosine_similarity, CachedEmbedder, Embedder};

/// A query as seen by a scorer.
#[derive(Debug, Clone, Default)]
pub struct PreparedQuery {
    pub tokens: HashSet<String>,
    pub embedding: Option<Vec<f32>>,
}

/// A configured pattern as seen by a scorer.
#[derive(Debug, Clone, Default)]
pub struct PreparedPattern {
    pub tokens: HashSet<String>,
    pub embedding: Option<Vec<f32>>,
}

/// |Q ∩ P| / |Q ∪ P|, 0 when both sets are empty.
pub fn jaccard(query: &HashSet<String>, pattern: &HashSet<String>) -> f32 {
    let union = query.union(pattern).count();
    if union == 0 {
        return 0.0;
    }
    query.intersection(pattern).count() as f32 / union as f32
}

pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Embeddings for a snapshot's patterns, computed once per snapshot.
    /// `None` entries are scored lexically.
    fn embed_patterns(&self, patterns: &[String]) -> Vec<Option<Vec<f32>>> {
        vec![None; patterns.len()]
    }

    /// Query embedding, if this strategy uses one.
    fn embed_query(&self, _text: &str) -> Option<Vec<f32>> {
        None
    }

    fn score(&self, query: &PreparedQuery, pattern: &PreparedPattern) -> f32;
}

/// Jaccard overlap between token sets, weight 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl Scorer for LexicalScorer {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn score(&self, query: &PreparedQuery, pattern: &PreparedPattern) -> f32 {
        jaccard(&query.tokens, &pattern.tokens)
    }
}

/// `lexical_weight · jaccard + semantic_weight · cosine`.
pub struct LexicalPlusSemanticScorer {
    embedder: CachedEmbedder,
    lexical_weight: f32,
    semantic_weight: f32,
}

impl LexicalPlusSemanticScorer {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        lexical_weight: f32,
        semantic_weight: f32,
        cache_size: usize,
    ) -> Self {
        Self {
            embedder: CachedEmbedder::new(embedder, cache_size),
            lexical_weight,
            semantic_weight,
        }
    }
}

impl Scorer for LexicalPlusSemanticScorer {
    fn name(&self) -> &'static str {
        "lexical+semantic"
    }

    fn embed_patterns(&self, patterns: &[String]) -> Vec<Option<Vec<f32>>> {
        if patterns.is_empty() {
            return Vec::new();
        }
        match self.embedder.embed_batch(patterns.to_vec()) {
            Some(embeddings) => embeddings.into_iter().map(Some).collect(),
            None => vec![None; patterns.len()],
        }
    }

    fn embed_query(&self, text: &str) -> Option<Vec<f32>> {
        self.embedder.embed_one(text)
    }

    fn score(&self, query: &PreparedQuery, pattern: &PreparedPattern) -> f32 {
        let lexical = jaccard(&query.tokens, &pattern.tokens);
        match (&query.embedding, &pattern.embedding) {
            (Some(q), Some(p)) => {
                let semantic = cosine_similarity(q, p).clamp(0.0, 1.0);
                self.lexical_weight * lexical + self.semantic_weight * semantic
            }
            _ => lexical,
        }
    }
}
