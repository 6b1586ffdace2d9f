//! Optional semantic similarity backend.
//!
//! Sentence embeddings come from FastEmbed (AllMiniLML6V2) when the `semantic`
//! feature is enabled and the model initialises. Query embeddings are memoised
//! in an LRU cache; pattern embeddings are computed once per intent snapshot.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::error::AppError;

/// Produces one vector per input text.
pub trait Embedder: Send + Sync {
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError>;
}

/// FastEmbed-backed embedder.
#[cfg(feature = "semantic")]
pub struct FastEmbedder {
    model: fastembed::TextEmbedding,
}

#[cfg(feature = "semantic")]
impl FastEmbedder {
    pub fn try_new(cache_dir: &Path) -> Result<Self, AppError> {
        use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

        let mut options = InitOptions::new(EmbeddingModel::AllMiniLML6V2);
        options.show_download_progress = false;
        options.cache_dir = cache_dir.to_path_buf();

        let model = TextEmbedding::try_new(options)
            .map_err(|e| AppError::ResourceUnavailable(format!("embedding model: {}", e)))?;
        tracing::info!("Embedding model loaded from {:?}", cache_dir);
        Ok(Self { model })
    }
}

#[cfg(feature = "semantic")]
impl Embedder for FastEmbedder {
    fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
        self.model
            .embed(texts, None)
            .map_err(|e| AppError::ResourceUnavailable(format!("embedding failed: {}", e)))
    }
}

/// Initialises the default embedding backend.
///
/// Fails with `ResourceUnavailable` when the crate was built without the
/// `semantic` feature or when the model cannot be loaded.
pub fn default_embedder(cache_dir: &Path) -> Result<Arc<dyn Embedder>, AppError> {
    #[cfg(feature = "semantic")]
    {
        let embedder = FastEmbedder::try_new(cache_dir)?;
        Ok(Arc::new(embedder))
    }

    #[cfg(not(feature = "semantic"))]
    {
        let _ = cache_dir;
        Err(AppError::ResourceUnavailable(
            "built without the `semantic` feature".to_string(),
        ))
    }
}

/// Wraps an embedder with an LRU cache keyed by the exact input text.
pub struct CachedEmbedder {
    inner: Arc<dyn Embedder>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn Embedder>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Embeds a single text, serving repeats from the cache.
    pub fn embed_one(&self, text: &str) -> Option<Vec<f32>> {
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(text) {
                return Some(hit.clone());
            }
        }

        let embedding = match self.inner.embed(vec![text.to_string()]) {
            Ok(mut embeddings) if !embeddings.is_empty() => embeddings.swap_remove(0),
            Ok(_) => {
                warn!("Empty embedding returned for query");
                return None;
            }
            Err(e) => {
                warn!("Query embedding failed, scoring lexically: {}", e);
                return None;
            }
        };

        if let Ok(mut cache) = self.cache.lock() {
            cache.put(text.to_string(), embedding.clone());
        }
        Some(embedding)
    }

    /// Embeds many texts in one batch, bypassing the cache.
    pub fn embed_batch(&self, texts: Vec<String>) -> Option<Vec<Vec<f32>>> {
        let expected = texts.len();
        match self.inner.embed(texts) {
            Ok(embeddings) if embeddings.len() == expected => {
                debug!("Embedded {} texts", expected);
                Some(embeddings)
            }
            Ok(embeddings) => {
                warn!(
                    "Embedding batch size mismatch: expected {}, got {}",
                    expected,
                    embeddings.len()
                );
                None
            }
            Err(e) => {
                warn!("Batch embedding failed: {}", e);
                None
            }
        }
    }
}

/// Calculate cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    impl Embedder for CountingEmbedder {
        fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _texts: Vec<String>) -> Result<Vec<Vec<f32>>, AppError> {
            Err(AppError::ResourceUnavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c) - 0.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cache_serves_repeats() {
        let inner = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedEmbedder::new(inner.clone(), 8);

        let first = cached.embed_one("nausées matin");
        let second = cached.embed_one("nausées matin");
        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.embed_one("vaccins");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failures_degrade_to_none() {
        let cached = CachedEmbedder::new(Arc::new(FailingEmbedder), 8);
        assert!(cached.embed_one("question").is_none());
        assert!(cached.embed_batch(vec!["a".to_string()]).is_none());
    }

    #[cfg(not(feature = "semantic"))]
    #[test]
    fn test_default_embedder_unavailable_without_feature() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            default_embedder(dir.path()),
            Err(AppError::ResourceUnavailable(_))
        ));
    }
}
