//! Processor configuration.
//!
//! Scoring constants are tuning knobs, not contracts: every one of them can be
//! overridden from a JSON file or from `MAMANBEBE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use validator::Validate;

use crate::error::AppError;
use crate::fs_manager::PortablePathManager;

/// Default values for [`ProcessorConfig`].
pub mod defaults {
    pub const ACCEPTANCE_THRESHOLD: f32 = 0.3;
    pub const LEXICAL_WEIGHT: f32 = 0.3;
    pub const SEMANTIC_WEIGHT: f32 = 0.7;
    pub const KEYWORD_BONUS: f32 = 0.15;
    pub const PRIORITY_TAG_BONUS: f32 = 0.10;
    pub const MIN_CANDIDATES: usize = 3;
    pub const MAX_QUICK_REPLIES: usize = 4;
    pub const EMBEDDING_CACHE_SIZE: usize = 512;
    pub const PRIORITY_TAGS: &[&str] = &["emergency", "urgent", "danger"];
}

/// Configuration of the health processor.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Where the intent records are read from.
    pub intents_path: PathBuf,
    /// A candidate must score strictly above this to be selected.
    #[validate(range(min = 0.0, max = 1.0))]
    pub acceptance_threshold: f32,
    /// Weight of the Jaccard score when a semantic score is available.
    #[validate(range(min = 0.0, max = 1.0))]
    pub lexical_weight: f32,
    /// Weight of the cosine score when a semantic score is available.
    #[validate(range(min = 0.0, max = 1.0))]
    pub semantic_weight: f32,
    /// Added once per intent keyword found in the normalized query.
    #[validate(range(min = 0.0, max = 1.0))]
    pub keyword_bonus: f32,
    /// Added when the intent tag is listed in `priority_tags`.
    #[validate(range(min = 0.0, max = 1.0))]
    pub priority_tag_bonus: f32,
    pub priority_tags: Vec<String>,
    /// Below this many indexed candidates the whole intent set is scored.
    pub min_candidates: usize,
    #[validate(range(min = 1, max = 4))]
    pub max_quick_replies: usize,
    /// Try to initialise the embedding backend at construction time.
    pub semantic_enabled: bool,
    pub embeddings_dir: PathBuf,
    #[validate(range(min = 1))]
    pub embedding_cache_size: usize,
    /// Seed for response selection; `None` draws from the thread RNG.
    pub rng_seed: Option<u64>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            intents_path: PortablePathManager::intents_path(),
            acceptance_threshold: defaults::ACCEPTANCE_THRESHOLD,
            lexical_weight: defaults::LEXICAL_WEIGHT,
            semantic_weight: defaults::SEMANTIC_WEIGHT,
            keyword_bonus: defaults::KEYWORD_BONUS,
            priority_tag_bonus: defaults::PRIORITY_TAG_BONUS,
            priority_tags: defaults::PRIORITY_TAGS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            min_candidates: defaults::MIN_CANDIDATES,
            max_quick_replies: defaults::MAX_QUICK_REPLIES,
            semantic_enabled: false,
            embeddings_dir: PortablePathManager::embeddings_dir(),
            embedding_cache_size: defaults::EMBEDDING_CACHE_SIZE,
            rng_seed: None,
        }
    }
}

impl ProcessorConfig {
    /// Reads a JSON config file. Missing keys take their default value.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {:?}: {}", path, e)))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a configuration from `.env` and `MAMANBEBE_*` variables.
    ///
    /// If `MAMANBEBE_CONFIG` names a JSON file it is used as the base; individual
    /// variables override it. Unparseable values are ignored with a warning, and
    /// an out-of-range result falls back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        let mut config = match env::var("MAMANBEBE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path)).unwrap_or_else(|e| {
                warn!("Ignoring config file {}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        };

        if let Ok(path) = env::var("MAMANBEBE_INTENTS_PATH") {
            config.intents_path = PathBuf::from(path);
        }
        if let Ok(dir) = env::var("MAMANBEBE_EMBEDDINGS_DIR") {
            config.embeddings_dir = PathBuf::from(dir);
        }
        override_from_env("MAMANBEBE_THRESHOLD", &mut config.acceptance_threshold);
        override_from_env("MAMANBEBE_LEXICAL_WEIGHT", &mut config.lexical_weight);
        override_from_env("MAMANBEBE_SEMANTIC_WEIGHT", &mut config.semantic_weight);
        override_from_env("MAMANBEBE_KEYWORD_BONUS", &mut config.keyword_bonus);
        override_from_env("MAMANBEBE_PRIORITY_TAG_BONUS", &mut config.priority_tag_bonus);
        override_from_env("MAMANBEBE_MIN_CANDIDATES", &mut config.min_candidates);
        override_from_env("MAMANBEBE_MAX_QUICK_REPLIES", &mut config.max_quick_replies);
        override_from_env("MAMANBEBE_SEMANTIC", &mut config.semantic_enabled);
        if let Ok(raw) = env::var("MAMANBEBE_RNG_SEED") {
            match raw.trim().parse::<u64>() {
                Ok(seed) => config.rng_seed = Some(seed),
                Err(_) => warn!("Ignoring MAMANBEBE_RNG_SEED={:?}: not a u64", raw),
            }
        }
        if let Ok(raw) = env::var("MAMANBEBE_PRIORITY_TAGS") {
            config.priority_tags = raw
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }

        if let Err(e) = config.validate() {
            warn!("Invalid processor configuration ({}), using defaults", e);
            return Self::default();
        }

        info!(
            "Processor config: intents={:?}, threshold={}, semantic={}",
            config.intents_path, config.acceptance_threshold, config.semantic_enabled
        );
        config
    }
}

fn override_from_env<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = env::var(key) {
        match raw.trim().parse::<T>() {
            Ok(value) => *target = value,
            Err(_) => warn!("Ignoring {}={:?}: unparseable value", key, raw),
        }
    }
}
