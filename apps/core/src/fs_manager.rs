use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MAMANBEBE_DATA_DIR";

/// Name of the intents file inside the data directory.
pub const INTENTS_FILENAME: &str = "intents.json";

pub struct PortablePathManager;

impl PortablePathManager {
    /// Root directory of the application.
    ///
    /// Debug builds point at the crate directory so `cargo run` finds the shipped
    /// `data/` folder; release builds use the directory of the executable.
    pub fn root_dir() -> PathBuf {
        if cfg!(debug_assertions) {
            return PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        }

        match std::env::current_exe() {
            Ok(mut path) => {
                path.pop();
                path
            }
            Err(e) => {
                warn!(
                    "Failed to get current exe path: {}. Falling back to current_dir.",
                    e
                );
                std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
            }
        }
    }

    /// Data directory (`./data`, or `$MAMANBEBE_DATA_DIR`).
    pub fn data_dir() -> PathBuf {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => Self::root_dir().join("data"),
        }
    }

    /// Default intents file (`./data/intents.json`).
    pub fn intents_path() -> PathBuf {
        Self::data_dir().join(INTENTS_FILENAME)
    }

    /// Embedding model cache (`./data/models/embeddings`).
    pub fn embeddings_dir() -> PathBuf {
        Self::data_dir().join("models").join("embeddings")
    }

    /// Creates the data and model cache directories if they don't exist.
    pub fn init() -> Result<(), std::io::Error> {
        let data_path = Self::data_dir();
        let embeddings_path = Self::embeddings_dir();

        if !data_path.exists() {
            info!("Creating data directory: {:?}", data_path);
            fs::create_dir_all(&data_path)?;
        }

        if !embeddings_path.exists() {
            info!("Creating embeddings cache directory: {:?}", embeddings_path);
            if let Err(e) = fs::create_dir_all(&embeddings_path) {
                // The cache is only needed by the semantic scorer.
                warn!("Could not create {:?}: {}", embeddings_path, e);
            }
        }

        Ok(())
    }
}
