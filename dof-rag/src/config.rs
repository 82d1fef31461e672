//! Configuration for the retrieval core.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default location of the chunk store database file.
const DEFAULT_STORE_PATH: &str = "dof_db/db.sqlite3";

/// Default embedding dimensionality (Qwen3-Embedding-0.6B).
const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;

/// Default number of chunks retrieved per query.
const DEFAULT_TOP_K: usize = 5;

/// Configuration parameters for the retrieval core.
///
/// Construct one via [`RagConfig::builder()`] or [`RagConfig::from_env()`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Path of the SQLite chunk store file.
    pub store_path: PathBuf,
    /// Dimensionality of the stored embedding vectors.
    pub embedding_dimension: usize,
    /// Result limit used when a search does not specify one.
    pub default_top_k: usize,
    /// When set, searches serve synthetic data unconditionally and the store
    /// is never opened. Used for demos and tests without a store.
    pub force_synthetic: bool,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
            default_top_k: DEFAULT_TOP_K,
            force_synthetic: false,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Load configuration from the environment.
    ///
    /// Reads `DOF_DATABASE_PATH`, `DOF_EMBEDDING_DIMENSION`, `DOF_MAX_CHUNKS`,
    /// and `DOF_FORCE_SYNTHETIC`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a variable is present but malformed,
    /// or if the resulting configuration fails validation.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Ok(path) = env::var("DOF_DATABASE_PATH") {
            builder = builder.store_path(path);
        }
        if let Some(dimension) = read_env_usize("DOF_EMBEDDING_DIMENSION")? {
            builder = builder.embedding_dimension(dimension);
        }
        if let Some(top_k) = read_env_usize("DOF_MAX_CHUNKS")? {
            builder = builder.default_top_k(top_k);
        }
        if let Some(force) = read_env_bool("DOF_FORCE_SYNTHETIC")? {
            builder = builder.force_synthetic(force);
        }
        builder.build()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the path of the SQLite chunk store file.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Set the dimensionality of the stored embedding vectors.
    pub fn embedding_dimension(mut self, dimension: usize) -> Self {
        self.config.embedding_dimension = dimension;
        self
    }

    /// Set the result limit used when a search does not specify one.
    pub fn default_top_k(mut self, top_k: usize) -> Self {
        self.config.default_top_k = top_k;
        self
    }

    /// Force synthetic search results regardless of store availability.
    pub fn force_synthetic(mut self, force: bool) -> Self {
        self.config.force_synthetic = force;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `embedding_dimension == 0`
    /// - `default_top_k == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.embedding_dimension == 0 {
            return Err(RagError::Config(
                "embedding_dimension must be greater than zero".to_string(),
            ));
        }
        if self.config.default_top_k == 0 {
            return Err(RagError::Config(
                "default_top_k must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

fn read_env_usize(name: &str) -> Result<Option<usize>> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<usize>().map(Some).map_err(|_| {
            RagError::Config(format!("{name} must be a non-negative integer, got '{raw}'"))
        }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(RagError::Config(format!("{name}: {e}"))),
    }
}

fn read_env_bool(name: &str) -> Result<Option<bool>> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" | "" => Ok(Some(false)),
            other => Err(RagError::Config(format!("{name} must be a boolean, got '{other}'"))),
        },
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(RagError::Config(format!("{name}: {e}"))),
    }
}
