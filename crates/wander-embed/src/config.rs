//! Typed configuration for embedding runs.
//!
//! Every (walk strategy × training objective) combination is expressed
//! through the closed [`WalkStrategy`] and [`Objective`] enums, so unknown
//! combinations are unrepresentable. All parameters are validated together
//! by [`EmbeddingConfig::validate`] before any walk or allocation happens.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use wander_core::algo::random_walk::WalkConfig;

/// Training objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Objective {
    /// Predict a center node from the mean of its context embeddings.
    Cbow,
    /// Predict context nodes from a center node, with negative sampling.
    SkipGram,
    /// Weighted least squares on log co-occurrence counts.
    GloVe,
}

/// Walk scheduling strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalkStrategy {
    /// Unbiased walks: return and explore weights forced to 1.
    DeepWalk,
    /// Biased second-order walks using the configured return/explore weights.
    Node2Vec,
    /// Node2Vec walks expanded into strided sub-walks before context
    /// extraction, capturing multi-scale structure.
    Walklets,
    /// Node2Vec walks with destination-degree normalization forced on.
    DreamWalk,
}

/// Numeric precision of the embedding tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    /// 32-bit floats: half the memory, reduced numeric accuracy.
    F32,
    /// 64-bit floats.
    F64,
}

/// Configuration for an embedding run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Dimension of the embedding (default: 100).
    pub embedding_size: usize,
    /// Number of training epochs; each epoch walks every node once (default: 10).
    pub epochs: usize,
    /// Context window size, trimmed at walk boundaries (default: 5).
    pub window_size: usize,
    /// Initial learning rate (default: 0.025).
    pub learning_rate: f32,
    /// Multiplier applied to the learning rate after each epoch, in (0, 1]
    /// (default: 0.9).
    pub learning_rate_decay: f32,
    /// Negative samples per positive pair for CBOW/SkipGram (default: 5).
    pub negative_samples: usize,
    /// GloVe loss-weighting exponent (default: 0.75). Unused by CBOW/SkipGram.
    pub alpha: f32,
    /// GloVe loss-weighting cap (default: 100.0). Unused by CBOW/SkipGram.
    pub x_max: f32,
    /// Storage precision of the embedding tables (default: f32).
    pub dtype: Precision,
    /// Training objective.
    pub objective: Objective,
    /// Walk scheduling strategy.
    pub strategy: WalkStrategy,
    /// Walk generation parameters, including the master seed.
    pub walk: WalkConfig,
    /// Memory-map the central table to this path instead of the heap.
    pub central_embedding_path: Option<PathBuf>,
    /// Memory-map the contextual table to this path instead of the heap.
    pub contextual_embedding_path: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            embedding_size: 100,
            epochs: 10,
            window_size: 5,
            learning_rate: 0.025,
            learning_rate_decay: 0.9,
            negative_samples: 5,
            alpha: 0.75,
            x_max: 100.0,
            dtype: Precision::F32,
            objective: Objective::SkipGram,
            strategy: WalkStrategy::Node2Vec,
            walk: WalkConfig::default(),
            central_embedding_path: None,
            contextual_embedding_path: None,
        }
    }
}

impl EmbeddingConfig {
    /// Configuration for a given strategy/objective pair, otherwise default.
    pub fn new(strategy: WalkStrategy, objective: Objective) -> Self {
        Self {
            strategy,
            objective,
            ..Default::default()
        }
    }

    /// The minimal configuration used for smoke tests: one epoch, tiny
    /// embedding, short walks.
    pub fn smoke_test(strategy: WalkStrategy, objective: Objective) -> Self {
        Self {
            embedding_size: 5,
            epochs: 1,
            window_size: 1,
            walk: WalkConfig {
                walk_length: 4,
                max_neighbours: Some(10),
                ..WalkConfig::default()
            },
            strategy,
            objective,
            ..Default::default()
        }
    }

    /// The Node2Vec GloVe preset: exploratory walks, long walk budget.
    pub fn node2vec_glove() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.05,
            walk: WalkConfig {
                walk_length: 512,
                return_weight: 0.25,
                explore_weight: 4.0,
                max_neighbours: Some(100),
                ..WalkConfig::default()
            },
            objective: Objective::GloVe,
            strategy: WalkStrategy::Node2Vec,
            ..Default::default()
        }
    }

    pub fn with_embedding_size(mut self, size: usize) -> Self {
        self.embedding_size = size;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn with_learning_rate_decay(mut self, decay: f32) -> Self {
        self.learning_rate_decay = decay;
        self
    }

    pub fn with_negative_samples(mut self, n: usize) -> Self {
        self.negative_samples = n;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_dtype(mut self, dtype: Precision) -> Self {
        self.dtype = dtype;
        self
    }

    pub fn with_walk(mut self, walk: WalkConfig) -> Self {
        self.walk = walk;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.walk.seed = seed;
        self
    }

    /// Memory-map both embedding tables to the given file paths.
    pub fn with_mmap_paths(
        mut self,
        central: impl Into<PathBuf>,
        contextual: impl Into<PathBuf>,
    ) -> Self {
        self.central_embedding_path = Some(central.into());
        self.contextual_embedding_path = Some(contextual.into());
        self
    }

    /// Walk configuration with the strategy's overrides applied.
    pub fn effective_walk(&self) -> WalkConfig {
        let mut walk = self.walk.clone();
        match self.strategy {
            WalkStrategy::DeepWalk => {
                walk.return_weight = 1.0;
                walk.explore_weight = 1.0;
            }
            WalkStrategy::DreamWalk => {
                walk.normalize_by_degree = true;
            }
            WalkStrategy::Node2Vec | WalkStrategy::Walklets => {}
        }
        walk
    }

    /// Check every parameter is inside its valid domain.
    ///
    /// Called before any walk or table allocation; a failure here implies no
    /// side effects have occurred.
    pub fn validate(&self) -> Result<()> {
        if self.embedding_size == 0 {
            return Err(Error::Config("embedding_size must be positive".into()));
        }
        if self.epochs == 0 {
            return Err(Error::Config("epochs must be positive".into()));
        }
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(Error::Config(format!(
                "learning_rate must be strictly positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.learning_rate_decay > 0.0) || self.learning_rate_decay > 1.0 {
            return Err(Error::Config(format!(
                "learning_rate_decay must be in (0, 1], got {}",
                self.learning_rate_decay
            )));
        }
        match self.objective {
            Objective::Cbow | Objective::SkipGram => {
                if self.negative_samples == 0 {
                    return Err(Error::Config(
                        "negative_samples must be positive for CBOW/SkipGram".into(),
                    ));
                }
            }
            Objective::GloVe => {
                if !(self.alpha > 0.0) {
                    return Err(Error::Config(format!(
                        "alpha must be strictly positive, got {}",
                        self.alpha
                    )));
                }
                if !(self.x_max > 0.0) {
                    return Err(Error::Config(format!(
                        "x_max must be strictly positive, got {}",
                        self.x_max
                    )));
                }
            }
        }
        self.effective_walk()
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(())
    }
}
