//! Random-walk node embedding training.
//!
//! Trains a pair of embedding tables (central and contextual) over the walks
//! produced by `wander-core`, under one of three objectives:
//!
//! - **SkipGram**: predict context nodes from a center, with negative sampling
//! - **CBOW**: predict a center from the mean of its context
//! - **GloVe**: weighted least squares on log co-occurrence counts
//!
//! crossed with four walk schedules (DeepWalk, Node2Vec, Walklets,
//! DreamWalk). Tables live on the heap or in memory-mapped files for graphs
//! whose embeddings exceed RAM.
//!
//! # Example
//!
//! ```rust
//! use wander_core::WalkGraph;
//! use wander_embed::{EmbeddingConfig, NodeEmbedder, Objective, WalkStrategy};
//!
//! let mut graph = WalkGraph::with_nodes(4);
//! for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 0)] {
//!     graph.add_edge(a, b).unwrap();
//!     graph.add_edge(b, a).unwrap();
//! }
//!
//! let config = EmbeddingConfig::new(WalkStrategy::DeepWalk, Objective::SkipGram)
//!     .with_embedding_size(16)
//!     .with_epochs(2)
//!     .with_seed(42);
//!
//! let output = NodeEmbedder::new(config).fit(&graph).unwrap();
//! let embedding = output.as_f32().unwrap();
//! assert_eq!(embedding.tables[0].dim(), 16);
//! ```

mod config;
mod error;
mod pipeline;
mod storage;
mod trainer;

pub mod context;

pub use config::{EmbeddingConfig, Objective, Precision, WalkStrategy};
pub use error::{Error, Result};
pub use pipeline::{EmbeddingOutput, FitResult, NodeEmbedder};
pub use storage::{
    EmbeddingStorage, EmbeddingTable, HeapStorage, MmapStorage, Scalar, TableRole,
};

// Re-export the graph substrate so callers need only one crate.
pub use wander_core::{self, WalkGraph};
