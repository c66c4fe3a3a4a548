//! Graph substrate and random walk sampling for node embeddings.
//!
//! This crate provides the two lower layers of the embedding engine:
//!
//! - [`WalkGraph`]: a dense-ID directed graph with optional edge weights,
//!   node types and edge types, built once and read-only during a run.
//! - [`algo::random_walk`]: biased second-order (Node2Vec-style) walk
//!   generation over that graph, parallelized per start node.
//!
//! Training on the generated walks lives in `wander-embed`.
//!
//! # Example
//!
//! ```rust
//! use wander_core::WalkGraph;
//! use wander_core::algo::random_walk::{WalkConfig, WalkSampler};
//!
//! let mut graph = WalkGraph::with_nodes(3);
//! graph.add_edge(0, 1).unwrap();
//! graph.add_edge(1, 2).unwrap();
//! graph.add_edge(2, 0).unwrap();
//!
//! let sampler = WalkSampler::new(&graph, WalkConfig::default());
//! let walks = sampler.walks_for_epoch(0);
//! assert_eq!(walks.len(), 3);
//! ```

mod error;
mod graph;

pub mod algo;

pub use error::{Error, Result};
pub use graph::{Neighbor, NodeId, TypeId, WalkGraph, WalkGraphStats};
