//! End-to-end embedding pipeline.
//!
//! Drives walk generation, context extraction, and training against the
//! storage interface, one epoch at a time:
//!
//! ```text
//! WalkGraph -> WalkSampler -> context windows -> trainer -> EmbeddingTable pair
//! ```
//!
//! # Reproducibility
//!
//! Every stochastic draw flows from the configured seed: walks use one
//! deterministically seeded substream per (epoch, start node), and training
//! applies updates from a single thread in walk order. Two runs with the
//! same graph, configuration, and seed therefore produce bit-identical
//! tables (stronger than the tolerance-level agreement a parallel-update
//! scheme would give).

use crate::config::{EmbeddingConfig, Objective, Precision, WalkStrategy};
use crate::storage::{
    EmbeddingStorage, EmbeddingTable, HeapStorage, MmapStorage, Scalar, TableRole,
};
use crate::trainer::{
    accumulate_cooccurrence, visit_frequencies, GloveTrainer, NegativeTable, SgnsTrainer,
};
use crate::{Error, Result};
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use rand_xorshift::XorShiftRng;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use wander_core::algo::random_walk::{walklets_expand, WalkSampler};
use wander_core::WalkGraph;

/// Stream separator between walk generation and training draws.
const TRAIN_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Node embedding model over a walk graph.
///
/// Select the walk strategy, objective, and precision through
/// [`EmbeddingConfig`]; [`NodeEmbedder::fit`] runs the full pipeline and
/// returns the trained table pair.
///
/// # Example
///
/// ```rust
/// use wander_core::WalkGraph;
/// use wander_embed::{EmbeddingConfig, NodeEmbedder, Objective, WalkStrategy};
///
/// let mut graph = WalkGraph::with_nodes(5);
/// for i in 0..5 {
///     graph.add_edge(i, (i + 1) % 5).unwrap();
///     graph.add_edge((i + 1) % 5, i).unwrap();
/// }
///
/// let config = EmbeddingConfig::smoke_test(WalkStrategy::Node2Vec, Objective::SkipGram);
/// let output = NodeEmbedder::new(config).fit(&graph).unwrap();
/// let result = output.as_f32().unwrap();
/// assert_eq!(result.tables.len(), 2);
/// assert_eq!(result.tables[0].rows(), 5);
/// ```
pub struct NodeEmbedder {
    config: EmbeddingConfig,
}

/// Result of a fit at one precision.
#[derive(Debug)]
pub struct FitResult<T: Scalar> {
    /// The trained tables. CBOW returns (contextual, central); SkipGram and
    /// GloVe return (central, contextual).
    pub tables: Vec<EmbeddingTable<T>>,
    /// Mean training loss per epoch.
    pub loss_history: Vec<f64>,
    /// Number of walks sampled across all epochs.
    pub walks_generated: u64,
}

impl<T: Scalar> FitResult<T> {
    /// Find a table by role.
    pub fn table(&self, role: TableRole) -> Option<&EmbeddingTable<T>> {
        self.tables.iter().find(|t| t.role() == role)
    }
}

/// Fit result at the configured precision.
#[derive(Debug)]
pub enum EmbeddingOutput {
    F32(FitResult<f32>),
    F64(FitResult<f64>),
}

impl EmbeddingOutput {
    pub fn as_f32(&self) -> Option<&FitResult<f32>> {
        match self {
            Self::F32(r) => Some(r),
            Self::F64(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<&FitResult<f64>> {
        match self {
            Self::F64(r) => Some(r),
            Self::F32(_) => None,
        }
    }

    /// Mean training loss per epoch.
    pub fn loss_history(&self) -> &[f64] {
        match self {
            Self::F32(r) => &r.loss_history,
            Self::F64(r) => &r.loss_history,
        }
    }

    /// Number of walks sampled across all epochs.
    pub fn walks_generated(&self) -> u64 {
        match self {
            Self::F32(r) => r.walks_generated,
            Self::F64(r) => r.walks_generated,
        }
    }

    /// Roles of the returned tables, in output order.
    pub fn table_roles(&self) -> Vec<TableRole> {
        match self {
            Self::F32(r) => r.tables.iter().map(|t| t.role()).collect(),
            Self::F64(r) => r.tables.iter().map(|t| t.role()).collect(),
        }
    }
}

impl NodeEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Run the full pipeline on a graph.
    ///
    /// Validates the configuration and the graph's compatibility with it
    /// before any walk is generated or table allocated, so an `Err` from
    /// those phases implies no side effects.
    pub fn fit(&self, graph: &WalkGraph) -> Result<EmbeddingOutput> {
        self.config.validate()?;
        self.check_graph(graph)?;
        match self.config.dtype {
            Precision::F32 => Ok(EmbeddingOutput::F32(self.fit_typed::<f32>(graph)?)),
            Precision::F64 => Ok(EmbeddingOutput::F64(self.fit_typed::<f64>(graph)?)),
        }
    }

    /// Check the graph satisfies what the configuration enables.
    fn check_graph(&self, graph: &WalkGraph) -> Result<()> {
        let walk = self.config.effective_walk();
        if walk.use_edge_weights {
            graph
                .validate_positive_weights()
                .map_err(|e| Error::GraphConstraint(e.to_string()))?;
        }
        if (walk.change_node_type_weight - 1.0).abs() >= f32::EPSILON && !graph.has_node_types() {
            return Err(Error::GraphConstraint(
                wander_core::Error::MissingNodeTypes.to_string(),
            ));
        }
        if (walk.change_edge_type_weight - 1.0).abs() >= f32::EPSILON && !graph.has_edge_types() {
            return Err(Error::GraphConstraint(
                wander_core::Error::MissingEdgeTypes.to_string(),
            ));
        }
        Ok(())
    }

    fn fit_typed<T: Scalar>(&self, graph: &WalkGraph) -> Result<FitResult<T>> {
        let config = &self.config;
        let walk_config = config.effective_walk();
        let nodes = graph.node_count();
        let dim = config.embedding_size;

        let mut central =
            allocate::<T>(config.central_embedding_path.as_deref(), nodes, dim)?;
        let mut contextual =
            allocate::<T>(config.contextual_embedding_path.as_deref(), nodes, dim)?;

        // Central rows start uniform in [-0.5/dim, 0.5/dim]; the contextual
        // side starts at zero for the SGNS objectives and random for GloVe,
        // whose symmetric loss would otherwise leave it near-degenerate.
        let mut init_rng = XorShiftRng::seed_from_u64(walk_config.seed);
        let bound = 0.5 / dim as f64;
        let dist = Uniform::new(-bound, bound).expect("uniform bounds are finite and ordered");
        for node in 0..nodes {
            for value in central.row_mut(node) {
                *value = T::from_f64(dist.sample(&mut init_rng));
            }
        }
        if config.objective == Objective::GloVe {
            for node in 0..nodes {
                for value in contextual.row_mut(node) {
                    *value = T::from_f64(dist.sample(&mut init_rng));
                }
            }
        }

        let sampler = WalkSampler::new(graph, walk_config.clone());
        let mut learning_rate = f64::from(config.learning_rate);
        let mut loss_history = Vec::with_capacity(config.epochs);
        let mut walks_generated = 0u64;
        let mut negatives: Option<NegativeTable> = None;
        let (mut bias_central, mut bias_contextual) = if config.objective == Objective::GloVe {
            (vec![0.0f64; nodes], vec![0.0f64; nodes])
        } else {
            (Vec::new(), Vec::new())
        };

        for epoch in 0..config.epochs {
            let mut walks = sampler.walks_for_epoch(epoch);
            walks_generated += walks.len() as u64;
            if config.strategy == WalkStrategy::Walklets {
                // Order-preserving parallel expansion keeps training input
                // independent of the rayon schedule.
                walks = walks
                    .par_iter()
                    .flat_map_iter(|w| walklets_expand(w))
                    .collect();
            }

            let mut train_rng =
                XorShiftRng::seed_from_u64(walk_config.seed ^ TRAIN_STREAM ^ epoch as u64);

            let epoch_loss = match config.objective {
                Objective::SkipGram | Objective::Cbow => {
                    let negatives = &*negatives.get_or_insert_with(|| {
                        NegativeTable::from_frequencies(&visit_frequencies(&walks, nodes))
                    });
                    let mut trainer = SgnsTrainer {
                        central: &mut *central,
                        contextual: &mut *contextual,
                        negatives,
                        negative_samples: config.negative_samples,
                        learning_rate,
                    };
                    let mut loss = 0.0;
                    let mut examples = 0u64;
                    for walk in &walks {
                        let (l, n) = match config.objective {
                            Objective::SkipGram => trainer.train_walk_skipgram(
                                walk,
                                config.window_size,
                                &mut train_rng,
                            ),
                            _ => trainer.train_walk_cbow(walk, config.window_size, &mut train_rng),
                        };
                        loss += l;
                        examples += n;
                    }
                    loss / examples.max(1) as f64
                }
                Objective::GloVe => {
                    let mut counts = HashMap::new();
                    for walk in &walks {
                        accumulate_cooccurrence(&mut counts, walk, config.window_size);
                    }
                    let mut trainer = GloveTrainer::new(
                        &mut *central,
                        &mut *contextual,
                        &mut bias_central,
                        &mut bias_contextual,
                        f64::from(config.alpha),
                        f64::from(config.x_max),
                        learning_rate,
                    );
                    trainer.epoch(&counts, &mut train_rng)
                }
            };

            loss_history.push(epoch_loss);
            learning_rate *= f64::from(config.learning_rate_decay);
        }

        // Mapped tables become durable here; heap tables are a no-op.
        central.flush()?;
        contextual.flush()?;

        let central_table = EmbeddingTable::new(TableRole::Central, central);
        let contextual_table = EmbeddingTable::new(TableRole::Contextual, contextual);
        let tables = match config.objective {
            // Fixed output convention: CBOW presents the contextual table first.
            Objective::Cbow => vec![contextual_table, central_table],
            Objective::SkipGram | Objective::GloVe => vec![central_table, contextual_table],
        };

        Ok(FitResult { tables, loss_history, walks_generated })
    }
}

fn allocate<T: Scalar>(
    path: Option<&Path>,
    rows: usize,
    dim: usize,
) -> Result<Box<dyn EmbeddingStorage<T>>> {
    Ok(match path {
        Some(path) => Box::new(MmapStorage::create(path, rows, dim)?),
        None => Box::new(HeapStorage::new(rows, dim)?),
    })
}
