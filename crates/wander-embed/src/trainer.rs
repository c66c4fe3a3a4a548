//! Embedding objectives: skip-gram, CBOW, and GloVe.
//!
//! Walks are "sentences" and nodes are "words"; this is Word2Vec applied to
//! graphs, plus the GloVe count-factorization objective.
//!
//! # Skip-gram with negative sampling (SGNS)
//!
//! ```text
//! L = log sigma(v_ctx . v_center) + sum_k E[log sigma(-v_neg . v_center)]
//! ```
//!
//! Full softmax over all nodes is too expensive; negative sampling turns the
//! multinomial problem into binary classification between observed context
//! pairs and nodes drawn from the visit-frequency distribution. The 3/4
//! power on frequencies smooths between unigram (over-samples hubs) and
//! uniform (over-samples leaves), following the original Word2Vec.
//!
//! # CBOW
//!
//! The same binary objective, but the hidden vector is the mean of the
//! context nodes' central embeddings and the predicted node is the center.
//!
//! # GloVe
//!
//! Weighted least squares on log co-occurrence counts:
//!
//! ```text
//! L = sum_ij f(X_ij) (w_i . w~_j + b_i + b~_j - log X_ij)^2
//! f(x) = min(1, (x / x_max)^alpha)
//! ```
//!
//! Counts are accumulated symmetrically from walk windows, weighted by
//! 1/offset, and swept once per epoch in shuffled order.

use crate::context::{cbow_examples, context_pairs, CbowExample};
use crate::storage::{EmbeddingStorage, Scalar};
use rand::prelude::*;
use std::collections::HashMap;
use wander_core::NodeId;

/// Clamp for log arguments near 0 or 1.
const LOSS_EPS: f64 = 1e-12;

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Count node visits across a set of walks.
pub(crate) fn visit_frequencies(walks: &[Vec<NodeId>], nodes: usize) -> Vec<u64> {
    let mut freqs = vec![0u64; nodes];
    for walk in walks {
        for &node in walk {
            freqs[node as usize] += 1;
        }
    }
    freqs
}

/// Negative sampling table over the unigram^0.75 distribution.
pub(crate) struct NegativeTable {
    table: Vec<NodeId>,
}

impl NegativeTable {
    const TABLE_SIZE: usize = 1 << 20;

    /// Build the table from node visit frequencies.
    ///
    /// Falls back to uniform when no visits were recorded (isolated graphs).
    pub fn from_frequencies(frequencies: &[u64]) -> Self {
        let total: f64 = frequencies.iter().map(|&f| (f as f64).powf(0.75)).sum();
        if total <= 0.0 {
            let table = (0..frequencies.len() as NodeId).collect();
            return Self { table };
        }

        let mut table = Vec::with_capacity(Self::TABLE_SIZE);
        let mut cumulative = 0.0;
        for (node, &freq) in frequencies.iter().enumerate() {
            cumulative += (freq as f64).powf(0.75) / total;
            let filled = ((cumulative * Self::TABLE_SIZE as f64) as usize)
                .min(Self::TABLE_SIZE)
                .saturating_sub(table.len());
            table.extend(std::iter::repeat(node as NodeId).take(filled));
        }
        while table.len() < Self::TABLE_SIZE {
            table.push((frequencies.len() - 1) as NodeId);
        }
        Self { table }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> NodeId {
        self.table[rng.random_range(0..self.table.len())]
    }
}

/// One-epoch trainer for the SGNS objectives (SkipGram and CBOW).
///
/// Holds mutable views of the two tables for the duration of an epoch;
/// updates are applied in walk order from a single thread.
pub(crate) struct SgnsTrainer<'a, T: Scalar> {
    pub central: &'a mut dyn EmbeddingStorage<T>,
    pub contextual: &'a mut dyn EmbeddingStorage<T>,
    pub negatives: &'a NegativeTable,
    pub negative_samples: usize,
    pub learning_rate: f64,
}

impl<T: Scalar> SgnsTrainer<'_, T> {
    /// Train skip-gram on one walk. Returns (loss sum, example count).
    pub fn train_walk_skipgram<R: Rng>(
        &mut self,
        walk: &[NodeId],
        window_size: usize,
        rng: &mut R,
    ) -> (f64, u64) {
        let mut loss = 0.0;
        let mut examples = 0u64;
        for pair in context_pairs(walk, window_size) {
            loss += self.train_pair(pair.center as usize, pair.context as usize, true);
            examples += 1;
            for _ in 0..self.negative_samples {
                let neg = self.negatives.sample(rng);
                if neg != pair.context {
                    loss += self.train_pair(pair.center as usize, neg as usize, false);
                    examples += 1;
                }
            }
        }
        (loss, examples)
    }

    /// Train CBOW on one walk. Returns (loss sum, example count).
    pub fn train_walk_cbow<R: Rng>(
        &mut self,
        walk: &[NodeId],
        window_size: usize,
        rng: &mut R,
    ) -> (f64, u64) {
        let mut loss = 0.0;
        let mut examples = 0u64;
        for example in cbow_examples(walk, window_size) {
            loss += self.train_cbow_example(&example, rng);
            examples += 1;
        }
        (loss, examples)
    }

    /// One (center, target) update with the binary SGNS objective.
    ///
    /// Gradient step on sigma(v_center . v_target) toward label 1 (observed)
    /// or 0 (negative); both rows move.
    fn train_pair(&mut self, center: usize, target: usize, positive: bool) -> f64 {
        let dim = self.central.dim();
        let lr = self.learning_rate;

        let dot: f64 = {
            let c_row = self.central.row(center);
            let t_row = self.contextual.row(target);
            c_row
                .iter()
                .zip(t_row.iter())
                .map(|(&a, &b)| (a * b).to_f64())
                .sum()
        };

        let label = if positive { 1.0 } else { 0.0 };
        let sig = sigmoid(dot);
        let g = (label - sig) * lr;

        {
            let c_row = self.central.row_mut(center);
            let t_row = self.contextual.row_mut(target);
            for i in 0..dim {
                let c_val = c_row[i];
                let t_val = t_row[i];
                c_row[i] += T::from_f64(g) * t_val;
                t_row[i] += T::from_f64(g) * c_val;
            }
        }

        if positive {
            -(sig.max(LOSS_EPS)).ln()
        } else {
            -((1.0 - sig).max(LOSS_EPS)).ln()
        }
    }

    fn train_cbow_example<R: Rng>(&mut self, example: &CbowExample, rng: &mut R) -> f64 {
        let dim = self.central.dim();
        let lr = self.learning_rate;

        // Hidden vector: mean of the context nodes' central embeddings.
        let mut hidden = vec![0.0f64; dim];
        for &node in &example.context {
            for (h, &v) in hidden.iter_mut().zip(self.central.row(node as usize)) {
                *h += v.to_f64();
            }
        }
        let inv = 1.0 / example.context.len() as f64;
        for h in &mut hidden {
            *h *= inv;
        }

        let mut hidden_err = vec![0.0f64; dim];
        let mut loss = 0.0;

        // Center is the positive target, then sampled negatives.
        for k in 0..=self.negative_samples {
            let (target, label) = if k == 0 {
                (example.center, 1.0)
            } else {
                let neg = self.negatives.sample(rng);
                if neg == example.center {
                    continue;
                }
                (neg, 0.0)
            };

            let out = self.contextual.row_mut(target as usize);
            let dot: f64 = hidden.iter().zip(out.iter()).map(|(h, &o)| h * o.to_f64()).sum();
            let sig = sigmoid(dot);
            let g = (label - sig) * lr;
            for i in 0..dim {
                hidden_err[i] += g * out[i].to_f64();
                out[i] += T::from_f64(g * hidden[i]);
            }
            loss += if label > 0.5 {
                -(sig.max(LOSS_EPS)).ln()
            } else {
                -((1.0 - sig).max(LOSS_EPS)).ln()
            };
        }

        // Distribute the accumulated error to every context node.
        for &node in &example.context {
            let row = self.central.row_mut(node as usize);
            for i in 0..dim {
                row[i] += T::from_f64(hidden_err[i]);
            }
        }

        loss
    }
}

/// Accumulate symmetric, 1/offset-weighted co-occurrence counts from a walk.
pub(crate) fn accumulate_cooccurrence(
    counts: &mut HashMap<(NodeId, NodeId), f64>,
    walk: &[NodeId],
    window_size: usize,
) {
    for pair in context_pairs(walk, window_size) {
        *counts.entry((pair.center, pair.context)).or_insert(0.0) += 1.0 / pair.offset as f64;
    }
}

/// Per-epoch GloVe sweep over accumulated co-occurrence counts.
pub(crate) struct GloveTrainer<'a, T: Scalar> {
    pub central: &'a mut dyn EmbeddingStorage<T>,
    pub contextual: &'a mut dyn EmbeddingStorage<T>,
    pub bias_central: &'a mut [f64],
    pub bias_contextual: &'a mut [f64],
    pub alpha: f64,
    pub x_max: f64,
    pub learning_rate: f64,
    scratch_i: Vec<f64>,
    scratch_j: Vec<f64>,
}

impl<'a, T: Scalar> GloveTrainer<'a, T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        central: &'a mut dyn EmbeddingStorage<T>,
        contextual: &'a mut dyn EmbeddingStorage<T>,
        bias_central: &'a mut [f64],
        bias_contextual: &'a mut [f64],
        alpha: f64,
        x_max: f64,
        learning_rate: f64,
    ) -> Self {
        let dim = central.dim();
        Self {
            central,
            contextual,
            bias_central,
            bias_contextual,
            alpha,
            x_max,
            learning_rate,
            scratch_i: vec![0.0; dim],
            scratch_j: vec![0.0; dim],
        }
    }

    /// One sweep over the counts in shuffled order. Returns the mean loss.
    pub fn epoch<R: Rng>(
        &mut self,
        counts: &HashMap<(NodeId, NodeId), f64>,
        rng: &mut R,
    ) -> f64 {
        let mut entries: Vec<((NodeId, NodeId), f64)> =
            counts.iter().map(|(&k, &v)| (k, v)).collect();
        // Hash order is unstable across runs; sort before shuffling so the
        // sweep order depends only on the seed.
        entries.sort_unstable_by_key(|&(k, _)| k);
        entries.shuffle(rng);

        let mut loss = 0.0;
        for &((i, j), x) in &entries {
            loss += self.update(i as usize, j as usize, x);
        }
        loss / entries.len().max(1) as f64
    }

    /// Weighted least-squares step on one (i, j, X_ij) entry.
    fn update(&mut self, i: usize, j: usize, x: f64) -> f64 {
        let dim = self.central.dim();
        let lr = self.learning_rate;

        for (s, &v) in self.scratch_i.iter_mut().zip(self.central.row(i)) {
            *s = v.to_f64();
        }
        for (s, &v) in self.scratch_j.iter_mut().zip(self.contextual.row(j)) {
            *s = v.to_f64();
        }

        let dot: f64 = self.scratch_i.iter().zip(&self.scratch_j).map(|(a, b)| a * b).sum();
        let err = dot + self.bias_central[i] + self.bias_contextual[j] - x.ln();
        let weight = (x / self.x_max).powf(self.alpha).min(1.0);
        let g = weight * err * lr;

        {
            let row = self.central.row_mut(i);
            for k in 0..dim {
                row[k] -= T::from_f64(g * self.scratch_j[k]);
            }
        }
        {
            let row = self.contextual.row_mut(j);
            for k in 0..dim {
                row[k] -= T::from_f64(g * self.scratch_i[k]);
            }
        }
        self.bias_central[i] -= weight * err * lr;
        self.bias_contextual[j] -= weight * err * lr;

        weight * err * err
    }
}
