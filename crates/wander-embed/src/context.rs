//! Sliding-window context extraction over walks.
//!
//! A walk is treated the way word2vec treats a sentence: every position is a
//! center, and the positions within `window_size` of it (clipped at the walk
//! boundaries, no wraparound or padding) are its context. SkipGram and GloVe
//! consume individual (center, context) pairs; CBOW consumes one aggregated
//! example per center.

use wander_core::NodeId;

/// One (center, context) co-occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextPair {
    /// Node at the center of the window.
    pub center: NodeId,
    /// Node inside the window.
    pub context: NodeId,
    /// Distance between the two positions, at least 1.
    pub offset: usize,
}

/// All context pairs of a walk, in walk order (centers nearest the walk
/// start emitted first). Never pairs a position with itself.
pub fn context_pairs(walk: &[NodeId], window_size: usize) -> impl Iterator<Item = ContextPair> + '_ {
    (0..walk.len()).flat_map(move |pos| {
        let start = pos.saturating_sub(window_size);
        let end = (pos + window_size + 1).min(walk.len());
        (start..end).filter(move |&ctx| ctx != pos).map(move |ctx| ContextPair {
            center: walk[pos],
            context: walk[ctx],
            offset: pos.abs_diff(ctx),
        })
    })
}

/// One CBOW training example: a center and its full context window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CbowExample {
    /// Node to predict.
    pub center: NodeId,
    /// Context nodes, in walk order. Never empty.
    pub context: Vec<NodeId>,
}

/// Aggregated CBOW examples of a walk, in walk order. Centers whose clipped
/// window is empty (walks of one node, or `window_size == 0`) are skipped.
pub fn cbow_examples(walk: &[NodeId], window_size: usize) -> impl Iterator<Item = CbowExample> + '_ {
    (0..walk.len()).filter_map(move |pos| {
        let start = pos.saturating_sub(window_size);
        let end = (pos + window_size + 1).min(walk.len());
        let context: Vec<NodeId> = (start..end)
            .filter(|&ctx| ctx != pos)
            .map(|ctx| walk[ctx])
            .collect();
        if context.is_empty() {
            None
        } else {
            Some(CbowExample { center: walk[pos], context })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_clipped_at_boundaries() {
        let walk = vec![10, 11, 12, 13];
        let pairs: Vec<_> = context_pairs(&walk, 2).collect();

        // First center only looks right
        assert_eq!(pairs[0], ContextPair { center: 10, context: 11, offset: 1 });
        assert_eq!(pairs[1], ContextPair { center: 10, context: 12, offset: 2 });

        // No pair reaches beyond the window
        assert!(pairs.iter().all(|p| p.offset >= 1 && p.offset <= 2));
        // No self pairs
        assert!(pairs.iter().all(|p| {
            // Distinct positions, though node IDs may repeat in real walks
            p.offset != 0
        }));
    }

    #[test]
    fn test_pairs_full_window_count() {
        // Interior center of a length-5 walk with window 1: 2 contexts;
        // ends have 1 each. Total = 2 + 2*3 = 8.
        let walk = vec![0, 1, 2, 3, 4];
        assert_eq!(context_pairs(&walk, 1).count(), 8);
    }

    #[test]
    fn test_pairs_walk_order() {
        let walk = vec![5, 6, 7];
        let centers: Vec<_> = context_pairs(&walk, 1).map(|p| p.center).collect();
        assert_eq!(centers, vec![5, 6, 6, 7]);
    }

    #[test]
    fn test_window_zero_is_empty() {
        let walk = vec![0, 1, 2];
        assert_eq!(context_pairs(&walk, 0).count(), 0);
        assert_eq!(cbow_examples(&walk, 0).count(), 0);
    }

    #[test]
    fn test_single_node_walk() {
        let walk = vec![9];
        assert_eq!(context_pairs(&walk, 3).count(), 0);
        assert_eq!(cbow_examples(&walk, 3).count(), 0);
    }

    #[test]
    fn test_cbow_aggregation() {
        let walk = vec![0, 1, 2, 3];
        let examples: Vec<_> = cbow_examples(&walk, 1).collect();
        assert_eq!(examples.len(), 4);
        assert_eq!(examples[0], CbowExample { center: 0, context: vec![1] });
        assert_eq!(examples[1], CbowExample { center: 1, context: vec![0, 2] });
        assert_eq!(examples[3], CbowExample { center: 3, context: vec![2] });
    }

    #[test]
    fn test_pairs_symmetric_counts() {
        // Every (a, b) pair has a matching (b, a) at the same offset.
        let walk = vec![4, 2, 4, 8];
        let pairs: Vec<_> = context_pairs(&walk, 2).collect();
        for p in &pairs {
            assert!(
                pairs
                    .iter()
                    .any(|q| q.center == p.context && q.context == p.center && q.offset == p.offset),
                "missing mirror of {p:?}"
            );
        }
    }
}
