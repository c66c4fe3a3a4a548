//! Property-based tests for context extraction and the pipeline.

use proptest::prelude::*;
use wander_core::WalkGraph;
use wander_embed::context::{cbow_examples, context_pairs};
use wander_embed::{EmbeddingConfig, NodeEmbedder, Objective, WalkStrategy};

mod context_props {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn pairs_stay_inside_window(
            walk in proptest::collection::vec(0u32..50, 1..30),
            window in 0usize..6,
        ) {
            for pair in context_pairs(&walk, window) {
                prop_assert!(pair.offset >= 1);
                prop_assert!(pair.offset <= window);
            }
        }

        #[test]
        fn pair_count_matches_position_arithmetic(
            walk in proptest::collection::vec(0u32..50, 1..30),
            window in 0usize..6,
        ) {
            // Independent count: for each position, the clipped window size.
            let expected: usize = (0..walk.len())
                .map(|pos| {
                    let start = pos.saturating_sub(window);
                    let end = (pos + window + 1).min(walk.len());
                    end - start - 1
                })
                .sum();
            prop_assert_eq!(context_pairs(&walk, window).count(), expected);
        }

        #[test]
        fn cbow_context_sizes_match_pairs(
            walk in proptest::collection::vec(0u32..50, 2..30),
            window in 1usize..6,
        ) {
            let pair_count = context_pairs(&walk, window).count();
            let aggregated: usize = cbow_examples(&walk, window)
                .map(|e| e.context.len())
                .sum();
            prop_assert_eq!(pair_count, aggregated);
        }
    }
}

mod pipeline_props {
    use super::*;

    fn arb_connected_graph() -> impl Strategy<Value = WalkGraph> {
        (2u32..8, proptest::collection::vec((0u32..8, 0u32..8), 0..16)).prop_map(
            |(n, extra)| {
                let mut graph = WalkGraph::with_nodes(n as usize);
                // Ring backbone keeps every node walkable
                for i in 0..n {
                    graph.add_edge(i, (i + 1) % n).unwrap();
                    graph.add_edge((i + 1) % n, i).unwrap();
                }
                for (a, b) in extra {
                    if a < n && b < n && a != b {
                        graph.add_edge(a, b).unwrap();
                    }
                }
                graph
            },
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(12))]

        #[test]
        fn fit_is_deterministic_and_well_shaped(
            graph in arb_connected_graph(),
            seed in any::<u64>(),
        ) {
            let nodes = graph.node_count();
            let config = EmbeddingConfig::smoke_test(WalkStrategy::Node2Vec, Objective::SkipGram)
                .with_seed(seed);

            let a = NodeEmbedder::new(config.clone()).fit(&graph).unwrap();
            let b = NodeEmbedder::new(config).fit(&graph).unwrap();

            let (a, b) = (a.as_f32().unwrap(), b.as_f32().unwrap());
            for table in &a.tables {
                prop_assert_eq!(table.rows(), nodes);
                prop_assert_eq!(table.dim(), 5);
                prop_assert!(table.as_slice().iter().all(|v| v.is_finite()));
            }
            prop_assert_eq!(a.tables[0].as_slice(), b.tables[0].as_slice());
            prop_assert_eq!(a.tables[1].as_slice(), b.tables[1].as_slice());
        }
    }
}
