//! End-to-end pipeline tests across objectives, strategies, and backends.

use wander_core::WalkGraph;
use wander_embed::{
    EmbeddingConfig, Error, NodeEmbedder, Objective, Precision, TableRole, WalkStrategy,
};

fn cycle(n: u32) -> WalkGraph {
    let mut graph = WalkGraph::with_nodes(n as usize);
    for i in 0..n {
        graph.add_edge(i, (i + 1) % n).unwrap();
        graph.add_edge((i + 1) % n, i).unwrap();
    }
    graph
}

#[test]
fn every_strategy_objective_combination_runs() {
    let graph = cycle(6);
    for strategy in [
        WalkStrategy::DeepWalk,
        WalkStrategy::Node2Vec,
        WalkStrategy::Walklets,
        WalkStrategy::DreamWalk,
    ] {
        for objective in [Objective::Cbow, Objective::SkipGram, Objective::GloVe] {
            let config = EmbeddingConfig::smoke_test(strategy, objective);
            let output = NodeEmbedder::new(config)
                .fit(&graph)
                .unwrap_or_else(|e| panic!("{strategy:?}/{objective:?} failed: {e}"));
            let result = output.as_f32().unwrap();
            assert_eq!(result.tables.len(), 2, "{strategy:?}/{objective:?}");
            for table in &result.tables {
                assert_eq!(table.rows(), 6);
                assert_eq!(table.dim(), 5);
                assert!(table.as_slice().iter().all(|v| v.is_finite()));
            }
        }
    }
}

#[test]
fn identical_seeds_give_identical_tables() {
    let graph = cycle(7);
    for objective in [Objective::Cbow, Objective::SkipGram, Objective::GloVe] {
        let config = EmbeddingConfig::new(WalkStrategy::Node2Vec, objective)
            .with_embedding_size(12)
            .with_epochs(3)
            .with_window_size(2)
            .with_seed(1234);
        let mut config = config;
        config.walk.walk_length = 16;

        let a = NodeEmbedder::new(config.clone()).fit(&graph).unwrap();
        let b = NodeEmbedder::new(config).fit(&graph).unwrap();

        let (a, b) = (a.as_f32().unwrap(), b.as_f32().unwrap());
        for (ta, tb) in a.tables.iter().zip(&b.tables) {
            assert_eq!(ta.as_slice(), tb.as_slice(), "{objective:?} not reproducible");
        }
        assert_eq!(a.loss_history, b.loss_history);
    }
}

#[test]
fn different_seeds_give_different_tables() {
    let graph = cycle(7);
    let base = EmbeddingConfig::new(WalkStrategy::DeepWalk, Objective::SkipGram)
        .with_embedding_size(8)
        .with_epochs(2);

    let a = NodeEmbedder::new(base.clone().with_seed(1)).fit(&graph).unwrap();
    let b = NodeEmbedder::new(base.with_seed(2)).fit(&graph).unwrap();
    assert_ne!(
        a.as_f32().unwrap().tables[0].as_slice(),
        b.as_f32().unwrap().tables[0].as_slice()
    );
}

#[test]
fn cbow_returns_contextual_table_first() {
    let graph = cycle(5);

    let cbow = EmbeddingConfig::smoke_test(WalkStrategy::DeepWalk, Objective::Cbow);
    let output = NodeEmbedder::new(cbow).fit(&graph).unwrap();
    assert_eq!(
        output.table_roles(),
        vec![TableRole::Contextual, TableRole::Central]
    );

    let skipgram = EmbeddingConfig::smoke_test(WalkStrategy::DeepWalk, Objective::SkipGram);
    let output = NodeEmbedder::new(skipgram).fit(&graph).unwrap();
    assert_eq!(
        output.table_roles(),
        vec![TableRole::Central, TableRole::Contextual]
    );

    let glove = EmbeddingConfig::smoke_test(WalkStrategy::DeepWalk, Objective::GloVe);
    let output = NodeEmbedder::new(glove).fit(&graph).unwrap();
    assert_eq!(output.table_roles()[0], TableRole::Central);
}

#[test]
fn walk_counter_matches_schedule() {
    let graph = cycle(9);
    let config = EmbeddingConfig::new(WalkStrategy::DeepWalk, Objective::SkipGram)
        .with_embedding_size(4)
        .with_epochs(3);
    let output = NodeEmbedder::new(config).fit(&graph).unwrap();
    // One walk per node per epoch
    assert_eq!(output.walks_generated(), 9 * 3);
    assert_eq!(output.loss_history().len(), 3);
}

#[test]
fn invalid_config_leaves_no_side_effects() {
    let graph = cycle(4);
    let central = std::env::temp_dir().join("wander_test_no_side_effects_central.emb");
    let contextual = std::env::temp_dir().join("wander_test_no_side_effects_contextual.emb");
    let _ = std::fs::remove_file(&central);
    let _ = std::fs::remove_file(&contextual);

    let config = EmbeddingConfig::default()
        .with_embedding_size(0)
        .with_mmap_paths(&central, &contextual);
    let err = NodeEmbedder::new(config).fit(&graph).unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    // Validation failed before allocation: no table files were created.
    assert!(!central.exists());
    assert!(!contextual.exists());
}

#[test]
fn negative_learning_rate_rejected_before_walks() {
    let graph = cycle(4);
    let config = EmbeddingConfig::default().with_learning_rate(-1.0);
    assert!(matches!(
        NodeEmbedder::new(config).fit(&graph).unwrap_err(),
        Error::Config(_)
    ));
}

#[test]
fn negative_edge_weight_rejected_when_weights_enabled() {
    let mut graph = WalkGraph::with_nodes(3);
    graph.add_weighted_edge(0, 1, 2.0).unwrap();
    graph.add_weighted_edge(1, 2, -0.5).unwrap();
    graph.add_edge(2, 0).unwrap();

    let mut config = EmbeddingConfig::smoke_test(WalkStrategy::Node2Vec, Objective::SkipGram);
    config.walk.use_edge_weights = true;
    let err = NodeEmbedder::new(config.clone()).fit(&graph).unwrap_err();
    assert!(matches!(err, Error::GraphConstraint(_)));

    // The same graph is fine when edge weights are not in use.
    config.walk.use_edge_weights = false;
    assert!(NodeEmbedder::new(config).fit(&graph).is_ok());
}

#[test]
fn dead_end_graphs_embed_without_error() {
    // A chain with an absorbing tail: every walk truncates at node 3.
    let mut graph = WalkGraph::with_nodes(4);
    graph.add_edge(0, 1).unwrap();
    graph.add_edge(1, 2).unwrap();
    graph.add_edge(2, 3).unwrap();

    let config = EmbeddingConfig::smoke_test(WalkStrategy::Node2Vec, Objective::SkipGram);
    let output = NodeEmbedder::new(config).fit(&graph).unwrap();
    assert_eq!(output.walks_generated(), 4);
}

#[test]
fn mmap_backend_end_to_end() {
    let graph = cycle(6);
    let central = std::env::temp_dir().join("wander_test_mmap_central.emb");
    let contextual = std::env::temp_dir().join("wander_test_mmap_contextual.emb");

    let config = EmbeddingConfig::smoke_test(WalkStrategy::Node2Vec, Objective::SkipGram)
        .with_mmap_paths(&central, &contextual);
    {
        let output = NodeEmbedder::new(config).fit(&graph).unwrap();
        let result = output.as_f32().unwrap();
        assert_eq!(result.tables[0].rows(), 6);
        assert_eq!(result.tables[0].dim(), 5);
        // Trained central rows are non-zero through the mapping
        assert!(result.tables[0].as_slice().iter().any(|&v| v != 0.0));
    }

    // Durable once training completed and the mapping was released.
    assert_eq!(std::fs::metadata(&central).unwrap().len(), 6 * 5 * 4);
    assert_eq!(std::fs::metadata(&contextual).unwrap().len(), 6 * 5 * 4);
    let bytes = std::fs::read(&central).unwrap();
    assert!(bytes.chunks_exact(4).any(|c| f32::from_ne_bytes(c.try_into().unwrap()) != 0.0));

    std::fs::remove_file(central).unwrap();
    std::fs::remove_file(contextual).unwrap();
}

#[test]
fn mmap_and_heap_backends_agree() {
    let graph = cycle(5);
    let central = std::env::temp_dir().join("wander_test_agree_central.emb");
    let contextual = std::env::temp_dir().join("wander_test_agree_contextual.emb");

    let heap_config = EmbeddingConfig::smoke_test(WalkStrategy::DeepWalk, Objective::SkipGram);
    let mmap_config = heap_config.clone().with_mmap_paths(&central, &contextual);

    let heap = NodeEmbedder::new(heap_config).fit(&graph).unwrap();
    let mapped = NodeEmbedder::new(mmap_config).fit(&graph).unwrap();
    assert_eq!(
        heap.as_f32().unwrap().tables[0].as_slice(),
        mapped.as_f32().unwrap().tables[0].as_slice()
    );

    std::fs::remove_file(central).unwrap();
    std::fs::remove_file(contextual).unwrap();
}

#[test]
fn glove_loss_trends_down() {
    let graph = cycle(8);
    let mut config = EmbeddingConfig::new(WalkStrategy::DeepWalk, Objective::GloVe)
        .with_embedding_size(8)
        .with_epochs(40)
        .with_learning_rate(0.05)
        .with_window_size(2)
        .with_seed(7);
    config.walk.walk_length = 20;

    let output = NodeEmbedder::new(config).fit(&graph).unwrap();
    let history = output.loss_history();
    assert!(
        history.last().unwrap() < history.first().unwrap(),
        "loss did not decrease: {:?}",
        history
    );
}

#[test]
fn f64_precision_runs_and_reproduces() {
    let graph = cycle(5);
    let config = EmbeddingConfig::smoke_test(WalkStrategy::Node2Vec, Objective::GloVe)
        .with_dtype(Precision::F64);

    let a = NodeEmbedder::new(config.clone()).fit(&graph).unwrap();
    let b = NodeEmbedder::new(config).fit(&graph).unwrap();
    assert_eq!(
        a.as_f64().unwrap().tables[0].as_slice(),
        b.as_f64().unwrap().tables[0].as_slice()
    );
}
