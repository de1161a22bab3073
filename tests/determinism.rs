mod common;

use common::{TextLoader, config, write_corpus};
use quickmcq::{Embedder, IndexConfig, SemanticEmbedder, VectorIndex, build_index};

#[tokio::test]
async fn two_runs_over_the_same_corpus_build_the_same_index() {
    let tmp = tempfile::tempdir().unwrap();
    let first_cfg = config(&tmp.path().join("a"), "http://127.0.0.1:9/unused");
    let mut second_cfg = first_cfg.clone();
    second_cfg.paths.index_path = tmp.path().join("b/index");
    write_corpus(&first_cfg.paths.data_dir);

    let embedder = SemanticEmbedder::new(first_cfg.semantic.clone()).unwrap();
    build_index(&first_cfg, &TextLoader, &embedder).await.unwrap();
    build_index(&second_cfg, &TextLoader, &embedder).await.unwrap();

    let a = VectorIndex::load(&first_cfg.paths.index_path, IndexConfig::default()).unwrap();
    let b = VectorIndex::load(&second_cfg.paths.index_path, IndexConfig::default()).unwrap();
    assert_eq!(a.records(), b.records());

    let ids: Vec<_> = a.records().iter().map(|r| r.chunk.id.clone()).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(sorted.len(), ids.len(), "chunk ids must be unique");

    let query = embedder.embed_query("capital city").await.unwrap();
    assert_eq!(a.search(&query, 3).unwrap(), b.search(&query, 3).unwrap());
}

#[tokio::test]
async fn rebuilding_overwrites_the_previous_index() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = config(tmp.path(), "http://127.0.0.1:9/unused");
    write_corpus(&cfg.paths.data_dir);
    let embedder = SemanticEmbedder::new(cfg.semantic.clone()).unwrap();

    build_index(&cfg, &TextLoader, &embedder).await.unwrap();
    std::fs::remove_dir_all(cfg.paths.data_dir.join("science")).unwrap();
    let report = build_index(&cfg, &TextLoader, &embedder).await.unwrap();

    let index = VectorIndex::load(&cfg.paths.index_path, IndexConfig::default()).unwrap();
    assert_eq!(report.chunks, 2);
    assert_eq!(index.len(), 2);
}
