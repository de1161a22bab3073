mod common;

use std::sync::Arc;

use common::{TextLoader, config, spawn_llm, write_corpus};
use quickmcq::{
    Embedder, HttpGenerator, NO_ANSWER, RetrievalQa, SemanticEmbedder, VectorIndex, build_index,
};

#[tokio::test]
async fn ingest_then_answer_from_persisted_index() {
    let tmp = tempfile::tempdir().unwrap();
    let llm = spawn_llm("Paris is the capital of France.").await;
    let cfg = config(tmp.path(), &llm.url);
    write_corpus(&cfg.paths.data_dir);

    let embedder = Arc::new(SemanticEmbedder::new(cfg.semantic.clone()).unwrap());
    let report = build_index(&cfg, &TextLoader, embedder.as_ref()).await.unwrap();
    assert_eq!(report.files, 2);
    assert_eq!(report.pages, 4);
    assert_eq!(report.chunks, 4);
    assert_eq!(report.model_id, "fast-hash-384");
    assert!(cfg.paths.index_path.join("manifest.json").exists());

    // Serving side: fresh load from disk.
    let index = Arc::new(
        VectorIndex::open(
            &cfg.paths.index_path,
            embedder.model_id(),
            cfg.retrieval.index.clone(),
        )
        .unwrap(),
    );
    let generator = Arc::new(HttpGenerator::new(cfg.generation.clone()).unwrap());
    let qa = RetrievalQa::from_config(&cfg, index, embedder, generator).unwrap();

    let answer = qa.ask("What is the capital of France?").await.unwrap();
    assert_eq!(answer.answer, "Paris is the capital of France.");
    assert_eq!(answer.sources.len(), 2);
    assert_eq!(answer.sources[0].chunk.text, "Paris is the capital of France.");
    assert!(answer.sources[0].chunk.source.ends_with("geography.txt"));
    assert_eq!(answer.sources[0].chunk.page, 0);

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Context: Paris is the capital of France.\n\n"));
    assert!(prompts[0].contains("Question: What is the capital of France?"));
}

#[tokio::test]
async fn blank_generation_reports_no_answer() {
    let tmp = tempfile::tempdir().unwrap();
    let llm = spawn_llm("   ").await;
    let cfg = config(tmp.path(), &llm.url);
    write_corpus(&cfg.paths.data_dir);

    let embedder = Arc::new(SemanticEmbedder::new(cfg.semantic.clone()).unwrap());
    build_index(&cfg, &TextLoader, embedder.as_ref()).await.unwrap();
    let index = Arc::new(
        VectorIndex::open(&cfg.paths.index_path, embedder.model_id(), Default::default()).unwrap(),
    );
    let generator = Arc::new(HttpGenerator::new(cfg.generation.clone()).unwrap());
    let qa = RetrievalQa::new(index, embedder, generator).unwrap();

    assert_eq!(qa.ask("Who knows?").await.unwrap().answer, NO_ANSWER);
}

#[tokio::test]
async fn mcq_flow_parses_text_output() {
    const QUIZ: &str = "1. Which organelle is the powerhouse of the cell?\n\
        a) Nucleus\nb) Mitochondria\nc) Ribosome\nd) Golgi body\nAnswer: b) Mitochondria";

    let tmp = tempfile::tempdir().unwrap();
    let llm = spawn_llm(QUIZ).await;
    let cfg = config(tmp.path(), &llm.url);
    write_corpus(&cfg.paths.data_dir);

    let embedder = Arc::new(SemanticEmbedder::new(cfg.semantic.clone()).unwrap());
    build_index(&cfg, &TextLoader, embedder.as_ref()).await.unwrap();
    let index = Arc::new(
        VectorIndex::open(&cfg.paths.index_path, embedder.model_id(), Default::default()).unwrap(),
    );
    let generator = Arc::new(HttpGenerator::new(cfg.generation.clone()).unwrap());
    let qa = RetrievalQa::new(index, embedder, generator).unwrap();

    let quiz = qa.generate_mcqs("the cell", 1).await.unwrap();
    assert_eq!(quiz.question, "prepare a 1 MCQs on the cell");
    assert_eq!(quiz.mcqs.len(), 1);
    assert_eq!(quiz.mcqs[0].options[1], "Mitochondria");
    assert_eq!(quiz.skipped, 0);
    assert_eq!(quiz.sources[0].chunk.text, "The mitochondria is the powerhouse of the cell.");
}
