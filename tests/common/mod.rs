#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::routing::post;
use axum::{Json, Router};
use ingest::SourceDocument;
use quickmcq::{DocumentLoader, GenerationConfig, IngestError, Provider, RagConfig, SemanticConfig};
use semantic::retry::RetryConfig;
use serde_json::{Value, json};

/// Plain-text stand-in for PDFs: form feeds separate pages.
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn extensions(&self) -> &[&'static str] {
        &["txt"]
    }

    fn load(&self, path: &Path) -> Result<Vec<SourceDocument>, IngestError> {
        let text = fs::read_to_string(path).map_err(|e| IngestError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(text
            .split('\x0c')
            .enumerate()
            .filter(|(_, page)| !page.trim().is_empty())
            .map(|(i, page)| SourceDocument::new(page, path.display().to_string(), i))
            .collect())
    }
}

pub fn write_corpus(dir: &Path) {
    fs::create_dir_all(dir.join("science")).unwrap();
    fs::write(
        dir.join("geography.txt"),
        "Paris is the capital of France.\x0cRome is the capital of Italy.",
    )
    .unwrap();
    fs::write(
        dir.join("science/biology.txt"),
        "Photosynthesis converts light into chemical energy in plants.\x0c\
         The mitochondria is the powerhouse of the cell.",
    )
    .unwrap();
}

/// Fast embeddings, index and data under `root`, generation pointed at `endpoint`.
pub fn config(root: &Path, endpoint: &str) -> RagConfig {
    let mut cfg = RagConfig::default();
    cfg.paths.data_dir = root.join("data");
    cfg.paths.index_path = root.join("vectorstore/db_faiss");
    cfg.semantic = SemanticConfig::fast();
    cfg.generation = GenerationConfig::default()
        .with_endpoint(Provider::HuggingFace, endpoint)
        .with_retry(RetryConfig::disabled());
    cfg
}

/// Local text-generation endpoint that answers with `reply` and records prompts.
pub struct StubLlm {
    pub url: String,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

pub async fn spawn_llm(reply: &'static str) -> StubLlm {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let seen = prompts.clone();
    let router = Router::new().route(
        "/generate",
        post(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            async move {
                let prompt = body["inputs"].as_str().unwrap_or_default().to_string();
                seen.lock().unwrap().push(prompt);
                Json(json!([{ "generated_text": reply }]))
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    StubLlm {
        url: format!("http://{addr}/generate"),
        prompts,
    }
}
