use once_cell::sync::OnceCell;
use onnxruntime::{environment::Environment, session::Session};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;
use tokenizers::Tokenizer;
use tracing::info;

use crate::assets::ModelAssets;
use crate::SemanticError;

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

// Sessions are not `Send`; each blocking worker thread keeps its own copy, so resident
// memory grows with the blocking pool (roughly one model per thread that has embedded).
// Servers bound the pool with `ServerConfig::max_blocking_threads`.
thread_local! {
    static MODEL_CACHE: RefCell<HashMap<ModelAssets, Rc<CachedModel>>> =
        RefCell::new(HashMap::new());
}

pub(crate) struct CachedModel {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) session: RefCell<Session<'static>>,
}

impl CachedModel {
    fn load(assets: &ModelAssets) -> Result<Self, SemanticError> {
        let started = Instant::now();
        let tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        let session = ort_environment()?
            .new_session_builder()
            .map_err(|e| SemanticError::Inference(e.to_string()))?
            .with_model_from_file(PathBuf::from(&assets.model_path))
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        info!(
            model = %assets.model_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "onnx_session_loaded"
        );
        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
        })
    }
}

pub(crate) fn get_or_load_model_handle(
    assets: &ModelAssets,
) -> Result<Rc<CachedModel>, SemanticError> {
    MODEL_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(handle) = cache.get(assets) {
            return Ok(handle.clone());
        }

        let handle = Rc::new(CachedModel::load(assets)?);
        cache.insert(assets.clone(), handle.clone());
        Ok(handle)
    })
}

fn ort_environment() -> Result<&'static Environment, SemanticError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("quickmcq-semantic")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })
}
