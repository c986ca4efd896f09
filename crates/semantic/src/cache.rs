use once_cell::sync::OnceCell;
use onnxruntime::{environment::Environment, session::Session, GraphOptimizationLevel};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;
use tokenizers::Tokenizer;

use crate::assets::ModelAssets;
use crate::onnx::limit_sequence_length;
use crate::SemanticError;

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

// Sessions are not Sync, so every runtime thread keeps its own copy.
thread_local! {
    static MODEL_CACHE: RefCell<HashMap<ModelCacheKey, Rc<CachedModel>>> =
        RefCell::new(HashMap::new());
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct ModelCacheKey {
    model_path: PathBuf,
    tokenizer_path: PathBuf,
    max_sequence_length: usize,
}

impl ModelCacheKey {
    fn new(assets: &ModelAssets, max_sequence_length: usize) -> Self {
        Self {
            model_path: assets.model_path.clone(),
            tokenizer_path: assets.tokenizer_path.clone(),
            max_sequence_length,
        }
    }
}

pub(crate) struct CachedModel {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) session: RefCell<Session<'static>>,
}

impl CachedModel {
    fn load(assets: &ModelAssets, max_sequence_length: usize) -> Result<Self, SemanticError> {
        let started = Instant::now();
        let mut tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        limit_sequence_length(&mut tokenizer, max_sequence_length)?;

        let session = ort_environment()?
            .new_session_builder()
            .and_then(|builder| builder.with_optimization_level(GraphOptimizationLevel::Basic))
            .and_then(|builder| builder.with_model_from_file(assets.model_path.clone()))
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        tracing::info!(
            model = %assets.model_path.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "embedding model loaded"
        );

        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
        })
    }
}

/// Returns this thread's handle for `assets`, loading it on first use.
pub(crate) fn get_or_load_model_handle(
    assets: &ModelAssets,
    max_sequence_length: usize,
) -> Result<Rc<CachedModel>, SemanticError> {
    let key = ModelCacheKey::new(assets, max_sequence_length);

    MODEL_CACHE.with(|cache| {
        if let Some(handle) = cache.borrow().get(&key) {
            return Ok(Rc::clone(handle));
        }

        let handle = Rc::new(CachedModel::load(assets, max_sequence_length)?);
        cache.borrow_mut().insert(key, Rc::clone(&handle));
        Ok(handle)
    })
}

fn ort_environment() -> Result<&'static Environment, SemanticError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("helios")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })
}
