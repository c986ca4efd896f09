use std::path::{Path, PathBuf};

use crate::{SemanticConfig, SemanticError};

#[derive(Debug, Clone)]
pub(crate) struct ModelAssets {
    pub(crate) model_path: PathBuf,
    pub(crate) tokenizer_path: PathBuf,
}

/// Missing or undownloadable assets are the only failures the stub may paper over.
pub(crate) fn is_missing_asset(err: &SemanticError) -> bool {
    matches!(
        err,
        SemanticError::ModelNotFound(_)
            | SemanticError::TokenizerMissing(_)
            | SemanticError::Download(_)
            | SemanticError::HttpStatus { .. }
    )
}

/// Ensures that the model and tokenizer exist locally, downloading them when URLs are provided.
pub(crate) async fn resolve_model_assets(
    cfg: &SemanticConfig,
) -> Result<ModelAssets, SemanticError> {
    let model_path = ensure_local_file(&cfg.model_path, cfg.model_url.as_deref(), || {
        SemanticError::ModelNotFound(cfg.model_path.display().to_string())
    })
    .await?;

    let tokenizer_target = tokenizer_storage_path(cfg)?;
    let tokenizer_path = ensure_local_file(&tokenizer_target, cfg.tokenizer_url.as_deref(), || {
        SemanticError::TokenizerMissing(tokenizer_target.display().to_string())
    })
    .await?;

    Ok(ModelAssets {
        model_path,
        tokenizer_path,
    })
}

/// Explicit path wins; otherwise the name is inferred from the URL and placed next to the model.
fn tokenizer_storage_path(cfg: &SemanticConfig) -> Result<PathBuf, SemanticError> {
    if let Some(path) = &cfg.tokenizer_path {
        return Ok(path.clone());
    }

    if let Some(url) = &cfg.tokenizer_url {
        let inferred_name = infer_filename_from_url(url).unwrap_or_else(|| "tokenizer.json".into());
        let base_dir = cfg
            .model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok(base_dir.join(inferred_name));
    }

    Err(SemanticError::TokenizerMissing(cfg.model_name.clone()))
}

async fn ensure_local_file<F>(
    target: &Path,
    remote_url: Option<&str>,
    on_missing: F,
) -> Result<PathBuf, SemanticError>
where
    F: FnOnce() -> SemanticError,
{
    if tokio::fs::try_exists(target).await? {
        return Ok(target.to_path_buf());
    }

    if let Some(url) = remote_url {
        download_to_path(target, url).await?;
        return Ok(target.to_path_buf());
    }

    Err(on_missing())
}

async fn download_to_path(target: &Path, url: &str) -> Result<(), SemanticError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    tracing::info!(url, target = %target.display(), "downloading model asset");
    let response = reqwest::get(url)
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SemanticError::HttpStatus {
            status: status.as_u16(),
            message: format!("while fetching {url}"),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    write_atomically(target, &bytes).await
}

/// Writes to a sibling temp file and renames it into place, so readers never
/// observe a partially written asset.
async fn write_atomically(target: &Path, bytes: &[u8]) -> Result<(), SemanticError> {
    let file_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".into());
    let tmp = target.with_file_name(format!(".{file_name}.{:016x}.part", fastrand::u64(..)));

    if let Err(err) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    if let Err(err) = tokio::fs::rename(&tmp, target).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(())
}

/// Last non-empty path segment with query/fragment stripped.
fn infer_filename_from_url(url: &str) -> Option<String> {
    url.split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .and_then(|segment| segment.split(['?', '#']).next())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
