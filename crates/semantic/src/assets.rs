use std::path::{Path, PathBuf};

use tracing::info;

use crate::{SemanticConfig, SemanticError};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub(crate) struct ModelAssets {
    pub(crate) model_path: PathBuf,
    pub(crate) tokenizer_path: PathBuf,
}

/// Ensures that the model and tokenizer exist locally, downloading them when URLs are provided.
pub(crate) async fn resolve_model_assets(
    client: &reqwest::Client,
    cfg: &SemanticConfig,
) -> Result<ModelAssets, SemanticError> {
    let model_path = ensure_local_file(client, &cfg.model_path, cfg.model_url.as_deref())
        .await?
        .ok_or_else(|| SemanticError::ModelNotFound(cfg.model_path.display().to_string()))?;

    let tokenizer_target = tokenizer_storage_path(cfg)?;
    let tokenizer_path = ensure_local_file(client, &tokenizer_target, cfg.tokenizer_url.as_deref())
        .await?
        .ok_or_else(|| SemanticError::TokenizerMissing(tokenizer_target.display().to_string()))?;

    Ok(ModelAssets {
        model_path,
        tokenizer_path,
    })
}

/// Explicit tokenizer path, or a file named after the URL placed next to the model.
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

/// `Some(target)` once the file exists locally, `None` when it is missing and cannot be fetched.
async fn ensure_local_file(
    client: &reqwest::Client,
    target: &Path,
    remote_url: Option<&str>,
) -> Result<Option<PathBuf>, SemanticError> {
    if tokio::fs::try_exists(target).await? {
        return Ok(Some(target.to_path_buf()));
    }
    match remote_url {
        Some(url) => {
            download_to_path(client, target, url).await?;
            Ok(Some(target.to_path_buf()))
        }
        None => Ok(None),
    }
}

/// Downloads `url` into `target` through a temporary sibling so a failed transfer never leaves a
/// truncated file behind.
async fn download_to_path(
    client: &reqwest::Client,
    target: &Path,
    url: &str,
) -> Result<(), SemanticError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    info!(url, target = %target.display(), "model_asset_download");
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SemanticError::Download(format!(
            "unexpected status {status} while fetching {url}"
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| SemanticError::Download(e.to_string()))?;

    let partial = target.with_extension("partial");
    tokio::fs::write(&partial, &bytes).await?;
    tokio::fs::rename(&partial, target).await?;
    Ok(())
}

/// Extracts a filename from the provided URL, stripping query/fragment parts.
fn infer_filename_from_url(url: &str) -> Option<String> {
    url.split(['?', '#'])
        .next()?
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_from_url() {
        assert_eq!(
            infer_filename_from_url("https://hf.co/m/resolve/main/tokenizer.json?download=1"),
            Some("tokenizer.json".into())
        );
        assert_eq!(infer_filename_from_url("https://hf.co/a/b/"), Some("b".into()));
    }

    #[test]
    fn tokenizer_placed_next_to_model_when_path_missing() {
        let cfg = SemanticConfig {
            model_path: PathBuf::from("/models/mini/model.onnx"),
            tokenizer_path: None,
            tokenizer_url: Some("https://hf.co/x/tokenizer.json".into()),
            ..SemanticConfig::default()
        };
        assert_eq!(
            tokenizer_storage_path(&cfg).unwrap(),
            PathBuf::from("/models/mini/tokenizer.json")
        );
    }

    #[tokio::test]
    async fn missing_assets_without_urls_fail() {
        let dir = std::env::temp_dir().join("quickmcq-missing-assets");
        let cfg = SemanticConfig {
            model_path: dir.join("model.onnx"),
            model_url: None,
            tokenizer_path: Some(dir.join("tokenizer.json")),
            tokenizer_url: None,
            ..SemanticConfig::default()
        };
        let err = resolve_model_assets(&reqwest::Client::new(), &cfg)
            .await
            .unwrap_err();
        assert!(matches!(err, SemanticError::ModelNotFound(_)));
    }
}
