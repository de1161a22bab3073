//! On-disk layout: `<dir>/manifest.json` plus `<dir>/records.bin`.
//!
//! Records are bincode-encoded and compressed with the codec named in the manifest. A save
//! never leaves a half-written directory at `dir`: everything is written to a sibling temp
//! directory first and renamed into place.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    CompressionConfig, IndexConfig, IndexError, IndexRecord, Manifest, VectorIndex,
    INDEX_SCHEMA_VERSION,
};

pub(crate) const MANIFEST_FILE: &str = "manifest.json";
pub(crate) const RECORDS_FILE: &str = "records.bin";

impl VectorIndex {
    /// Writes the index to `dir`, replacing whatever was there.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<(), IndexError> {
        let dir = dir.as_ref();
        let staging = sibling(dir, "tmp");
        let backup = sibling(dir, "old");
        if let Some(parent) = dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        remove_dir_if_exists(&staging)?;
        fs::create_dir_all(&staging)?;

        let encoded =
            bincode::serde::encode_to_vec(&self.records, bincode::config::standard())?;
        let compressed = self.cfg.compression.compress(&encoded)?;
        fs::write(staging.join(RECORDS_FILE), &compressed)?;

        let manifest = serde_json::to_vec_pretty(&self.manifest)
            .map_err(|e| IndexError::Encode(e.to_string()))?;
        fs::write(staging.join(MANIFEST_FILE), manifest)?;

        remove_dir_if_exists(&backup)?;
        let had_previous = dir.exists();
        if had_previous {
            fs::rename(dir, &backup)?;
        }
        if let Err(e) = fs::rename(&staging, dir) {
            if had_previous {
                let _ = fs::rename(&backup, dir);
            }
            return Err(e.into());
        }
        remove_dir_if_exists(&backup)?;

        info!(
            path = %dir.display(),
            count = self.len(),
            dimension = self.dimension(),
            bytes = compressed.len(),
            "index_saved"
        );
        Ok(())
    }

    /// Reads an index previously written by [`VectorIndex::save`].
    pub fn load(dir: impl AsRef<Path>, cfg: IndexConfig) -> Result<Self, IndexError> {
        let dir = dir.as_ref();
        let manifest_path = dir.join(MANIFEST_FILE);
        let raw = fs::read(&manifest_path).map_err(|e| not_found_or_io(e, dir))?;
        let manifest: Manifest =
            serde_json::from_slice(&raw).map_err(|e| IndexError::Corrupt(e.to_string()))?;
        if manifest.schema_version != INDEX_SCHEMA_VERSION {
            return Err(IndexError::SchemaMismatch {
                expected: INDEX_SCHEMA_VERSION,
                found: manifest.schema_version,
            });
        }

        let compressed = fs::read(dir.join(RECORDS_FILE)).map_err(|e| not_found_or_io(e, dir))?;
        let encoded = CompressionConfig::decompress(manifest.compression, &compressed)?;
        let (records, _): (Vec<IndexRecord>, usize) =
            bincode::serde::decode_from_slice(&encoded, bincode::config::standard())?;

        if records.len() != manifest.count {
            return Err(IndexError::Corrupt(format!(
                "manifest lists {} records but {} were stored",
                manifest.count,
                records.len()
            )));
        }
        debug!(path = %dir.display(), count = records.len(), "index_loaded");
        Self::from_parts(manifest, records, cfg)
    }

    /// Loads the index and checks it was built with `model_id`.
    pub fn open(
        dir: impl AsRef<Path>,
        model_id: &str,
        cfg: IndexConfig,
    ) -> Result<Self, IndexError> {
        let index = Self::load(dir, cfg)?;
        index.ensure_model(model_id)?;
        Ok(index)
    }
}

fn sibling(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "index".to_string());
    dir.with_file_name(format!(".{name}.{suffix}"))
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), IndexError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn not_found_or_io(e: std::io::Error, dir: &Path) -> IndexError {
    if e.kind() == ErrorKind::NotFound {
        IndexError::NotFound(dir.display().to_string())
    } else {
        IndexError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::record;
    use crate::CompressionCodec;
    use tempfile::TempDir;

    fn build(model: &str, cfg: IndexConfig) -> VectorIndex {
        VectorIndex::build(
            model,
            vec![
                record(0, vec![1.0, 0.0]),
                record(1, vec![0.0, 1.0]),
                record(2, vec![0.6, 0.8]),
            ],
            cfg,
        )
        .unwrap()
    }

    #[test]
    fn save_then_load_gives_identical_search_results() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db");
        let index = build("model-a", IndexConfig::default());
        index.save(&dir).unwrap();

        assert!(dir.join(MANIFEST_FILE).exists());
        assert!(dir.join(RECORDS_FILE).exists());

        let loaded = VectorIndex::open(&dir, "model-a", IndexConfig::default()).unwrap();
        assert_eq!(loaded.manifest(), index.manifest());
        assert_eq!(loaded.records(), index.records());
        assert_eq!(
            loaded.search(&[0.5, 0.5], 3).unwrap(),
            index.search(&[0.5, 0.5], 3).unwrap()
        );
    }

    #[test]
    fn uncompressed_records_round_trip() {
        let tmp = TempDir::new().unwrap();
        let cfg = IndexConfig::default()
            .with_compression(CompressionConfig::new(CompressionCodec::None, 0));
        build("m", cfg).save(tmp.path().join("db")).unwrap();

        // Codec comes from the manifest, not the loader's config.
        let loaded = VectorIndex::load(tmp.path().join("db"), IndexConfig::default()).unwrap();
        assert_eq!(loaded.manifest().compression, CompressionCodec::None);
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn save_replaces_existing_index() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db");
        build("first", IndexConfig::default()).save(&dir).unwrap();
        build("second", IndexConfig::default()).save(&dir).unwrap();

        let loaded = VectorIndex::load(&dir, IndexConfig::default()).unwrap();
        assert_eq!(loaded.model_id(), "second");
        assert!(!sibling(&dir, "tmp").exists());
        assert!(!sibling(&dir, "old").exists());
    }

    #[test]
    fn open_rejects_other_model() {
        let tmp = TempDir::new().unwrap();
        build("model-a", IndexConfig::default())
            .save(tmp.path().join("db"))
            .unwrap();

        let err = VectorIndex::open(tmp.path().join("db"), "model-b", IndexConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            IndexError::EmbeddingModelMismatch {
                expected: "model-b".into(),
                found: "model-a".into(),
            }
        );
    }

    #[test]
    fn missing_directory_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = VectorIndex::load(tmp.path().join("nope"), IndexConfig::default()).unwrap_err();
        assert!(matches!(err, IndexError::NotFound(_)));
    }

    #[test]
    fn schema_version_is_checked() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db");
        build("m", IndexConfig::default()).save(&dir).unwrap();

        let path = dir.join(MANIFEST_FILE);
        let mut manifest: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        manifest["schema_version"] = serde_json::json!(99);
        fs::write(&path, serde_json::to_vec(&manifest).unwrap()).unwrap();

        let err = VectorIndex::load(&dir, IndexConfig::default()).unwrap_err();
        assert_eq!(
            err,
            IndexError::SchemaMismatch {
                expected: INDEX_SCHEMA_VERSION,
                found: 99
            }
        );
    }

    #[test]
    fn truncated_records_are_rejected() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("db");
        build("m", IndexConfig::default()).save(&dir).unwrap();
        fs::write(dir.join(RECORDS_FILE), b"garbage").unwrap();

        assert!(VectorIndex::load(&dir, IndexConfig::default()).is_err());
    }
}
