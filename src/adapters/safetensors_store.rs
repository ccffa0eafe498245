//! Model checkpoints as a safetensors weights file plus a JSON sidecar.

use crate::domain::error::TrendError;
use crate::domain::model::CheckpointMeta;
use crate::ports::model_store_port::ModelStore;
use candle_nn::VarMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SafetensorsStore {
    weights: PathBuf,
    meta: PathBuf,
}

impl SafetensorsStore {
    /// Store at `weights`, with metadata next to it under the same stem and a `.json` extension.
    pub fn new<P: AsRef<Path>>(weights: P) -> Self {
        let weights = weights.as_ref().to_path_buf();
        let meta = weights.with_extension("json");
        Self { weights, meta }
    }

    pub fn weights_path(&self) -> &Path {
        &self.weights
    }

    pub fn meta_path(&self) -> &Path {
        &self.meta
    }

    fn error(path: &Path, reason: impl ToString) -> TrendError {
        TrendError::Checkpoint {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl ModelStore for SafetensorsStore {
    fn exists(&self) -> bool {
        self.weights.is_file() && self.meta.is_file()
    }

    fn save(&self, varmap: &VarMap, meta: &CheckpointMeta) -> Result<(), TrendError> {
        if let Some(parent) = self.weights.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        varmap
            .save(&self.weights)
            .map_err(|e| Self::error(&self.weights, e))?;

        let json = serde_json::to_string_pretty(meta).map_err(|e| Self::error(&self.meta, e))?;
        std::fs::write(&self.meta, json)?;
        Ok(())
    }

    fn load_meta(&self) -> Result<CheckpointMeta, TrendError> {
        let raw = std::fs::read_to_string(&self.meta).map_err(|e| Self::error(&self.meta, e))?;
        serde_json::from_str(&raw).map_err(|e| Self::error(&self.meta, e))
    }

    fn load_weights(&self, varmap: &mut VarMap) -> Result<(), TrendError> {
        varmap
            .load(&self.weights)
            .map_err(|e| Self::error(&self.weights, e))
    }
}
