//! Persistence port for trained model weights.

use crate::domain::error::TrendError;
use crate::domain::model::CheckpointMeta;
use candle_nn::VarMap;

pub trait ModelStore {
    fn exists(&self) -> bool;

    fn save(&self, varmap: &VarMap, meta: &CheckpointMeta) -> Result<(), TrendError>;

    fn load_meta(&self) -> Result<CheckpointMeta, TrendError>;

    /// Overwrite the variables already registered in `varmap` with stored values.
    fn load_weights(&self, varmap: &mut VarMap) -> Result<(), TrendError>;
}
