//! Trained-model forecaster.
//!
//! Each call re-derives features from the full history it is handed and
//! rescales them against that history's own return range before feeding the
//! most recent window to the model.

use candle_core::{DType, Device};
use candle_nn::{ModuleT, VarBuilder, VarMap};

use super::dataset::windows_to_tensor;
use super::error::TrendError;
use super::features::{self, MinMaxScaler};
use super::model::{CheckpointMeta, ReturnCurveModel};
use super::price_bar::PriceBar;
use super::training::TrainedModel;
use crate::ports::forecast_port::ReturnForecast;
use crate::ports::model_store_port::ModelStore;

pub struct Forecaster {
    model: ReturnCurveModel,
    meta: CheckpointMeta,
    device: Device,
}

impl Forecaster {
    pub fn new(model: ReturnCurveModel, meta: CheckpointMeta, device: &Device) -> Self {
        Self {
            model,
            meta,
            device: device.clone(),
        }
    }

    pub fn from_trained(trained: TrainedModel, device: &Device) -> Self {
        Self::new(trained.model, trained.meta, device)
    }

    /// Rebuild the model described by the stored metadata and load its weights.
    pub fn load(store: &dyn ModelStore, device: &Device) -> Result<Self, TrendError> {
        let meta = store.load_meta()?;
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = ReturnCurveModel::new(&meta.model, vb)?;
        store.load_weights(&mut varmap)?;
        Ok(Self::new(model, meta, device))
    }

    pub fn meta(&self) -> &CheckpointMeta {
        &self.meta
    }
}

impl ReturnForecast for Forecaster {
    fn predict_next(&mut self, history: &[PriceBar]) -> Result<f64, TrendError> {
        let needed = self.min_history();
        if history.len() < needed {
            return Err(TrendError::InsufficientData {
                needed,
                have: history.len(),
            });
        }

        let rows = features::returns(history, self.meta.moving_average)?;
        let scaled = MinMaxScaler::fit(&rows)?.transform(&rows);
        let seq_len = self.meta.model.seq_len;
        let window = scaled[scaled.len() - seq_len..].to_vec();

        let input = windows_to_tensor(&[window], seq_len, &self.device)?;
        let output: Vec<f32> = self.model.forward_t(&input, false)?.to_vec1()?;
        output
            .first()
            .map(|&v| f64::from(v))
            .ok_or_else(|| TrendError::InvalidData {
                reason: "model produced no output".into(),
            })
    }

    fn min_history(&self) -> usize {
        self.meta.model.seq_len + features::warmup_rows(self.meta.moving_average)
    }
}
