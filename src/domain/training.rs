//! Dataset preparation and the training loop.
//!
//! The loop runs Adam on mean squared error, checks validation loss after
//! every epoch and saves the weights through the [`ModelStore`] each time it
//! improves. After the last epoch the best weights are loaded back, so the
//! returned model is the checkpointed one rather than the final one.

use candle_core::{DType, Device, Tensor};
use candle_nn::{ModuleT, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use tracing::{debug, info, warn};

use super::dataset::{BatchIterator, WindowedDataset};
use super::error::TrendError;
use super::features::{self, MinMaxScaler};
use super::model::{CheckpointMeta, ModelConfig, ReturnCurveModel};
use super::price_bar::PriceBar;
use crate::ports::model_store_port::ModelStore;

const MAPE_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub batch_size: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// Epochs without improvement before stopping. Zero disables early stopping.
    pub patience: usize,
    pub seed: u64,
    pub moving_average: usize,
    pub val_fraction: f64,
    pub test_fraction: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            epochs: 50,
            learning_rate: 1e-3,
            patience: 10,
            seed: 42,
            moving_average: 10,
            val_fraction: 0.1,
            test_fraction: 0.1,
        }
    }
}

/// Train, validation and test windows, all scaled by the range of the train part.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub train: WindowedDataset,
    pub validation: WindowedDataset,
    pub test: WindowedDataset,
}

pub fn prepare(
    bars: &[PriceBar],
    model: &ModelConfig,
    training: &TrainingConfig,
    device: &Device,
) -> Result<PreparedData, TrendError> {
    let rows = features::returns(bars, training.moving_average)?;
    let split = features::chronological_split(&rows, training.val_fraction, training.test_fraction);

    let minimum = model.seq_len + 1;
    if split.train.len() < minimum {
        return Err(TrendError::InsufficientData {
            needed: minimum + features::warmup_rows(training.moving_average),
            have: bars.len(),
        });
    }

    let scaler = MinMaxScaler::fit(&split.train)?;
    let build = |part: &[features::Row]| {
        let (x, y) = features::windows(&scaler.transform(part), model.seq_len);
        WindowedDataset::new(&x, &y, model.seq_len, device)
    };

    let data = PreparedData {
        train: build(&split.train)?,
        validation: build(&split.validation)?,
        test: build(&split.test)?,
    };

    info!(
        rows = rows.len(),
        scale_min = scaler.min,
        scale_max = scaler.max,
        train = data.train.len(),
        validation = data.validation.len(),
        test = data.test.len(),
        "prepared windowed datasets"
    );
    if data.validation.is_empty() {
        warn!("validation split has no complete window; checkpointing on train loss");
    }
    Ok(data)
}

/// Loss and error metrics over one dataset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f64,
    pub mae: f64,
    /// Mean absolute percentage error, in percent.
    pub mape: f64,
}

impl Evaluation {
    pub fn from_predictions(predictions: &[f64], targets: &[f64]) -> Option<Self> {
        if predictions.is_empty() || predictions.len() != targets.len() {
            return None;
        }
        let n = predictions.len() as f64;
        let (mut sq, mut abs, mut pct) = (0.0, 0.0, 0.0);
        for (p, y) in predictions.iter().zip(targets) {
            let err = y - p;
            sq += err * err;
            abs += err.abs();
            pct += err.abs() / y.abs().max(MAPE_EPSILON);
        }
        Some(Self {
            loss: sq / n,
            mae: abs / n,
            mape: 100.0 * pct / n,
        })
    }
}

/// Run the model over a dataset in eval mode. Empty datasets give `None`.
pub fn evaluate(
    model: &ReturnCurveModel,
    data: &WindowedDataset,
    batch_size: usize,
) -> Result<Option<Evaluation>, TrendError> {
    if data.is_empty() {
        return Ok(None);
    }
    let mut predictions = Vec::with_capacity(data.len());
    let mut targets = Vec::with_capacity(data.len());
    let mut batches = BatchIterator::new(data, batch_size);
    while let Some((x, y)) = batches.next_batch()? {
        let out: Vec<f32> = model.forward_t(&x, false)?.to_vec1()?;
        let y: Vec<f32> = y.to_vec1()?;
        predictions.extend(out.into_iter().map(f64::from));
        targets.extend(y.into_iter().map(f64::from));
    }
    Ok(Evaluation::from_predictions(&predictions, &targets))
}

#[derive(Debug, Clone, PartialEq)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub train_loss: f64,
    pub val_loss: Option<f64>,
    pub improved: bool,
}

/// A fitted model with the metadata it was saved under.
pub struct TrainedModel {
    pub model: ReturnCurveModel,
    pub meta: CheckpointMeta,
    pub history: Vec<EpochMetrics>,
}

pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn fit(
        &self,
        model_config: &ModelConfig,
        data: &PreparedData,
        store: &dyn ModelStore,
        device: &Device,
    ) -> Result<TrainedModel, TrendError> {
        let mut varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = ReturnCurveModel::new(model_config, vb)?;

        let mut optimizer = candle_nn::AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: self.config.learning_rate,
                weight_decay: 0.0,
                ..Default::default()
            },
        )?;

        info!(
            epochs = self.config.epochs,
            batch_size = self.config.batch_size,
            lr = self.config.learning_rate,
            patience = self.config.patience,
            "training started"
        );

        let mut history = Vec::with_capacity(self.config.epochs);
        let mut best: Option<CheckpointMeta> = None;
        let mut stale = 0usize;
        let mut batches = BatchIterator::new(&data.train, self.config.batch_size);

        for epoch in 1..=self.config.epochs {
            batches.reshuffle(self.config.seed, epoch);

            let mut epoch_loss = 0.0;
            let mut batch_count = 0usize;
            while let Some((x, y)) = batches.next_batch()? {
                let loss = mse_loss(&model, &x, &y)?;
                optimizer.backward_step(&loss)?;
                epoch_loss += f64::from(loss.to_scalar::<f32>()?);
                batch_count += 1;
            }
            let train_loss = epoch_loss / batch_count.max(1) as f64;

            let val_loss = evaluate(&model, &data.validation, self.config.batch_size)?
                .map(|e| e.loss);
            let monitored = val_loss.unwrap_or(train_loss);
            let improved = monitored.is_finite()
                && best.as_ref().is_none_or(|b| monitored < b.best_loss);

            if improved {
                let meta = CheckpointMeta {
                    model: model_config.clone(),
                    moving_average: self.config.moving_average,
                    best_loss: monitored,
                    epoch,
                };
                store.save(&varmap, &meta)?;
                best = Some(meta);
                stale = 0;
            } else {
                stale += 1;
            }

            info!(epoch, train_loss, val_loss, improved, "epoch finished");
            history.push(EpochMetrics {
                epoch,
                train_loss,
                val_loss,
                improved,
            });

            if self.config.patience > 0 && stale >= self.config.patience {
                info!(epoch, patience = self.config.patience, "early stopping");
                break;
            }
        }

        let meta = best.ok_or_else(|| TrendError::InvalidData {
            reason: "training never produced a finite loss".into(),
        })?;
        store.load_weights(&mut varmap)?;
        debug!(epoch = meta.epoch, loss = meta.best_loss, "restored best checkpoint");

        for (name, part) in [
            ("train", &data.train),
            ("validation", &data.validation),
            ("test", &data.test),
        ] {
            if let Some(e) = evaluate(&model, part, self.config.batch_size)? {
                info!(
                    split = name,
                    loss = %format!("{:.4}", e.loss),
                    mae = %format!("{:.4}", e.mae),
                    mape = %format!("{:.4}", e.mape),
                    "evaluation"
                );
            }
        }

        Ok(TrainedModel {
            model,
            meta,
            history,
        })
    }
}

fn mse_loss(model: &ReturnCurveModel, x: &Tensor, y: &Tensor) -> Result<Tensor, TrendError> {
    let predictions = model.forward_t(x, true)?;
    Ok(candle_nn::loss::mse(&predictions, y)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::safetensors_store::SafetensorsStore;
    use approx::assert_relative_eq;

    fn sine_bars(n: usize) -> Vec<PriceBar> {
        (0..n)
            .map(|i| {
                let p = 100.0 + 10.0 * (i as f64 / 7.0).sin() + i as f64 * 0.1;
                PriceBar::new(p, p + 1.0, p - 1.0, p + 0.3)
            })
            .collect()
    }

    fn tiny_model() -> ModelConfig {
        ModelConfig {
            seq_len: 8,
            d_k: 4,
            d_v: 4,
            n_heads: 2,
            ff_dim: 8,
            n_layers: 1,
            head_hidden: 4,
            dropout: 0.0,
        }
    }

    #[test]
    fn default_config() {
        let c = TrainingConfig::default();
        assert_eq!(c.batch_size, 32);
        assert_eq!(c.epochs, 50);
        assert_eq!(c.moving_average, 10);
        assert_relative_eq!(c.learning_rate, 1e-3);
    }

    #[test]
    fn evaluation_metrics() {
        let e = Evaluation::from_predictions(&[1.0, 2.0], &[2.0, 2.0]).unwrap();
        assert_relative_eq!(e.loss, 0.5);
        assert_relative_eq!(e.mae, 0.5);
        assert_relative_eq!(e.mape, 25.0);
    }

    #[test]
    fn evaluation_needs_matching_lengths() {
        assert!(Evaluation::from_predictions(&[], &[]).is_none());
        assert!(Evaluation::from_predictions(&[1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn prepare_splits_windows() {
        let bars = sine_bars(130);
        let data = prepare(&bars, &tiny_model(), &TrainingConfig::default(), &Device::Cpu).unwrap();
        // 120 return rows -> 96 / 12 / 12, minus seq_len per part
        assert_eq!(data.train.len(), 88);
        assert_eq!(data.validation.len(), 4);
        assert_eq!(data.test.len(), 4);
        assert_eq!(data.train.inputs.dims(), &[88, 8, 4]);
    }

    #[test]
    fn prepare_rejects_short_history() {
        let bars = sine_bars(15);
        let err = prepare(&bars, &tiny_model(), &TrainingConfig::default(), &Device::Cpu)
            .unwrap_err();
        assert!(matches!(err, TrendError::InsufficientData { have: 15, .. }));
    }

    #[test]
    fn stalled_loss_stops_early_and_restores_best_weights() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = SafetensorsStore::new(dir.path().join("stock.safetensors"));
        let config = TrainingConfig {
            epochs: 40,
            patience: 2,
            learning_rate: 0.05,
            ..TrainingConfig::default()
        };
        let data = prepare(&sine_bars(130), &tiny_model(), &config, &Device::Cpu).unwrap();

        let fitted = Trainer::new(config.clone())
            .fit(&tiny_model(), &data, &store, &Device::Cpu)
            .unwrap();

        let history = &fitted.history;
        assert!(history.len() < config.epochs);
        assert!(history[0].improved);
        // the last `patience` epochs are the ones that failed to improve
        assert!(history[history.len() - 2..].iter().all(|m| !m.improved));

        let best = history
            .iter()
            .filter_map(|m| m.val_loss)
            .fold(f64::INFINITY, f64::min);
        assert_relative_eq!(fitted.meta.best_loss, best);
        assert_eq!(history[fitted.meta.epoch - 1].val_loss, Some(fitted.meta.best_loss));

        let restored = evaluate(&fitted.model, &data.validation, config.batch_size)
            .unwrap()
            .unwrap();
        assert_relative_eq!(restored.loss, fitted.meta.best_loss, epsilon = 1e-6);
        assert_eq!(store.load_meta().unwrap(), fitted.meta);
    }

    #[test]
    fn train_scaler_covers_train_split_only() {
        let bars = sine_bars(130);
        let data = prepare(&bars, &tiny_model(), &TrainingConfig::default(), &Device::Cpu).unwrap();
        let x: Vec<Vec<Vec<f32>>> = data.train.inputs.to_vec3().unwrap();
        for v in x.iter().flatten().flatten() {
            assert!((-1e-6..=1.0 + 1e-6).contains(v));
        }
    }
}
