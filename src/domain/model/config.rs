//! Model hyperparameters.

use serde::{Deserialize, Serialize};

use crate::domain::price_bar::PRICE_COLUMNS;

/// Width of the Time2Vec embedding appended to each row.
pub const TIME_FEATURES: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Days per input window.
    pub seq_len: usize,
    /// Query/key width of each attention head.
    pub d_k: usize,
    /// Value width of each attention head.
    pub d_v: usize,
    pub n_heads: usize,
    /// Hidden width of the position-wise feed-forward.
    pub ff_dim: usize,
    pub n_layers: usize,
    /// Hidden width of the regression head.
    pub head_hidden: usize,
    pub dropout: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seq_len: 128,
            d_k: 256,
            d_v: 256,
            n_heads: 12,
            ff_dim: 256,
            n_layers: 3,
            head_hidden: 64,
            dropout: 0.1,
        }
    }
}

impl ModelConfig {
    /// Row width inside the encoder: price columns plus time features.
    pub fn model_width(&self) -> usize {
        PRICE_COLUMNS + TIME_FEATURES
    }
}

/// Everything needed besides the weights to rebuild a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub model: ModelConfig,
    /// Moving-average window the model was trained behind.
    pub moving_average: usize,
    /// Validation loss of the saved weights.
    pub best_loss: f64,
    pub epoch: usize,
}
