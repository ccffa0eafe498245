//! Return-curve regressor: Time2Vec embedding, stacked encoder blocks and a
//! small dense head producing one normalised close return per window.

use candle_core::{Result, Tensor};
use candle_nn::{Linear, Module, ModuleT, VarBuilder, linear};

use super::config::ModelConfig;
use super::encoder::{EncoderBlock, dropout};
use super::time2vec::Time2Vec;

#[derive(Debug, Clone)]
pub struct ReturnCurveModel {
    config: ModelConfig,
    time2vec: Time2Vec,
    blocks: Vec<EncoderBlock>,
    hidden: Linear,
    output: Linear,
}

impl ReturnCurveModel {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let blocks = (0..config.n_layers)
            .map(|i| EncoderBlock::new(config, vb.pp(format!("encoder{i}"))))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            config: config.clone(),
            time2vec: Time2Vec::new(config.seq_len, vb.pp("time2vec"))?,
            blocks,
            hidden: linear(config.seq_len, config.head_hidden, vb.pp("hidden"))?,
            output: linear(config.head_hidden, 1, vb.pp("output"))?,
        })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

impl ModuleT for ReturnCurveModel {
    /// `(batch, seq_len, 4)` -> `(batch)`
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let time = self.time2vec.forward(xs)?;
        let mut hidden = Tensor::cat(&[xs, &time], 2)?;
        for block in &self.blocks {
            hidden = block.forward_t(&hidden, train)?;
        }

        // average across features, one value per day
        let pooled = hidden.mean(2)?;
        let pooled = dropout(&pooled, self.config.dropout, train)?;
        let dense = self.hidden.forward(&pooled)?.relu()?;
        let dense = dropout(&dense, self.config.dropout, train)?;
        self.output.forward(&dense)?.squeeze(1)
    }
}
