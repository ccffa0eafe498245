//! Transformer encoder block.

use candle_core::{D, Result, Tensor};
use candle_nn::{Init, Linear, Module, ModuleT, VarBuilder, linear};

use super::attention::MultiHeadAttention;
use super::config::ModelConfig;

const LAYER_NORM_EPS: f64 = 1e-6;

/// Dropout that only fires in training mode.
pub(crate) fn dropout(xs: &Tensor, p: f64, train: bool) -> Result<Tensor> {
    if train && p > 0.0 {
        candle_nn::ops::dropout(xs, p as f32)
    } else {
        Ok(xs.clone())
    }
}

/// Layer normalisation over the last axis, built from primitive ops so that
/// gradients flow through it.
#[derive(Debug, Clone)]
pub struct LayerNorm {
    weight: Tensor,
    bias: Tensor,
    eps: f64,
}

impl LayerNorm {
    pub fn new(width: usize, eps: f64, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            weight: vb.get_with_hints(width, "weight", Init::Const(1.0))?,
            bias: vb.get_with_hints(width, "bias", Init::Const(0.0))?,
            eps,
        })
    }
}

impl Module for LayerNorm {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let mean = xs.mean_keepdim(D::Minus1)?;
        let centered = xs.broadcast_sub(&mean)?;
        let var = centered.sqr()?.mean_keepdim(D::Minus1)?;
        let std = var.affine(1.0, self.eps)?.sqrt()?;
        centered
            .broadcast_div(&std)?
            .broadcast_mul(&self.weight)?
            .broadcast_add(&self.bias)
    }
}

/// Attention and feed-forward sublayers, each wrapped in dropout, a residual
/// connection and post-normalisation.
#[derive(Debug, Clone)]
pub struct EncoderBlock {
    attention: MultiHeadAttention,
    attention_norm: LayerNorm,
    ff_in: Linear,
    ff_out: Linear,
    ff_norm: LayerNorm,
    dropout: f64,
}

impl EncoderBlock {
    pub fn new(config: &ModelConfig, vb: VarBuilder) -> Result<Self> {
        let width = config.model_width();
        Ok(Self {
            attention: MultiHeadAttention::new(
                width,
                config.d_k,
                config.d_v,
                config.n_heads,
                vb.pp("attention"),
            )?,
            attention_norm: LayerNorm::new(width, LAYER_NORM_EPS, vb.pp("attention_norm"))?,
            ff_in: linear(width, config.ff_dim, vb.pp("ff_in"))?,
            ff_out: linear(config.ff_dim, width, vb.pp("ff_out"))?,
            ff_norm: LayerNorm::new(width, LAYER_NORM_EPS, vb.pp("ff_norm"))?,
            dropout: config.dropout,
        })
    }
}

impl ModuleT for EncoderBlock {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let attn = self.attention.forward(xs)?;
        let attn = dropout(&attn, self.dropout, train)?;
        let xs = self.attention_norm.forward(&xs.add(&attn)?)?;

        let ff = self.ff_in.forward(&xs)?.relu()?;
        let ff = self.ff_out.forward(&ff)?;
        let ff = dropout(&ff, self.dropout, train)?;
        self.ff_norm.forward(&xs.add(&ff)?)
    }
}
