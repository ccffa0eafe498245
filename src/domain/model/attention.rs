//! Scaled dot-product attention.

use candle_core::{D, Result, Tensor};
use candle_nn::{Linear, Module, VarBuilder, linear};

/// One attention head with its own query, key and value projections.
#[derive(Debug, Clone)]
pub struct AttentionHead {
    query: Linear,
    key: Linear,
    value: Linear,
    scale: f64,
}

impl AttentionHead {
    pub fn new(width: usize, d_k: usize, d_v: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            query: linear(width, d_k, vb.pp("query"))?,
            key: linear(width, d_k, vb.pp("key"))?,
            value: linear(width, d_v, vb.pp("value"))?,
            scale: 1.0 / (d_k as f64).sqrt(),
        })
    }
}

impl Module for AttentionHead {
    /// `(batch, seq, width)` -> `(batch, seq, d_v)`
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let q = self.query.forward(xs)?;
        let k = self.key.forward(xs)?;
        let v = self.value.forward(xs)?;

        let scores = q.matmul(&k.t()?.contiguous()?)?.affine(self.scale, 0.0)?;
        let weights = candle_nn::ops::softmax(&scores, D::Minus1)?;
        weights.matmul(&v)
    }
}

/// Concatenated heads projected back to the model width.
#[derive(Debug, Clone)]
pub struct MultiHeadAttention {
    heads: Vec<AttentionHead>,
    output: Linear,
}

impl MultiHeadAttention {
    pub fn new(
        width: usize,
        d_k: usize,
        d_v: usize,
        n_heads: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let heads = (0..n_heads)
            .map(|i| AttentionHead::new(width, d_k, d_v, vb.pp(format!("head{i}"))))
            .collect::<Result<Vec<_>>>()?;
        let output = linear(n_heads * d_v, width, vb.pp("output"))?;
        Ok(Self { heads, output })
    }
}

impl Module for MultiHeadAttention {
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let outputs = self
            .heads
            .iter()
            .map(|head| head.forward(xs))
            .collect::<Result<Vec<_>>>()?;
        let concat = Tensor::cat(&outputs, 2)?;
        self.output.forward(&concat)
    }
}
