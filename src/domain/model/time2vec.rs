//! Learned time embedding.
//!
//! Each position in the window gets its own linear and periodic weights. The
//! input signal is the mean of the open, high and low features, so the
//! embedding tracks the shape of the window rather than a calendar.

use candle_core::{Result, Tensor};
use candle_nn::{Init, Module, VarBuilder};

const INIT: Init = Init::Uniform {
    lo: -0.05,
    up: 0.05,
};

#[derive(Debug, Clone)]
pub struct Time2Vec {
    weight_linear: Tensor,
    bias_linear: Tensor,
    weight_periodic: Tensor,
    bias_periodic: Tensor,
}

impl Time2Vec {
    pub fn new(seq_len: usize, vb: VarBuilder) -> Result<Self> {
        Ok(Self {
            weight_linear: vb.get_with_hints(seq_len, "weight_linear", INIT)?,
            bias_linear: vb.get_with_hints(seq_len, "bias_linear", INIT)?,
            weight_periodic: vb.get_with_hints(seq_len, "weight_periodic", INIT)?,
            bias_periodic: vb.get_with_hints(seq_len, "bias_periodic", INIT)?,
        })
    }
}

impl Module for Time2Vec {
    /// `(batch, seq, 4)` -> `(batch, seq, 2)`
    fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let signal = xs.narrow(2, 0, 3)?.mean(2)?;
        let linear = signal
            .broadcast_mul(&self.weight_linear)?
            .broadcast_add(&self.bias_linear)?
            .unsqueeze(2)?;
        let periodic = signal
            .broadcast_mul(&self.weight_periodic)?
            .broadcast_add(&self.bias_periodic)?
            .sin()?
            .unsqueeze(2)?;
        Tensor::cat(&[&linear, &periodic], 2)
    }
}
