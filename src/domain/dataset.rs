//! Windowed tensors and mini-batch iteration for training.

use candle_core::{Device, Tensor};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use super::error::TrendError;
use super::features::Row;
use super::price_bar::PRICE_COLUMNS;

/// Model inputs `[n, seq_len, 4]` and next-day close targets `[n]`.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    pub inputs: Tensor,
    pub targets: Tensor,
}

impl WindowedDataset {
    pub fn new(
        windows: &[Vec<Row>],
        targets: &[f64],
        seq_len: usize,
        device: &Device,
    ) -> Result<Self, TrendError> {
        let inputs = windows_to_tensor(windows, seq_len, device)?;
        let targets: Vec<f32> = targets.iter().map(|&t| t as f32).collect();
        let n = targets.len();
        let targets = Tensor::from_vec(targets, n, device)?;
        Ok(Self { inputs, targets })
    }

    pub fn len(&self) -> usize {
        self.targets.dims1().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Flatten windows into a `[n, seq_len, 4]` f32 tensor.
pub fn windows_to_tensor(
    windows: &[Vec<Row>],
    seq_len: usize,
    device: &Device,
) -> Result<Tensor, TrendError> {
    let mut data = Vec::with_capacity(windows.len() * seq_len * PRICE_COLUMNS);
    for window in windows {
        if window.len() != seq_len {
            return Err(TrendError::InvalidData {
                reason: format!("window has {} rows, expected {seq_len}", window.len()),
            });
        }
        data.extend(window.iter().flatten().map(|&v| v as f32));
    }
    Ok(Tensor::from_vec(
        data,
        (windows.len(), seq_len, PRICE_COLUMNS),
        device,
    )?)
}

/// Mini-batch iterator over a dataset. Reshuffles indices each epoch.
pub struct BatchIterator<'a> {
    dataset: &'a WindowedDataset,
    indices: Vec<u32>,
    batch_size: usize,
    pos: usize,
}

impl<'a> BatchIterator<'a> {
    pub fn new(dataset: &'a WindowedDataset, batch_size: usize) -> Self {
        Self {
            dataset,
            indices: (0..dataset.len() as u32).collect(),
            batch_size: batch_size.max(1),
            pos: 0,
        }
    }

    /// Reshuffle for a new epoch using a seeded RNG derived from base seed + epoch.
    pub fn reshuffle(&mut self, seed: u64, epoch: usize) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(epoch as u64));
        self.indices.shuffle(&mut rng);
        self.pos = 0;
    }

    /// Returns the next mini-batch, or None once the epoch is exhausted.
    pub fn next_batch(&mut self) -> Result<Option<(Tensor, Tensor)>, TrendError> {
        let n = self.indices.len();
        if self.pos >= n {
            return Ok(None);
        }

        let end = (self.pos + self.batch_size).min(n);
        let device = self.dataset.inputs.device();
        let idx = Tensor::new(&self.indices[self.pos..end], device)?;
        self.pos = end;

        let inputs = self.dataset.inputs.index_select(&idx, 0)?;
        let targets = self.dataset.targets.index_select(&idx, 0)?;
        Ok(Some((inputs, targets)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_windows(n: usize, seq_len: usize) -> (Vec<Vec<Row>>, Vec<f64>) {
        let windows = (0..n)
            .map(|i| (0..seq_len).map(|j| [(i * 10 + j) as f64; 4]).collect())
            .collect();
        let targets = (0..n).map(|i| i as f64).collect();
        (windows, targets)
    }

    #[test]
    fn dataset_shapes() {
        let (w, t) = sample_windows(5, 3);
        let ds = WindowedDataset::new(&w, &t, 3, &Device::Cpu).unwrap();
        assert_eq!(ds.inputs.dims(), &[5, 3, 4]);
        assert_eq!(ds.len(), 5);
        assert!(!ds.is_empty());
    }

    #[test]
    fn dataset_rejects_ragged_window() {
        let (mut w, t) = sample_windows(2, 3);
        w[1].pop();
        assert!(WindowedDataset::new(&w, &t, 3, &Device::Cpu).is_err());
    }

    #[test]
    fn empty_dataset() {
        let ds = WindowedDataset::new(&[], &[], 3, &Device::Cpu).unwrap();
        assert!(ds.is_empty());
        let mut iter = BatchIterator::new(&ds, 4);
        assert!(iter.next_batch().unwrap().is_none());
    }

    #[test]
    fn batch_iterator_exhausts() {
        let (w, t) = sample_windows(10, 2);
        let ds = WindowedDataset::new(&w, &t, 2, &Device::Cpu).unwrap();
        let mut iter = BatchIterator::new(&ds, 3);
        iter.reshuffle(42, 0);

        let mut count = 0;
        let mut seen = 0;
        while let Some((x, y)) = iter.next_batch().unwrap() {
            assert_eq!(x.dims()[0], y.dims()[0]);
            seen += y.dims()[0];
            count += 1;
        }
        assert_eq!(count, 4); // ceil(10/3)
        assert_eq!(seen, 10);
    }

    #[test]
    fn batch_keeps_inputs_aligned_with_targets() {
        let (w, t) = sample_windows(6, 2);
        let ds = WindowedDataset::new(&w, &t, 2, &Device::Cpu).unwrap();
        let mut iter = BatchIterator::new(&ds, 6);
        iter.reshuffle(7, 3);
        let (x, y) = iter.next_batch().unwrap().unwrap();
        let x: Vec<Vec<Vec<f32>>> = x.to_vec3().unwrap();
        let y: Vec<f32> = y.to_vec1().unwrap();
        for (window, target) in x.iter().zip(y.iter()) {
            assert_eq!(window[0][0], target * 10.0);
        }
    }
}
