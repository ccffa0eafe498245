//! Feature pipeline: smoothing, returns, scaling, splitting and windowing.
//!
//! Rows are `[open, high, low, close]` arrays throughout. Every transform
//! drops the rows it cannot compute instead of padding them, so the output is
//! always shorter than or equal to the input.

use super::error::TrendError;
use super::price_bar::{CLOSE, PRICE_COLUMNS, PriceBar};

pub type Row = [f64; PRICE_COLUMNS];

/// Trailing simple moving average over every column. The first `window - 1`
/// rows have no full window and are dropped.
pub fn moving_average(rows: &[Row], window: usize) -> Vec<Row> {
    if window == 0 || rows.len() < window {
        return Vec::new();
    }

    let mut sums = [0.0; PRICE_COLUMNS];
    let mut out = Vec::with_capacity(rows.len() + 1 - window);

    for (i, row) in rows.iter().enumerate() {
        for c in 0..PRICE_COLUMNS {
            sums[c] += row[c];
        }
        if i >= window {
            for c in 0..PRICE_COLUMNS {
                sums[c] -= rows[i - window][c];
            }
        }
        if i + 1 >= window {
            let mut avg = [0.0; PRICE_COLUMNS];
            for c in 0..PRICE_COLUMNS {
                avg[c] = sums[c] / window as f64;
            }
            out.push(avg);
        }
    }
    out
}

/// Day-over-day arithmetic return per column. The first row is dropped.
pub fn pct_change(rows: &[Row]) -> Result<Vec<Row>, TrendError> {
    rows.windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let mut out = [0.0; PRICE_COLUMNS];
            for c in 0..PRICE_COLUMNS {
                let prev = pair[0][c];
                if prev == 0.0 {
                    return Err(TrendError::InvalidData {
                        reason: format!("zero price at row {i}, cannot compute return"),
                    });
                }
                out[c] = pair[1][c] / prev - 1.0;
            }
            Ok(out)
        })
        .collect()
}

/// Smoothed day-over-day returns for a price history.
pub fn returns(bars: &[PriceBar], window: usize) -> Result<Vec<Row>, TrendError> {
    let rows: Vec<Row> = bars.iter().map(PriceBar::columns).collect();
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return Err(TrendError::InvalidData {
            reason: "non-finite price value".into(),
        });
    }
    pct_change(&moving_average(&rows, window))
}

/// Rows lost to [`returns`] for a given moving-average window.
pub fn warmup_rows(window: usize) -> usize {
    window
}

/// Min-max scaler sharing one range across all four columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    pub min: f64,
    pub max: f64,
}

impl MinMaxScaler {
    pub fn fit(rows: &[Row]) -> Result<Self, TrendError> {
        if rows.is_empty() {
            return Err(TrendError::InsufficientData { needed: 1, have: 0 });
        }
        let (min, max) = rows
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        Ok(Self { min, max })
    }

    pub fn scale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            0.0
        } else {
            (value - self.min) / range
        }
    }

    pub fn transform(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().map(|row| row.map(|v| self.scale(v))).collect()
    }
}

/// Contiguous train / validation / test partition of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<Row>,
    pub validation: Vec<Row>,
    pub test: Vec<Row>,
}

/// Split chronologically. The test block is the last `test_fraction` of the
/// rows, validation the `val_fraction` before it, and training the rest.
pub fn chronological_split(rows: &[Row], val_fraction: f64, test_fraction: f64) -> Split {
    let len = rows.len();
    let test_count = (test_fraction * len as f64) as usize;
    let holdout_count = (((val_fraction + test_fraction) * len as f64) as usize).max(test_count);

    let train_end = len - holdout_count.min(len);
    let test_start = len - test_count.min(len);

    Split {
        train: rows[..train_end].to_vec(),
        validation: rows[train_end..test_start].to_vec(),
        test: rows[test_start..].to_vec(),
    }
}

/// Sliding windows of `seq_len` rows, each paired with the close value of the
/// row right after it.
pub fn windows(rows: &[Row], seq_len: usize) -> (Vec<Vec<Row>>, Vec<f64>) {
    if seq_len == 0 || rows.len() <= seq_len {
        return (Vec::new(), Vec::new());
    }
    (seq_len..rows.len())
        .map(|i| (rows[i - seq_len..i].to_vec(), rows[i][CLOSE]))
        .unzip()
}
