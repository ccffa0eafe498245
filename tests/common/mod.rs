#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
pub use trendtrader::domain::price_bar::PriceBar;
use trendtrader::domain::error::TrendError;
use trendtrader::ports::forecast_port::ReturnForecast;

/// Forecast that replays a fixed curve and records the history length it saw.
pub struct ScriptedForecast {
    pub curve: Vec<f64>,
    pub min_history: usize,
    pub seen: Vec<usize>,
}

impl ScriptedForecast {
    pub fn new(curve: Vec<f64>) -> Self {
        Self {
            curve,
            min_history: 1,
            seen: Vec::new(),
        }
    }

    pub fn with_min_history(mut self, min_history: usize) -> Self {
        self.min_history = min_history;
        self
    }
}

impl ReturnForecast for ScriptedForecast {
    fn predict_next(&mut self, history: &[PriceBar]) -> Result<f64, TrendError> {
        let value = self.curve.get(self.seen.len()).copied().unwrap_or(0.0);
        self.seen.push(history.len());
        Ok(value)
    }

    fn min_history(&self) -> usize {
        self.min_history
    }
}

/// Forecast that echoes the latest close, so the policy follows the price.
pub struct LastCloseForecast;

impl ReturnForecast for LastCloseForecast {
    fn predict_next(&mut self, history: &[PriceBar]) -> Result<f64, TrendError> {
        Ok(history.last().map(|b| b.close).unwrap_or(0.0))
    }

    fn min_history(&self) -> usize {
        1
    }
}

pub fn make_bar(open: f64, close: f64) -> PriceBar {
    PriceBar::new(open, open.max(close) + 0.5, open.min(close) - 0.5, close)
}

/// Trending sine wave with a small intraday range.
pub fn synthetic_bars(n: usize, offset: usize) -> Vec<PriceBar> {
    (offset..offset + n)
        .map(|i| {
            let t = i as f64;
            let open = 100.0 + 8.0 * (t / 9.0).sin() + 0.05 * t;
            let close = open + 0.6 * (t / 4.0).cos();
            make_bar(open, close)
        })
        .collect()
}

pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes.iter().map(|&c| make_bar(c, c)).collect()
}

pub fn write_prices(dir: &Path, name: &str, bars: &[PriceBar]) -> PathBuf {
    let mut content = String::new();
    for b in bars {
        writeln!(content, "{},{},{},{}", b.open, b.high, b.low, b.close).unwrap();
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Parse an output file back into action values.
pub fn read_actions(path: &Path) -> Vec<i64> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.trim().parse().unwrap())
        .collect()
}
