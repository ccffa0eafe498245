//! Daily price bar representation.

use chrono::NaiveDate;

/// Number of price columns fed to the model (open, high, low, close).
pub const PRICE_COLUMNS: usize = 4;

/// Index of the close column within [`PriceBar::columns`].
pub const CLOSE: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: Option<NaiveDate>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    pub fn new(open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            date: None,
            open,
            high,
            low,
            close,
        }
    }

    /// [open, high, low, close]
    pub fn columns(&self) -> [f64; PRICE_COLUMNS] {
        [self.open, self.high, self.low, self.close]
    }
}

impl From<[f64; PRICE_COLUMNS]> for PriceBar {
    fn from(c: [f64; PRICE_COLUMNS]) -> Self {
        PriceBar::new(c[0], c[1], c[2], c[3])
    }
}
