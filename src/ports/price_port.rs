//! Price history source port.

use crate::domain::error::TrendError;
use crate::domain::price_bar::PriceBar;
use std::path::Path;

pub trait PricePort {
    /// Load a daily price history in chronological order.
    fn load_prices(&self, path: &Path) -> Result<Vec<PriceBar>, TrendError>;
}
