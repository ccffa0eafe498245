//! Return forecast port.

use crate::domain::error::TrendError;
use crate::domain::price_bar::PriceBar;

pub trait ReturnForecast {
    /// Predict the next point of the return curve from everything seen so far.
    fn predict_next(&mut self, history: &[PriceBar]) -> Result<f64, TrendError>;

    /// Fewest history rows `predict_next` accepts.
    fn min_history(&self) -> usize;
}
