//! Output port for emitted trading actions and the predicted return curve.

use crate::domain::action::TradingAction;
use crate::domain::error::TrendError;
use std::path::Path;

pub trait ActionPort {
    fn write_actions(&self, path: &Path, actions: &[TradingAction]) -> Result<(), TrendError>;

    fn write_curve(&self, path: &Path, curve: &[f64]) -> Result<(), TrendError>;
}
