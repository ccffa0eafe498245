//! Units held between trading days.

use super::action::TradingAction;
use super::error::TrendError;

/// Units currently held. Long-only holdings stay in {0, 1}; with shorting
/// the range widens to {-1, 0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Holding {
    units: i64,
    allow_shorting: bool,
}

impl Holding {
    pub fn new(allow_shorting: bool) -> Self {
        Self {
            units: 0,
            allow_shorting,
        }
    }

    pub fn units(&self) -> i64 {
        self.units
    }

    pub fn lower_bound(&self) -> i64 {
        if self.allow_shorting { -1 } else { 0 }
    }

    pub fn upper_bound(&self) -> i64 {
        1
    }

    pub fn can_buy(&self) -> bool {
        self.units < self.upper_bound()
    }

    pub fn can_sell(&self) -> bool {
        self.units > self.lower_bound()
    }

    pub fn apply(&mut self, action: TradingAction) -> Result<i64, TrendError> {
        let next = self.units + action.value();
        if next < self.lower_bound() || next > self.upper_bound() {
            return Err(TrendError::InvalidAction {
                reason: format!(
                    "{action} would move holding from {} to {next} (allowed {}..={})",
                    self.units,
                    self.lower_bound(),
                    self.upper_bound()
                ),
            });
        }
        self.units = next;
        Ok(next)
    }
}
