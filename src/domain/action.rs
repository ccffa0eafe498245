//! Daily trading actions.

use std::fmt;

use super::error::TrendError;

/// One daily decision. The integer value is what the output file carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradingAction {
    Buy,
    Hold,
    Sell,
}

impl TradingAction {
    pub fn value(self) -> i64 {
        match self {
            TradingAction::Buy => 1,
            TradingAction::Hold => 0,
            TradingAction::Sell => -1,
        }
    }
}

impl fmt::Display for TradingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

impl TryFrom<i64> for TradingAction {
    type Error = TrendError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TradingAction::Buy),
            0 => Ok(TradingAction::Hold),
            -1 => Ok(TradingAction::Sell),
            other => Err(TrendError::InvalidAction {
                reason: format!("{other} is not one of -1, 0, 1"),
            }),
        }
    }
}
