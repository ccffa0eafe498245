//! Turns a stream of return predictions into trading actions.

use super::action::TradingAction;
use super::error::TrendError;
use super::position::Holding;

/// Buys into a rising prediction and sells out of a falling one, within the
/// holding limits.
#[derive(Debug, Clone)]
pub struct TradingPolicy {
    holding: Holding,
    previous: f64,
}

impl TradingPolicy {
    pub fn new(allow_shorting: bool) -> Self {
        Self {
            holding: Holding::new(allow_shorting),
            previous: 0.0,
        }
    }

    pub fn holding(&self) -> &Holding {
        &self.holding
    }

    pub fn decide(&mut self, prediction: f64) -> Result<TradingAction, TrendError> {
        let action = if prediction > self.previous {
            if self.holding.can_buy() {
                TradingAction::Buy
            } else {
                TradingAction::Hold
            }
        } else if self.holding.can_sell() {
            TradingAction::Sell
        } else {
            TradingAction::Hold
        };

        self.holding.apply(action)?;
        self.previous = prediction;
        Ok(action)
    }
}
