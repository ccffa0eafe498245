//! Day-by-day trading session over the testing period.

use tracing::debug;

use super::action::TradingAction;
use super::error::TrendError;
use super::policy::TradingPolicy;
use super::price_bar::PriceBar;
use crate::ports::forecast_port::ReturnForecast;

#[derive(Debug, Clone, PartialEq)]
pub struct TradingConfig {
    /// Training rows carried into the session as starting history.
    pub history_len: usize,
    pub allow_shorting: bool,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            history_len: 256,
            allow_shorting: false,
        }
    }
}

/// Actions emitted for each testing day but the last, and the return curve
/// that drove them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOutcome {
    pub actions: Vec<TradingAction>,
    pub curve: Vec<f64>,
}

/// Walk the testing days in order. Each day is appended to the history before
/// predicting, and its action executes at the next day's open, so the final
/// day gets no action.
pub fn run_session(
    forecast: &mut dyn ReturnForecast,
    training: &[PriceBar],
    testing: &[PriceBar],
    history_len: usize,
    policy: &mut TradingPolicy,
) -> Result<SessionOutcome, TrendError> {
    let trading_days = testing.len().saturating_sub(1);
    if trading_days == 0 {
        return Ok(SessionOutcome::default());
    }

    let start = training.len().saturating_sub(history_len);
    let mut history: Vec<PriceBar> = training[start..].to_vec();
    let needed = forecast.min_history();
    if history.len() + 1 < needed {
        return Err(TrendError::InsufficientData {
            needed: needed - 1,
            have: history.len(),
        });
    }

    let mut outcome = SessionOutcome {
        actions: Vec::with_capacity(trading_days),
        curve: Vec::with_capacity(trading_days),
    };
    for (day, bar) in testing[..trading_days].iter().enumerate() {
        // The day's own bar is in the window. Predicting from the history
        // before this push would act on input one day stale.
        history.push(bar.clone());
        let prediction = forecast.predict_next(&history)?;
        let action = policy.decide(prediction)?;
        debug!(
            day,
            prediction,
            action = action.value(),
            holding = policy.holding().units(),
            "decided"
        );
        outcome.actions.push(action);
        outcome.curve.push(prediction);
    }
    Ok(outcome)
}
