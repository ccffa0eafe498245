//! Replays emitted actions against the testing prices.
//!
//! An action decided on day `i` fills at the open of day `i + 1`. Anything
//! still held after the last action is closed at the final day's close.
//! Positions are a single unit, so profit is in price units.

use super::action::TradingAction;
use super::error::TrendError;
use super::position::Holding;
use super::price_bar::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct ClosedTrade {
    pub units: i64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_day: usize,
    pub exit_day: usize,
    pub pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestSummary {
    pub total_profit: f64,
    pub trades: Vec<ClosedTrade>,
    pub win_rate: f64,
    /// Largest peak-to-trough fall of marked-to-close equity.
    pub max_drawdown: f64,
    /// Units held after the last action, before the closing fill.
    pub final_holding: i64,
}

impl BacktestSummary {
    pub fn wins(&self) -> usize {
        self.trades.iter().filter(|t| t.pnl > 0.0).count()
    }
}

struct OpenTrade {
    units: i64,
    entry_price: f64,
    entry_day: usize,
}

pub fn evaluate(
    testing: &[PriceBar],
    actions: &[TradingAction],
    allow_shorting: bool,
) -> Result<BacktestSummary, TrendError> {
    if actions.len() != testing.len().saturating_sub(1) {
        return Err(TrendError::InvalidAction {
            reason: format!(
                "{} actions for {} testing days, expected {}",
                actions.len(),
                testing.len(),
                testing.len().saturating_sub(1)
            ),
        });
    }

    let mut holding = Holding::new(allow_shorting);
    let mut cash = 0.0;
    let mut open: Option<OpenTrade> = None;
    let mut trades = Vec::new();
    let mut peak = 0.0_f64;
    let mut max_drawdown = 0.0_f64;

    for (i, &action) in actions.iter().enumerate() {
        let day = i + 1;
        let fill = testing[day].open;
        let before = holding.units();
        let after = holding.apply(action)?;
        cash -= action.value() as f64 * fill;

        if before == 0 && after != 0 {
            open = Some(OpenTrade {
                units: after,
                entry_price: fill,
                entry_day: day,
            });
        } else if before != 0 && after == 0 {
            if let Some(entry) = open.take() {
                trades.push(close_trade(entry, fill, day));
            }
        }

        let equity = cash + after as f64 * testing[day].close;
        peak = peak.max(equity);
        max_drawdown = max_drawdown.max(peak - equity);
    }

    let final_holding = holding.units();
    if let (Some(entry), Some(last)) = (open.take(), testing.last()) {
        cash += entry.units as f64 * last.close;
        trades.push(close_trade(entry, last.close, testing.len() - 1));
    }

    let win_rate = if trades.is_empty() {
        0.0
    } else {
        trades.iter().filter(|t| t.pnl > 0.0).count() as f64 / trades.len() as f64
    };

    Ok(BacktestSummary {
        total_profit: cash,
        trades,
        win_rate,
        max_drawdown,
        final_holding,
    })
}

fn close_trade(entry: OpenTrade, exit_price: f64, exit_day: usize) -> ClosedTrade {
    ClosedTrade {
        units: entry.units,
        entry_price: entry.entry_price,
        exit_price,
        entry_day: entry.entry_day,
        exit_day,
        pnl: entry.units as f64 * (exit_price - entry.entry_price),
    }
}
