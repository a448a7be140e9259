//! Open positions and the immutable trade log.

use chrono::NaiveDate;
use serde::Serialize;

/// A single open lot. At most one exists per symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: u64,
    pub entry_price: f64,
    pub entry_date: NaiveDate,
}

impl Position {
    pub fn cost_basis(&self) -> f64 {
        self.quantity as f64 * self.entry_price
    }

    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity as f64 * price
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.market_value(price) - self.cost_basis()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy { cost: f64 },
    Sell { revenue: f64, profit_loss: f64 },
}

/// A completed BUY or SELL. Appended to the history, never changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub symbol: String,
    #[serde(flatten)]
    pub action: TradeAction,
    pub price: f64,
    pub quantity: u64,
    pub cash_after: f64,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        matches!(self.action, TradeAction::Buy { .. })
    }

    pub fn is_sell(&self) -> bool {
        matches!(self.action, TradeAction::Sell { .. })
    }

    /// Realized profit/loss; only SELL trades carry one.
    pub fn profit_loss(&self) -> Option<f64> {
        match self.action {
            TradeAction::Sell { profit_loss, .. } => Some(profit_loss),
            TradeAction::Buy { .. } => None,
        }
    }
}
