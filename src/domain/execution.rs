//! Order sizing and execution outcomes.
//!
//! Fills happen at the signal bar's price with no slippage or commission.
//! Quantities are whole shares.

use serde::Serialize;

use super::position::Trade;

/// Fraction of cash committed to a BUY when no explicit quantity is given.
pub const DEFAULT_PERCENT_RISK: f64 = 0.02;

/// Sizing parameters for one `execute_trade` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExecutionParams {
    /// Fixed lot size; overrides `percent_risk` when set.
    pub quantity: Option<u64>,
    pub percent_risk: f64,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        ExecutionParams {
            quantity: None,
            percent_risk: DEFAULT_PERCENT_RISK,
        }
    }
}

/// Why a signal produced no trade. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    Hold,
    /// BUY for a symbol that already has an open lot.
    PositionAlreadyOpen,
    /// BUY that cannot afford a single share.
    InsufficientFunds,
    /// SELL with nothing to sell.
    NoOpenPosition,
    /// Fill price is NaN, infinite, zero or negative.
    InvalidPrice,
}

/// Result of one `execute_trade` call.
#[derive(Debug, Clone, PartialEq)]
pub enum TradeOutcome {
    Executed(Trade),
    Skipped(SkipReason),
}

impl TradeOutcome {
    pub fn trade(&self) -> Option<&Trade> {
        match self {
            TradeOutcome::Executed(trade) => Some(trade),
            TradeOutcome::Skipped(_) => None,
        }
    }
}

/// Shares to buy at `price` with `cash` available.
///
/// Desired size is the explicit quantity, else floor(cash * percent_risk /
/// price). A desired cost above `cash` is clamped to floor(cash / price).
pub fn buy_quantity(cash: f64, price: f64, params: &ExecutionParams) -> u64 {
    if price.is_nan() || price <= 0.0 || cash.is_nan() || cash <= 0.0 {
        return 0;
    }

    let desired = match params.quantity {
        Some(quantity) => quantity,
        None => whole_shares(cash * params.percent_risk / price),
    };

    if desired as f64 * price > cash {
        whole_shares(cash / price)
    } else {
        desired
    }
}

fn whole_shares(shares: f64) -> u64 {
    if shares > 0.0 { shares.floor() as u64 } else { 0 }
}
