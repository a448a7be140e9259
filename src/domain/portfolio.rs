//! Portfolio ledger: cash, open lots, trade history and equity curve.
//!
//! State changes only through [`Portfolio::execute_trade`] and
//! [`Portfolio::update_portfolio_value`]; everything else is read-only.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::execution::{buy_quantity, ExecutionParams, SkipReason, TradeOutcome};
use super::position::{Position, Trade, TradeAction};
use super::signal::Signal;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    #[serde(rename = "value")]
    pub portfolio_value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    cash: f64,
    initial_capital: f64,
    positions: BTreeMap<String, Position>,
    trade_history: Vec<Trade>,
    equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: BTreeMap::new(),
            trade_history: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn initial_capital(&self) -> f64 {
        self.initial_capital
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn trade_history(&self) -> &[Trade] {
        &self.trade_history
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Back to the freshly funded state, for reuse across runs.
    pub fn reset(&mut self) {
        *self = Portfolio::new(self.initial_capital);
    }

    /// Apply one signal at `price`.
    ///
    /// BUY opens a single lot sized by `params` unless one is already open or
    /// not even one share is affordable. SELL closes the whole lot. HOLD and
    /// unmatched signals are skipped without touching the ledger.
    pub fn execute_trade(
        &mut self,
        symbol: &str,
        signal: Signal,
        price: f64,
        date: NaiveDate,
        params: &ExecutionParams,
    ) -> TradeOutcome {
        let outcome = match signal {
            Signal::Hold => TradeOutcome::Skipped(SkipReason::Hold),
            _ if !(price.is_finite() && price > 0.0) => {
                TradeOutcome::Skipped(SkipReason::InvalidPrice)
            }
            Signal::Buy => self.open_position(symbol, price, date, params),
            Signal::Sell => self.close_position(symbol, price, date),
        };

        if let TradeOutcome::Skipped(reason) = outcome {
            if reason != SkipReason::Hold {
                log::debug!("{} {} {} at {:.4} skipped: {:?}", date, signal, symbol, price, reason);
            }
        }

        outcome
    }

    /// Mark to market: cash plus every open lot at its current price. Lots
    /// without a price contribute nothing. Appends one equity sample.
    pub fn update_portfolio_value(
        &mut self,
        current_prices: &HashMap<String, f64>,
        date: NaiveDate,
    ) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .filter_map(|pos| {
                current_prices
                    .get(&pos.symbol)
                    .map(|&price| pos.market_value(price))
            })
            .sum();
        let portfolio_value = self.cash + position_value;

        self.equity_curve.push(EquityPoint {
            date,
            portfolio_value,
        });

        portfolio_value
    }

    fn open_position(
        &mut self,
        symbol: &str,
        price: f64,
        date: NaiveDate,
        params: &ExecutionParams,
    ) -> TradeOutcome {
        if self.has_position(symbol) {
            return TradeOutcome::Skipped(SkipReason::PositionAlreadyOpen);
        }

        let quantity = buy_quantity(self.cash, price, params);
        if quantity == 0 {
            return TradeOutcome::Skipped(SkipReason::InsufficientFunds);
        }

        let cost = quantity as f64 * price;
        // float rounding must not push cash below zero
        self.cash = (self.cash - cost).max(0.0);

        self.positions.insert(
            symbol.to_string(),
            Position {
                symbol: symbol.to_string(),
                quantity,
                entry_price: price,
                entry_date: date,
            },
        );

        self.record(Trade {
            date,
            symbol: symbol.to_string(),
            action: TradeAction::Buy { cost },
            price,
            quantity,
            cash_after: self.cash,
        })
    }

    fn close_position(&mut self, symbol: &str, price: f64, date: NaiveDate) -> TradeOutcome {
        let Some(position) = self.positions.remove(symbol) else {
            return TradeOutcome::Skipped(SkipReason::NoOpenPosition);
        };

        let revenue = position.market_value(price);
        let profit_loss = revenue - position.cost_basis();
        self.cash += revenue;

        self.record(Trade {
            date,
            symbol: position.symbol,
            action: TradeAction::Sell {
                revenue,
                profit_loss,
            },
            price,
            quantity: position.quantity,
            cash_after: self.cash,
        })
    }

    fn record(&mut self, trade: Trade) -> TradeOutcome {
        self.trade_history.push(trade.clone());
        TradeOutcome::Executed(trade)
    }
}
