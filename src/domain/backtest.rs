//! Backtest parameters and the bar-by-bar replay loop.

use chrono::NaiveDate;
use std::collections::HashMap;

use super::execution::{ExecutionParams, DEFAULT_PERCENT_RISK};
use super::portfolio::Portfolio;
use super::price_series::PriceSeries;
use super::signal::Signal;
use super::strategy::Strategy;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub percent_risk: f64,
    pub quantity: Option<u64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            percent_risk: DEFAULT_PERCENT_RISK,
            quantity: None,
            start_date: None,
            end_date: None,
        }
    }
}

impl BacktestConfig {
    pub fn execution_params(&self) -> ExecutionParams {
        ExecutionParams {
            quantity: self.quantity,
            percent_risk: self.percent_risk,
        }
    }
}

/// Everything a report needs from one run.
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    pub strategy: Strategy,
    pub dates: Vec<NaiveDate>,
    pub signals: Vec<Signal>,
    pub portfolio: Portfolio,
}

impl BacktestResult {
    pub fn final_value(&self) -> f64 {
        self.portfolio
            .equity_curve()
            .last()
            .map(|p| p.portfolio_value)
            .unwrap_or_else(|| self.portfolio.cash())
    }
}

/// Generate signals for `series` and replay them through a fresh portfolio.
///
/// Every bar is filled at its close and then marked to market, so the equity
/// curve has exactly one sample per bar.
pub fn run_backtest(
    series: &PriceSeries,
    strategy: &Strategy,
    config: &BacktestConfig,
) -> BacktestResult {
    let signals = strategy.generate_signals(series);
    let params = config.execution_params();
    let symbol = series.symbol().to_string();
    let mut portfolio = Portfolio::new(config.initial_capital);
    let mut prices: HashMap<String, f64> = HashMap::with_capacity(1);

    for (bar, &signal) in series.bars().iter().zip(&signals) {
        let outcome = portfolio.execute_trade(&symbol, signal, bar.close, bar.date, &params);
        if let Some(trade) = outcome.trade() {
            log::debug!(
                "{} {} {} x{} @ {:.4}",
                trade.date,
                signal,
                trade.symbol,
                trade.quantity,
                trade.price
            );
        }

        prices.insert(symbol.clone(), bar.close);
        portfolio.update_portfolio_value(&prices, bar.date);
    }

    log::info!(
        "{} on {}: {} bars, {} trades",
        strategy,
        symbol,
        series.len(),
        portfolio.trade_history().len()
    );
    if let (Some(position), Some(last)) = (portfolio.get_position(&symbol), series.bars().last()) {
        log::info!(
            "{} still open: {} shares, unrealized P/L {:.2}",
            symbol,
            position.quantity,
            position.unrealized_pnl(last.close)
        );
    }

    BacktestResult {
        symbol,
        strategy: strategy.clone(),
        dates: series.dates(),
        signals,
        portfolio,
    }
}
