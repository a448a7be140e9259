//! Performance aggregation: round-trip pairing, monthly returns and summary
//! statistics over a finished portfolio.

use super::backtest::BacktestResult;
use super::portfolio::{EquityPoint, Portfolio};
use super::position::{Trade, TradeAction};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.0;

/// One closed round trip: a SELL and the BUY that opened it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeReturn {
    pub symbol: String,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub buy_price: f64,
    pub sell_price: f64,
    pub shares: u64,
    pub profit_loss: f64,
    /// Percent of the entry cost.
    pub return_pct: f64,
    #[serde(rename = "duration")]
    pub duration_days: i64,
}

/// Year → month (1-12) → compounded return in percent.
pub type MonthlyReturns = BTreeMap<i32, BTreeMap<u32, f64>>;

/// Match every SELL with the latest earlier BUY of the same symbol that has
/// not been matched yet. A SELL with no such BUY is dropped.
pub fn pair_trades(history: &[Trade]) -> Vec<TradeReturn> {
    let mut open: BTreeMap<&str, Vec<&Trade>> = BTreeMap::new();
    let mut pairs = Vec::new();

    for trade in history {
        match trade.action {
            TradeAction::Buy { .. } => open.entry(trade.symbol.as_str()).or_default().push(trade),
            TradeAction::Sell { profit_loss, .. } => {
                let Some(buy) = open.get_mut(trade.symbol.as_str()).and_then(Vec::pop) else {
                    log::warn!("{} SELL {} has no matching BUY", trade.date, trade.symbol);
                    continue;
                };
                let entry_cost = buy.quantity as f64 * buy.price;
                let return_pct = if entry_cost > 0.0 {
                    profit_loss / entry_cost * 100.0
                } else {
                    0.0
                };
                pairs.push(TradeReturn {
                    symbol: trade.symbol.clone(),
                    buy_date: buy.date,
                    sell_date: trade.date,
                    buy_price: buy.price,
                    sell_price: trade.price,
                    shares: trade.quantity,
                    profit_loss,
                    return_pct,
                    duration_days: (trade.date - buy.date).num_days(),
                });
            }
        }
    }

    pairs
}

/// Sample-over-sample returns compounded within each calendar month.
///
/// The first sample has no predecessor and contributes nothing, so its month
/// compounds only the remaining samples. Months between the first and last
/// sample that hold no samples report 0.
pub fn monthly_returns(equity_curve: &[EquityPoint]) -> MonthlyReturns {
    let mut growth: BTreeMap<(i32, u32), f64> = BTreeMap::new();

    if let Some(first) = equity_curve.first() {
        growth.insert((first.date.year(), first.date.month()), 1.0);
    }

    for w in equity_curve.windows(2) {
        let (prev, curr) = (w[0].portfolio_value, w[1].portfolio_value);
        let daily = if prev != 0.0 { curr / prev - 1.0 } else { 0.0 };
        *growth
            .entry((w[1].date.year(), w[1].date.month()))
            .or_insert(1.0) *= 1.0 + daily;
    }

    if let (Some(&first), Some(&last)) = (growth.keys().next(), growth.keys().next_back()) {
        let mut month = first;
        while month < last {
            growth.entry(month).or_insert(1.0);
            month = next_month(month);
        }
    }

    let mut out = MonthlyReturns::new();
    for ((year, month), factor) in growth {
        out.entry(year)
            .or_default()
            .insert(month, (factor - 1.0) * 100.0);
    }
    out
}

fn next_month((year, month): (i32, u32)) -> (i32, u32) {
    if month == 12 { (year + 1, 1) } else { (year, month + 1) }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: i64,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_trade_duration: f64,
}

impl Metrics {
    pub fn compute(portfolio: &Portfolio, risk_free_rate: f64) -> Self {
        let equity_curve = portfolio.equity_curve();
        let trades = pair_trades(portfolio.trade_history());
        let initial_capital = portfolio.initial_capital();

        let final_value = equity_curve
            .last()
            .map(|p| p.portfolio_value)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_value - initial_capital) / initial_capital
        } else {
            0.0
        };

        let years = equity_curve.len() as f64 / TRADING_DAYS_PER_YEAR;
        let annualized_return = if years > 0.0 && total_return > -1.0 {
            (1.0 + total_return).powf(1.0 / years) - 1.0
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);
        let sharpe_ratio = compute_sharpe(equity_curve, risk_free_rate / TRADING_DAYS_PER_YEAR);

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_duration_days = 0i64;

        for trade in &trades {
            let pnl = trade.profit_loss;
            if pnl > 0.0 {
                trades_won += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else if pnl < 0.0 {
                trades_lost += 1;
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            } else {
                trades_breakeven += 1;
            }
            total_duration_days += trade.duration_days;
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            trades_won as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if trades_won > 0 {
            total_wins / trades_won as f64
        } else {
            0.0
        };

        let avg_loss = if trades_lost > 0 {
            total_losses / trades_lost as f64
        } else {
            0.0
        };

        let avg_trade_duration = if total_trades > 0 {
            total_duration_days as f64 / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            initial_capital,
            final_value,
            total_return,
            annualized_return,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_trade_duration,
        }
    }
}

/// Dashboard payload: equity curve, summary metrics, round trips and the
/// monthly return grid.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub symbol: String,
    pub strategy: String,
    pub equity_curve: Vec<EquityPoint>,
    pub metrics: Metrics,
    pub trade_list: Vec<TradeReturn>,
    pub monthly_returns: MonthlyReturns,
}

impl DashboardData {
    pub fn from_result(result: &BacktestResult, risk_free_rate: f64) -> Self {
        let portfolio = &result.portfolio;
        DashboardData {
            symbol: result.symbol.clone(),
            strategy: result.strategy.to_string(),
            equity_curve: portfolio.equity_curve().to_vec(),
            metrics: Metrics::compute(portfolio, risk_free_rate),
            trade_list: pair_trades(portfolio.trade_history()),
            monthly_returns: monthly_returns(portfolio.equity_curve()),
        }
    }
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, i64) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.portfolio_value;
    let mut max_dd = 0.0_f64;
    let mut max_dd_duration = 0i64;
    let mut current_dd_duration = 0i64;

    for point in equity_curve {
        if point.portfolio_value > peak {
            peak = point.portfolio_value;
            current_dd_duration = 0;
        } else if peak > 0.0 && point.portfolio_value < peak {
            max_dd = max_dd.max((peak - point.portfolio_value) / peak);
            current_dd_duration += 1;
            max_dd_duration = max_dd_duration.max(current_dd_duration);
        }
    }

    (max_dd, max_dd_duration)
}

fn compute_sharpe(equity_curve: &[EquityPoint], daily_rf: f64) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let (prev, curr) = (w[0].portfolio_value, w[1].portfolio_value);
            if prev > 0.0 { (curr - prev) / prev } else { 0.0 }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();

    if stddev > 0.0 {
        ((mean - daily_rf) / stddev) * TRADING_DAYS_PER_YEAR.sqrt()
    } else {
        0.0
    }
}
