//! RSI (Relative Strength Index).
//!
//! Gains and losses of consecutive closes are averaged with SMA(n):
//! RSI = 100 - 100 / (1 + avg_gain / (avg_loss + 1e-10)).
//!
//! The output is indexed by price change, so it is one shorter than the
//! input: value k describes the move from bar k to bar k+1. Warmup: the
//! first (n-1) changes are undefined, i.e. bars 0..n carry no RSI.

use super::sma::sma;

pub const DEFAULT_WINDOW: usize = 14;

/// Keeps a flat market from dividing by zero.
pub const LOSS_EPSILON: f64 = 1e-10;

pub fn rsi(prices: &[f64], window: usize) -> Vec<f64> {
    if prices.len() < 2 {
        return Vec::new();
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let delta = w[1] - w[0];
            (
                if delta > 0.0 { delta } else { 0.0 },
                if delta < 0.0 { -delta } else { 0.0 },
            )
        })
        .unzip();

    let avg_gain = sma(&gains, window);
    let avg_loss = sma(&losses, window);

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(&gain, &loss)| {
            let rs = non_negative(gain) / (non_negative(loss) + LOSS_EPSILON);
            100.0 - 100.0 / (1.0 + rs)
        })
        .collect()
}

/// RSI for price bar `bar`, undefined at bar 0 and during warmup.
pub fn rsi_at_bar(rsi: &[f64], bar: usize) -> f64 {
    bar.checked_sub(1)
        .and_then(|k| rsi.get(k).copied())
        .unwrap_or(f64::NAN)
}

/// Moving-sum drift can leave values like -1e-17 where the exact average
/// of non-negative numbers is 0. NaN passes through.
fn non_negative(value: f64) -> f64 {
    if value < 0.0 { 0.0 } else { value }
}
