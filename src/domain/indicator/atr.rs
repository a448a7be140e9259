//! Average True Range.
//!
//! TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|), undefined at bar 0 because
//! there is no previous close. ATR = SMA(TR, n), so the first n bars are
//! undefined.

use super::sma::sma;
use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::true_range;
use crate::domain::price_series::PriceSeries;

pub const DEFAULT_WINDOW: usize = 14;

/// ATR over parallel high/low/close arrays. Output follows `close`; bars
/// missing from `high` or `low` are undefined.
pub fn atr(high: &[f64], low: &[f64], close: &[f64], window: usize) -> Vec<f64> {
    let tr: Vec<f64> = (0..close.len())
        .map(|i| {
            let prev_close = if i == 0 { f64::NAN } else { close[i - 1] };
            let h = high.get(i).copied().unwrap_or(f64::NAN);
            let l = low.get(i).copied().unwrap_or(f64::NAN);
            true_range(h, l, prev_close)
        })
        .collect();

    sma(&tr, window)
}

/// ATR for a series; every bar must carry high and low.
pub fn atr_for_series(series: &PriceSeries, window: usize) -> Result<Vec<f64>, SigtraderError> {
    let high = series.highs()?;
    let low = series.lows()?;
    Ok(atr(&high, &low, &series.closes(), window))
}
