//! Bollinger Bands.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (num_std × StdDev)
//! - Lower: Middle - (num_std × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: window=20, num_std=2.0
//! Warmup: first (window-1) bars are undefined.

use super::sma::sma;

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_NUM_STD: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerBands {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

pub fn bollinger_bands(prices: &[f64], window: usize, num_std: f64) -> BollingerBands {
    let middle = sma(prices, window);
    let std = rolling_std(prices, window);

    let upper = middle.iter().zip(&std).map(|(m, s)| m + s * num_std).collect();
    let lower = middle.iter().zip(&std).map(|(m, s)| m - s * num_std).collect();

    BollingerBands {
        upper,
        middle,
        lower,
    }
}

/// Population standard deviation over each trailing window.
pub fn rolling_std(prices: &[f64], window: usize) -> Vec<f64> {
    let mut values = vec![f64::NAN; prices.len()];
    if window == 0 || prices.len() < window {
        return values;
    }

    for i in (window - 1)..prices.len() {
        let slice = &prices[i + 1 - window..=i];
        let mean = slice.iter().sum::<f64>() / window as f64;
        let variance = slice
            .iter()
            .map(|p| {
                let diff = p - mean;
                diff * diff
            })
            .sum::<f64>()
            / window as f64;
        values[i] = variance.sqrt();
    }

    values
}
