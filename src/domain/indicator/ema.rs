//! Exponential Moving Average.
//!
//! alpha = 2/(n+1), seeded with the first price, then
//! EMA[i] = alpha*P[i] + (1-alpha)*EMA[i-1]. Defined at every index.

pub fn ema(prices: &[f64], window: usize) -> Vec<f64> {
    let Some(&seed) = prices.first() else {
        return Vec::new();
    };

    let alpha = smoothing_factor(window);
    let mut values = Vec::with_capacity(prices.len());
    values.push(seed);

    let mut prev = seed;
    for &price in &prices[1..] {
        prev = alpha * price + (1.0 - alpha) * prev;
        values.push(prev);
    }

    values
}

pub fn smoothing_factor(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}
