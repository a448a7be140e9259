//! Simple Moving Average.
//!
//! SMA[i] = (P[i-n+1] + ... + P[i]) / n, maintained as a moving sum.
//! Warmup: first (n-1) values are undefined (NaN).

/// Trailing arithmetic mean over `window` values.
///
/// Undefined inputs inside the window make the output undefined without
/// poisoning the running sum for later windows. A window longer than the
/// input yields an all-undefined result.
pub fn sma(prices: &[f64], window: usize) -> Vec<f64> {
    let mut values = vec![f64::NAN; prices.len()];
    if window == 0 || prices.len() < window {
        if window > prices.len() && !prices.is_empty() {
            log::debug!(
                "SMA({}) over {} values: not enough data, all undefined",
                window,
                prices.len()
            );
        }
        return values;
    }

    let mut sum = 0.0;
    let mut undefined = 0usize;

    for (i, &price) in prices.iter().enumerate() {
        if price.is_nan() {
            undefined += 1;
        } else {
            sum += price;
        }

        if i >= window {
            let leaving = prices[i - window];
            if leaving.is_nan() {
                undefined -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= window && undefined == 0 {
            values[i] = sum / window as f64;
        }
    }

    values
}
