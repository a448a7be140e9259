//! Price bar representation.

use chrono::NaiveDate;

/// One row of a price series. Only `close` is mandatory; `high` and `low`
/// are needed by range-based indicators such as ATR.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<i64>,
}

impl PriceBar {
    /// A bar carrying only a close price.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        PriceBar {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// NaN-propagating true range. `f64::max` drops NaN operands, so an
/// undefined previous close is checked explicitly.
pub fn true_range(high: f64, low: f64, prev_close: f64) -> f64 {
    if high.is_nan() || low.is_nan() || prev_close.is_nan() {
        return f64::NAN;
    }
    let hl = high - low;
    let hc = (high - prev_close).abs();
    let lc = (low - prev_close).abs();
    hl.max(hc).max(lc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_range_hl_dominates() {
        // high-low=20, |110-100|=10, |90-100|=10
        assert!((true_range(110.0, 90.0, 100.0) - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_up() {
        // |110-70|=40 beats high-low=20
        assert!((true_range(110.0, 90.0, 70.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_gap_down() {
        // |90-130|=40 beats high-low=20
        assert!((true_range(110.0, 90.0, 130.0) - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn true_range_undefined_operands() {
        assert!(true_range(110.0, 90.0, f64::NAN).is_nan());
        assert!(true_range(f64::NAN, 90.0, 100.0).is_nan());
    }

    #[test]
    fn from_close_has_no_range() {
        let bar = PriceBar::from_close(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), 10.0);
        assert_eq!(bar.close, 10.0);
        assert!(bar.high.is_none() && bar.low.is_none());
    }
}
