//! Validated, immutable price series.

use chrono::NaiveDate;

use super::error::SigtraderError;
use super::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, rejecting empty input, non-finite closes and dates
    /// that are not strictly increasing.
    pub fn new(symbol: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SigtraderError> {
        let symbol = symbol.into();
        if bars.is_empty() {
            return Err(SigtraderError::invalid_input(format!(
                "price series for {symbol} is empty"
            )));
        }

        for (i, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() {
                return Err(SigtraderError::invalid_input(format!(
                    "non-numeric close for {symbol} on {}",
                    bar.date
                )));
            }
            if i > 0 && bar.date <= bars[i - 1].date {
                return Err(SigtraderError::invalid_input(format!(
                    "dates for {symbol} are not strictly increasing at {} (previous {})",
                    bar.date,
                    bars[i - 1].date
                )));
            }
        }

        Ok(PriceSeries { symbol, bars })
    }

    /// Convenience constructor for close-only series.
    pub fn from_closes(
        symbol: impl Into<String>,
        start: NaiveDate,
        closes: &[f64],
    ) -> Result<Self, SigtraderError> {
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar::from_close(start + chrono::Duration::days(i as i64), close))
            .collect();
        Self::new(symbol, bars)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> NaiveDate {
        self.bars[0].date
    }

    pub fn last_date(&self) -> NaiveDate {
        self.bars[self.bars.len() - 1].date
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// High prices; every bar must carry one.
    pub fn highs(&self) -> Result<Vec<f64>, SigtraderError> {
        self.required_column("high", |b| b.high)
    }

    /// Low prices; every bar must carry one.
    pub fn lows(&self) -> Result<Vec<f64>, SigtraderError> {
        self.required_column("low", |b| b.low)
    }

    fn required_column(
        &self,
        name: &str,
        get: impl Fn(&PriceBar) -> Option<f64>,
    ) -> Result<Vec<f64>, SigtraderError> {
        self.bars
            .iter()
            .map(|bar| {
                get(bar).filter(|v| v.is_finite()).ok_or_else(|| {
                    SigtraderError::invalid_input(format!(
                        "missing {name} for {} on {}",
                        self.symbol, bar.date
                    ))
                })
            })
            .collect()
    }
}
