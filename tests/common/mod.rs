#![allow(dead_code)]

use chrono::NaiveDate;
use sigtrader::domain::backtest::BacktestConfig;
use sigtrader::domain::error::SigtraderError;
use sigtrader::domain::metrics::DashboardData;
pub use sigtrader::domain::ohlcv::PriceBar;
use sigtrader::domain::price_series::PriceSeries;
use sigtrader::ports::data_port::DataPort;
use sigtrader::ports::report_port::ReportPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), SigtraderError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(SigtraderError::Data {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn load_series(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SigtraderError> {
        self.check(symbol)?;
        let bars = self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .collect();
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        self.check(symbol)?;
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

/// Captures every dashboard handed to it instead of writing files.
pub struct MockReportPort {
    pub calls: RefCell<Vec<(DashboardData, PathBuf)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write(&self, dashboard: &DashboardData, output_path: &Path) -> Result<(), SigtraderError> {
        self.calls
            .borrow_mut()
            .push((dashboard.clone(), output_path.to_path_buf()));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: Some(close - 1.0),
        high: Some(close + 1.0),
        low: Some(close - 2.0),
        close,
        volume: Some(1000),
    }
}

/// Consecutive daily bars with the given closes.
pub fn bars_from_closes(start_date: &str, closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            open: Some(close),
            high: Some(close + 1.0),
            low: Some(close - 1.0),
            close,
            volume: Some(1000),
        })
        .collect()
}

/// Falls, rallies through the averages, then falls again. A (2,4) moving
/// average crossover buys at bar 6 and sells at bar 11.
pub const CROSSOVER_CLOSES: [f64; 14] = [
    10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 9.0, 11.0, 14.0, 17.0, 14.0, 11.0, 8.0, 5.0,
];

/// A slow sine wave around 100 with a gentle drift; long enough for every
/// default strategy to evaluate.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            100.0 + 0.02 * t + 15.0 * (t / 12.0).sin()
        })
        .collect()
}

pub fn fixed_lot_config(quantity: u64) -> BacktestConfig {
    BacktestConfig {
        quantity: Some(quantity),
        ..BacktestConfig::default()
    }
}

pub fn write_csv(dir: &Path, symbol: &str, closes: &[f64]) {
    let mut content = String::from("date,open,high,low,close,volume\n");
    for bar in bars_from_closes("2024-01-01", closes) {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            bar.date,
            bar.open.unwrap(),
            bar.high.unwrap(),
            bar.low.unwrap(),
            bar.close,
            bar.volume.unwrap()
        ));
    }
    std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
}
