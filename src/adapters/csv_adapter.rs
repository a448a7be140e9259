//! CSV file data adapter.
//!
//! One `<SYMBOL>.csv` per symbol with a header row. Columns are found by
//! header name, case-insensitively: `date` and `close` are required,
//! `open`, `high`, `low` and `volume` are optional.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceBar;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug)]
struct Columns {
    date: usize,
    close: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    volume: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord, path: &str) -> Result<Self, SigtraderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let required = |name: &str| {
            find(name).ok_or_else(|| SigtraderError::Data {
                reason: format!("{} has no '{}' column", path, name),
            })
        };

        Ok(Columns {
            date: required("date")?,
            close: required("close")?,
            open: find("open"),
            high: find("high"),
            low: find("low"),
            volume: find("volume"),
        })
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }

    fn read_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, SigtraderError> {
        let path = self.csv_path(symbol);
        let display = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| SigtraderError::Data {
            reason: format!("failed to read {}: {}", display, e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| SigtraderError::Data {
            reason: format!("{}: CSV header error: {}", display, e),
        })?;
        let cols = Columns::from_headers(headers, &display)?;

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| SigtraderError::Data {
                reason: format!("{}: CSV parse error: {}", display, e),
            })?;
            // header is line 1
            let line = row + 2;

            let date_str = record.get(cols.date).unwrap_or_default();
            let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT).map_err(|e| {
                SigtraderError::Data {
                    reason: format!("{} line {}: invalid date '{}': {}", display, line, date_str, e),
                }
            })?;

            let close_str = record.get(cols.close).unwrap_or_default();
            let close: f64 = close_str.parse().map_err(|_| {
                SigtraderError::invalid_input(format!(
                    "{} line {}: non-numeric close '{}'",
                    display, line, close_str
                ))
            })?;

            bars.push(PriceBar {
                date,
                open: optional_field(&record, cols.open),
                high: optional_field(&record, cols.high),
                low: optional_field(&record, cols.low),
                close,
                volume: optional_field(&record, cols.volume),
            });
        }

        log::debug!("read {} rows from {}", bars.len(), display);
        Ok(bars)
    }
}

/// Blank or unparseable optional cells are treated as absent.
fn optional_field<T: std::str::FromStr>(record: &csv::StringRecord, col: Option<usize>) -> Option<T> {
    col.and_then(|c| record.get(c))
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
}

impl DataPort for CsvAdapter {
    fn load_series(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, SigtraderError> {
        let bars: Vec<PriceBar> = self
            .read_bars(symbol)?
            .into_iter()
            .filter(|b| in_range(b.date, start_date, end_date))
            .collect();
        PriceSeries::new(symbol, bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| SigtraderError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| SigtraderError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        let bars = self.read_bars(symbol)?;
        let first = bars.iter().map(|b| b.date).min();
        let last = bars.iter().map(|b| b.date).max();
        Ok(first.zip(last).map(|(first, last)| (first, last, bars.len())))
    }
}
