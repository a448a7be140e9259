//! Technical indicator implementations.
//!
//! Every indicator is a pure function from price arrays to a freshly
//! allocated array aligned with its input. Warmup positions hold NaN.
//!
//! - `IndicatorType`: indicator identity + parameters, used to describe
//!   what a strategy consumes and to select an indicator from the CLI
//! - `compute_indicator`: evaluates an `IndicatorType` over a price series

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::{atr, atr_for_series};
pub use bollinger::{bollinger_bands, BollingerBands};
pub use ema::ema;
pub use macd::{macd, Macd};
pub use rsi::{rsi, rsi_at_bar};
pub use sma::sma;

use std::fmt;
use std::str::FromStr;

use crate::domain::error::SigtraderError;
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Atr(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Bollinger {
        window: usize,
        num_std_x100: u32,
    },
}

/// One named output line, aligned 1:1 with the bars of a series.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorColumn {
    pub name: String,
    pub values: Vec<f64>,
}

impl IndicatorType {
    pub fn bollinger(window: usize, num_std: f64) -> Self {
        IndicatorType::Bollinger {
            window,
            num_std_x100: (num_std * 100.0).round() as u32,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(window) => write!(f, "SMA({})", window),
            IndicatorType::Ema(window) => write!(f, "EMA({})", window),
            IndicatorType::Rsi(window) => write!(f, "RSI({})", window),
            IndicatorType::Atr(window) => write!(f, "ATR({})", window),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Bollinger {
                window,
                num_std_x100,
            } => {
                let mult = *num_std_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", window, mult)
            }
        }
    }
}

/// Parses `name:params`, e.g. `sma:20`, `macd:12,26,9` or `bollinger:20,2`.
/// A bare name takes the indicator's default parameters.
impl FromStr for IndicatorType {
    type Err = SigtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |reason: &str| SigtraderError::invalid_input(format!("indicator '{}': {}", s, reason));
        let (name, params) = match s.trim().split_once(':') {
            Some((name, params)) => (name, Some(params)),
            None => (s.trim(), None),
        };
        let params: Vec<&str> = params
            .map(|p| p.split(',').map(str::trim).collect())
            .unwrap_or_default();
        let window = |idx: usize, default: usize| -> Result<usize, SigtraderError> {
            match params.get(idx) {
                None => Ok(default),
                Some(p) => match p.parse::<usize>() {
                    Ok(w) if w >= 1 => Ok(w),
                    _ => Err(bad("windows must be positive integers")),
                },
            }
        };

        let indicator = match name.to_lowercase().as_str() {
            "sma" => IndicatorType::Sma(window(0, 20)?),
            "ema" => IndicatorType::Ema(window(0, 20)?),
            "rsi" => IndicatorType::Rsi(window(0, rsi::DEFAULT_WINDOW)?),
            "atr" => IndicatorType::Atr(window(0, atr::DEFAULT_WINDOW)?),
            "macd" => IndicatorType::Macd {
                fast: window(0, macd::DEFAULT_FAST)?,
                slow: window(1, macd::DEFAULT_SLOW)?,
                signal: window(2, macd::DEFAULT_SIGNAL)?,
            },
            "bollinger" | "bb" => {
                let num_std = match params.get(1) {
                    None => bollinger::DEFAULT_NUM_STD,
                    Some(p) => match p.parse::<f64>() {
                        // stored in hundredths
                        Ok(k) if k.is_finite() && (k * 100.0).round() >= 1.0 => k,
                        _ => return Err(bad("num_std must be a number of at least 0.01")),
                    },
                };
                IndicatorType::bollinger(window(0, bollinger::DEFAULT_WINDOW)?, num_std)
            }
            _ => return Err(bad("unknown indicator")),
        };
        Ok(indicator)
    }
}

/// Evaluate `indicator` over `series`, returning its output lines aligned to
/// the series' bars. RSI is shifted by one bar so that its first entry sits
/// on bar 1.
pub fn compute_indicator(
    series: &PriceSeries,
    indicator: &IndicatorType,
) -> Result<Vec<IndicatorColumn>, SigtraderError> {
    let closes = series.closes();
    let name = indicator.to_string();

    let columns = match indicator {
        IndicatorType::Sma(window) => vec![column(&name, sma(&closes, *window))],
        IndicatorType::Ema(window) => vec![column(&name, ema(&closes, *window))],
        IndicatorType::Rsi(window) => {
            let values = rsi(&closes, *window);
            let aligned = (0..closes.len()).map(|i| rsi_at_bar(&values, i)).collect();
            vec![column(&name, aligned)]
        }
        IndicatorType::Atr(window) => vec![column(&name, atr_for_series(series, *window)?)],
        IndicatorType::Macd { fast, slow, signal } => {
            let m = macd(&closes, *fast, *slow, *signal);
            vec![
                column("macd", m.line),
                column("signal", m.signal),
                column("histogram", m.histogram),
            ]
        }
        IndicatorType::Bollinger {
            window,
            num_std_x100,
        } => {
            let bands = bollinger_bands(&closes, *window, *num_std_x100 as f64 / 100.0);
            vec![
                column("upper", bands.upper),
                column("middle", bands.middle),
                column("lower", bands.lower),
            ]
        }
    };

    Ok(columns)
}

fn column(name: &str, values: Vec<f64>) -> IndicatorColumn {
    IndicatorColumn {
        name: name.to_string(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        PriceSeries::from_closes("TEST", NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), closes)
            .unwrap()
    }

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        assert_eq!(IndicatorType::bollinger(20, 2.0).to_string(), "BOLLINGER(20,2)");
        assert_eq!(IndicatorType::bollinger(20, 2.5).to_string(), "BOLLINGER(20,2.5)");
    }

    #[test]
    fn parse_with_and_without_params() {
        assert_eq!("sma:50".parse::<IndicatorType>().unwrap(), IndicatorType::Sma(50));
        assert_eq!("RSI".parse::<IndicatorType>().unwrap(), IndicatorType::Rsi(14));
        assert_eq!(
            "macd:5,10".parse::<IndicatorType>().unwrap(),
            IndicatorType::Macd {
                fast: 5,
                slow: 10,
                signal: 9
            }
        );
        assert_eq!(
            "bollinger:10,1.5".parse::<IndicatorType>().unwrap(),
            IndicatorType::bollinger(10, 1.5)
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("vwap:10".parse::<IndicatorType>().is_err());
        assert!("sma:0".parse::<IndicatorType>().is_err());
        assert!("ema:x".parse::<IndicatorType>().is_err());
        assert!("bollinger:20,-1".parse::<IndicatorType>().is_err());
    }

    #[test]
    fn parse_rejects_multiplier_below_hundredths() {
        assert!("bb:20,0.004".parse::<IndicatorType>().is_err());
        assert!("bb:20,inf".parse::<IndicatorType>().is_err());
        assert_eq!(
            "bb:20,0.01".parse::<IndicatorType>().unwrap(),
            IndicatorType::Bollinger {
                window: 20,
                num_std_x100: 1
            }
        );
    }

    #[test]
    fn compute_rsi_is_aligned_to_bars() {
        let s = series(&[10.0, 11.0, 10.0, 12.0, 13.0]);
        let columns = compute_indicator(&s, &IndicatorType::Rsi(3)).unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].name, "RSI(3)");
        assert_eq!(columns[0].values.len(), 5);
        assert!(columns[0].values[2].is_nan());
        assert!((columns[0].values[3] - 75.0).abs() < 1e-6);
    }

    #[test]
    fn compute_macd_has_three_lines() {
        let s = series(&[1.0, 2.0, 3.0, 4.0]);
        let indicator = IndicatorType::Macd {
            fast: 2,
            slow: 3,
            signal: 2,
        };
        let columns = compute_indicator(&s, &indicator).unwrap();
        let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["macd", "signal", "histogram"]);
        assert!(columns.iter().all(|c| c.values.len() == 4));
    }

    #[test]
    fn compute_atr_without_range_fails() {
        let s = series(&[1.0, 2.0, 3.0]);
        assert!(compute_indicator(&s, &IndicatorType::Atr(2)).is_err());
    }

    #[test]
    fn compute_bollinger_uses_multiplier() {
        let s = series(&[10.0, 20.0, 30.0]);
        let columns = compute_indicator(&s, &IndicatorType::bollinger(3, 1.0)).unwrap();
        let spread = columns[0].values[2] - columns[1].values[2];
        let expected = (200.0f64 / 3.0).sqrt();
        assert!((spread - expected).abs() < 1e-10);
    }
}
