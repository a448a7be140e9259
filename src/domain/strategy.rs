//! Signal-generating strategies.
//!
//! Each variant turns a price series into one signal per bar. All triggers
//! are crossovers between bar `i-1` and bar `i`, so a crossing fires once.
//! Bars before a variant's start index stay HOLD.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{
    bollinger, bollinger_bands, macd, rsi, rsi_at_bar, sma, IndicatorType,
};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::Signal;

pub const DEFAULT_SHORT_WINDOW: usize = 50;
pub const DEFAULT_LONG_WINDOW: usize = 200;
pub const DEFAULT_OVERSOLD: f64 = 30.0;
pub const DEFAULT_OVERBOUGHT: f64 = 70.0;

/// RSI ceiling for a composite BUY.
pub const COMPOSITE_BUY_RSI: f64 = 40.0;
/// RSI floor for a composite SELL.
pub const COMPOSITE_SELL_RSI: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    MovingAverageCrossover,
    Rsi,
    Macd,
    BollingerBand,
    Composite,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::MovingAverageCrossover,
        StrategyKind::Rsi,
        StrategyKind::Macd,
        StrategyKind::BollingerBand,
        StrategyKind::Composite,
    ];

    /// Name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::MovingAverageCrossover => "ma_crossover",
            StrategyKind::Rsi => "rsi",
            StrategyKind::Macd => "macd",
            StrategyKind::BollingerBand => "bollinger",
            StrategyKind::Composite => "composite",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = SigtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| SigtraderError::UnknownStrategy { name: s.to_string() })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    MovingAverageCrossover {
        short_window: usize,
        long_window: usize,
    },
    Rsi {
        window: usize,
        oversold: f64,
        overbought: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    BollingerBand {
        window: usize,
        num_std: f64,
    },
    Composite {
        rsi_window: usize,
        macd_fast: usize,
        macd_slow: usize,
        macd_signal: usize,
    },
}

impl Strategy {
    /// The variant with every parameter at its default.
    pub fn with_defaults(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::MovingAverageCrossover => Strategy::MovingAverageCrossover {
                short_window: DEFAULT_SHORT_WINDOW,
                long_window: DEFAULT_LONG_WINDOW,
            },
            StrategyKind::Rsi => Strategy::Rsi {
                window: rsi::DEFAULT_WINDOW,
                oversold: DEFAULT_OVERSOLD,
                overbought: DEFAULT_OVERBOUGHT,
            },
            StrategyKind::Macd => Strategy::Macd {
                fast: macd::DEFAULT_FAST,
                slow: macd::DEFAULT_SLOW,
                signal: macd::DEFAULT_SIGNAL,
            },
            StrategyKind::BollingerBand => Strategy::BollingerBand {
                window: bollinger::DEFAULT_WINDOW,
                num_std: bollinger::DEFAULT_NUM_STD,
            },
            StrategyKind::Composite => Strategy::Composite {
                rsi_window: rsi::DEFAULT_WINDOW,
                macd_fast: macd::DEFAULT_FAST,
                macd_slow: macd::DEFAULT_SLOW,
                macd_signal: macd::DEFAULT_SIGNAL,
            },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::MovingAverageCrossover { .. } => StrategyKind::MovingAverageCrossover,
            Strategy::Rsi { .. } => StrategyKind::Rsi,
            Strategy::Macd { .. } => StrategyKind::Macd,
            Strategy::BollingerBand { .. } => StrategyKind::BollingerBand,
            Strategy::Composite { .. } => StrategyKind::Composite,
        }
    }

    /// First bar at which the variant evaluates its trigger.
    pub fn start_index(&self) -> usize {
        let start = match self {
            Strategy::MovingAverageCrossover { long_window, .. } => *long_window,
            Strategy::Rsi { window, .. } => window + 1,
            Strategy::Macd { slow, signal, .. } => slow + signal,
            Strategy::BollingerBand { window, .. } => *window,
            Strategy::Composite {
                macd_slow,
                macd_signal,
                ..
            } => macd_slow + macd_signal,
        };
        // every trigger looks back one bar
        start.max(1)
    }

    pub fn indicators(&self) -> Vec<IndicatorType> {
        match self {
            Strategy::MovingAverageCrossover {
                short_window,
                long_window,
            } => vec![
                IndicatorType::Sma(*short_window),
                IndicatorType::Sma(*long_window),
            ],
            Strategy::Rsi { window, .. } => vec![IndicatorType::Rsi(*window)],
            Strategy::Macd { fast, slow, signal } => vec![IndicatorType::Macd {
                fast: *fast,
                slow: *slow,
                signal: *signal,
            }],
            Strategy::BollingerBand { window, num_std } => {
                vec![IndicatorType::bollinger(*window, *num_std)]
            }
            Strategy::Composite {
                rsi_window,
                macd_fast,
                macd_slow,
                macd_signal,
            } => vec![
                IndicatorType::Rsi(*rsi_window),
                IndicatorType::Macd {
                    fast: *macd_fast,
                    slow: *macd_slow,
                    signal: *macd_signal,
                },
            ],
        }
    }

    /// One signal per bar of `series`.
    pub fn generate_signals(&self, series: &PriceSeries) -> Vec<Signal> {
        let closes = series.closes();
        let start = self.start_index();
        if start >= closes.len() {
            log::warn!(
                "{}: {} bars for {} but evaluation starts at bar {}, all signals HOLD",
                self,
                closes.len(),
                series.symbol(),
                start
            );
        }
        self.signals_for(&closes)
    }

    fn signals_for(&self, closes: &[f64]) -> Vec<Signal> {
        let n = closes.len();
        let mut signals = vec![Signal::Hold; n];
        let start = self.start_index();

        match self {
            Strategy::MovingAverageCrossover {
                short_window,
                long_window,
            } => {
                let short_ma = sma(closes, *short_window);
                let long_ma = sma(closes, *long_window);
                for i in start..n {
                    signals[i] = crossover_signal(&short_ma, &long_ma, i);
                }
            }
            Strategy::Rsi {
                window,
                oversold,
                overbought,
            } => {
                let values = rsi(closes, *window);
                for i in start..n {
                    let prev = rsi_at_bar(&values, i - 1);
                    let curr = rsi_at_bar(&values, i);
                    if prev < *oversold && curr >= *oversold {
                        signals[i] = Signal::Buy;
                    } else if prev > *overbought && curr <= *overbought {
                        signals[i] = Signal::Sell;
                    }
                }
            }
            Strategy::Macd { fast, slow, signal } => {
                let m = macd(closes, *fast, *slow, *signal);
                for i in start..n {
                    let rising = m.histogram[i] > m.histogram[i - 1];
                    let falling = m.histogram[i] < m.histogram[i - 1];
                    signals[i] = match crossover_signal(&m.line, &m.signal, i) {
                        Signal::Buy if rising => Signal::Buy,
                        Signal::Sell if falling => Signal::Sell,
                        _ => Signal::Hold,
                    };
                }
            }
            Strategy::BollingerBand { window, num_std } => {
                let bands = bollinger_bands(closes, *window, *num_std);
                for i in start..n {
                    let (prev, price) = (closes[i - 1], closes[i]);
                    if prev < bands.lower[i - 1]
                        && price > bands.lower[i]
                        && price < bands.middle[i]
                    {
                        signals[i] = Signal::Buy;
                    } else if prev > bands.upper[i - 1]
                        && price < bands.upper[i]
                        && price > bands.middle[i]
                    {
                        signals[i] = Signal::Sell;
                    }
                }
            }
            Strategy::Composite {
                rsi_window,
                macd_fast,
                macd_slow,
                macd_signal,
            } => {
                let rsi_values = rsi(closes, *rsi_window);
                let m = macd(closes, *macd_fast, *macd_slow, *macd_signal);
                for i in start..n {
                    let rsi_now = rsi_at_bar(&rsi_values, i);
                    signals[i] = match crossover_signal(&m.line, &m.signal, i) {
                        Signal::Buy if rsi_now < COMPOSITE_BUY_RSI => Signal::Buy,
                        Signal::Sell if rsi_now > COMPOSITE_SELL_RSI => Signal::Sell,
                        _ => Signal::Hold,
                    };
                }
            }
        }

        signals
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::MovingAverageCrossover {
                short_window,
                long_window,
            } => write!(f, "MovingAverageCrossover({},{})", short_window, long_window),
            Strategy::Rsi {
                window,
                oversold,
                overbought,
            } => write!(f, "RSIStrategy({},{},{})", window, oversold, overbought),
            Strategy::Macd { fast, slow, signal } => {
                write!(f, "MACDStrategy({},{},{})", fast, slow, signal)
            }
            Strategy::BollingerBand { window, num_std } => {
                write!(f, "BollingerBandStrategy({},{})", window, num_std)
            }
            Strategy::Composite {
                rsi_window,
                macd_fast,
                macd_slow,
                macd_signal,
            } => write!(
                f,
                "CompositeStrategy({},{},{},{})",
                rsi_window, macd_fast, macd_slow, macd_signal
            ),
        }
    }
}

/// `a` strictly crosses above `b` between bar `i-1` and bar `i`.
pub fn crosses_above(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && a[i - 1] < b[i - 1] && a[i] > b[i]
}

/// `a` strictly crosses below `b` between bar `i-1` and bar `i`.
pub fn crosses_below(a: &[f64], b: &[f64], i: usize) -> bool {
    i > 0 && a[i - 1] > b[i - 1] && a[i] < b[i]
}

fn crossover_signal(a: &[f64], b: &[f64], i: usize) -> Signal {
    if crosses_above(a, b, i) {
        Signal::Buy
    } else if crosses_below(a, b, i) {
        Signal::Sell
    } else {
        Signal::Hold
    }
}
