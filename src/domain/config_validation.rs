//! Configuration validation.
//!
//! Checks every `[backtest]` and `[strategy]` key before any data is loaded,
//! so a bad config fails fast with the offending section and key.

use crate::domain::error::SigtraderError;
use crate::domain::strategy::{self, StrategyKind};
use crate::domain::indicator::{bollinger, macd, rsi};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    validate_symbol(config)?;
    validate_initial_capital(config)?;
    validate_percent_risk(config)?;
    validate_quantity(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    match strategy_kind(config)? {
        StrategyKind::MovingAverageCrossover => {
            let short = window(config, "short_window", strategy::DEFAULT_SHORT_WINDOW)?;
            let long = window(config, "long_window", strategy::DEFAULT_LONG_WINDOW)?;
            if short >= long {
                return Err(invalid("strategy", "short_window", "short_window must be less than long_window"));
            }
        }
        StrategyKind::Rsi => {
            window(config, "window", rsi::DEFAULT_WINDOW)?;
            let oversold = config.get_double("strategy", "oversold", strategy::DEFAULT_OVERSOLD)?;
            let overbought =
                config.get_double("strategy", "overbought", strategy::DEFAULT_OVERBOUGHT)?;
            if !(0.0..=100.0).contains(&oversold) {
                return Err(invalid("strategy", "oversold", "oversold must be between 0 and 100"));
            }
            if !(0.0..=100.0).contains(&overbought) {
                return Err(invalid("strategy", "overbought", "overbought must be between 0 and 100"));
            }
            if oversold >= overbought {
                return Err(invalid("strategy", "oversold", "oversold must be less than overbought"));
            }
        }
        StrategyKind::Macd => validate_macd(config, "fast", "slow", "signal")?,
        StrategyKind::BollingerBand => {
            window(config, "window", bollinger::DEFAULT_WINDOW)?;
            let num_std = config.get_double("strategy", "num_std", bollinger::DEFAULT_NUM_STD)?;
            if num_std.is_nan() || num_std <= 0.0 {
                return Err(invalid("strategy", "num_std", "num_std must be positive"));
            }
        }
        StrategyKind::Composite => {
            window(config, "rsi_window", rsi::DEFAULT_WINDOW)?;
            validate_macd(config, "macd_fast", "macd_slow", "macd_signal")?;
        }
    }
    Ok(())
}

/// The configured strategy variant. A missing `type` is a config fault, an
/// unrecognized one is reported as an unknown strategy.
pub fn strategy_kind(config: &dyn ConfigPort) -> Result<StrategyKind, SigtraderError> {
    match config.get_string("strategy", "type") {
        Some(s) if !s.trim().is_empty() => s.parse(),
        _ => Err(SigtraderError::ConfigMissing {
            section: "strategy".to_string(),
            key: "type".to_string(),
        }),
    }
}

/// A `[strategy]` window key, defaulted when absent, at least 1 when present.
pub fn window(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, SigtraderError> {
    let value = config.get_int("strategy", key, default as i64)?;
    if value < 1 {
        return Err(invalid("strategy", key, &format!("{} must be at least 1", key)));
    }
    Ok(value as usize)
}

/// Optional `YYYY-MM-DD` date in `[backtest]`.
pub fn optional_date(config: &dyn ConfigPort, key: &str) -> Result<Option<NaiveDate>, SigtraderError> {
    match config.get_string("backtest", key) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| invalid("backtest", key, &format!("invalid {} format, expected YYYY-MM-DD", key))),
        _ => Ok(None),
    }
}

fn validate_macd(
    config: &dyn ConfigPort,
    fast_key: &str,
    slow_key: &str,
    signal_key: &str,
) -> Result<(), SigtraderError> {
    let fast = window(config, fast_key, macd::DEFAULT_FAST)?;
    let slow = window(config, slow_key, macd::DEFAULT_SLOW)?;
    window(config, signal_key, macd::DEFAULT_SIGNAL)?;
    if fast >= slow {
        return Err(invalid(
            "strategy",
            fast_key,
            &format!("{} must be less than {}", fast_key, slow_key),
        ));
    }
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if config.has_key("backtest", "symbol") {
        Ok(())
    } else {
        Err(SigtraderError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbol".to_string(),
        })
    }
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("backtest", "initial_capital", 100_000.0)?;
    if value.is_nan() || value <= 0.0 {
        return Err(invalid("backtest", "initial_capital", "initial_capital must be positive"));
    }
    Ok(())
}

fn validate_percent_risk(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let value = config.get_double("backtest", "percent_risk", 0.02)?;
    if value.is_nan() || value <= 0.0 || value > 1.0 {
        return Err(invalid("backtest", "percent_risk", "percent_risk must be in (0, 1]"));
    }
    Ok(())
}

fn validate_quantity(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    if !config.has_key("backtest", "quantity") {
        return Ok(());
    }
    if config.get_int("backtest", "quantity", 0)? < 1 {
        return Err(invalid("backtest", "quantity", "quantity must be at least 1"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), SigtraderError> {
    let start_date = optional_date(config, "start_date")?;
    let end_date = optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start >= end {
            return Err(invalid("backtest", "start_date", "start_date must be before end_date"));
        }
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    fn backtest_err(content: &str) -> SigtraderError {
        validate_backtest_config(&make_config(content)).unwrap_err()
    }

    fn strategy_err(content: &str) -> SigtraderError {
        validate_strategy_config(&make_config(content)).unwrap_err()
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
symbol = AAPL
initial_capital = 100000.0
percent_risk = 0.05
quantity = 10
start_date = 2020-01-01
end_date = 2024-12-31
data_dir = data
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn minimal_backtest_config_passes() {
        assert!(validate_backtest_config(&make_config("[backtest]\nsymbol = AAPL\n")).is_ok());
    }

    #[test]
    fn missing_symbol_fails() {
        let err = backtest_err("[backtest]\ninitial_capital = 100\n");
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn initial_capital_must_be_positive() {
        let err = backtest_err("[backtest]\nsymbol = AAPL\ninitial_capital = -100\n");
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
        let err = backtest_err("[backtest]\nsymbol = AAPL\ninitial_capital = 0\n");
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn percent_risk_out_of_range_fails() {
        for bad in ["0", "-0.1", "1.5"] {
            let err = backtest_err(&format!("[backtest]\nsymbol = AAPL\npercent_risk = {}\n", bad));
            assert!(
                matches!(err, SigtraderError::ConfigInvalid { ref key, .. } if key == "percent_risk"),
                "{}",
                bad
            );
        }
    }

    #[test]
    fn percent_risk_of_one_passes() {
        let config = make_config("[backtest]\nsymbol = AAPL\npercent_risk = 1.0\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn quantity_zero_fails() {
        let err = backtest_err("[backtest]\nsymbol = AAPL\nquantity = 0\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "quantity"));
    }

    #[test]
    fn non_numeric_capital_fails() {
        let err = backtest_err("[backtest]\nsymbol = AAPL\ninitial_capital = plenty\n");
        assert!(
            matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn invalid_start_date_format_fails() {
        let err = backtest_err("[backtest]\nsymbol = AAPL\nstart_date = 2020/01/01\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_date_after_end_date_fails() {
        let err = backtest_err(
            "[backtest]\nsymbol = AAPL\nstart_date = 2024-12-31\nend_date = 2020-01-01\n",
        );
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn single_date_bound_passes() {
        let config = make_config("[backtest]\nsymbol = AAPL\nend_date = 2020-01-01\n");
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn every_strategy_type_valid_with_defaults() {
        for kind in StrategyKind::ALL {
            let config = make_config(&format!("[strategy]\ntype = {}\n", kind.as_str()));
            assert!(validate_strategy_config(&config).is_ok(), "{:?}", kind);
        }
    }

    #[test]
    fn missing_type_fails() {
        let err = strategy_err("[strategy]\nwindow = 14\n");
        assert!(matches!(err, SigtraderError::ConfigMissing { key, .. } if key == "type"));
    }

    #[test]
    fn unknown_type_fails() {
        let err = strategy_err("[strategy]\ntype = turtle\n");
        assert!(matches!(err, SigtraderError::UnknownStrategy { name } if name == "turtle"));
    }

    #[test]
    fn short_window_must_be_below_long() {
        let err = strategy_err("[strategy]\ntype = ma_crossover\nshort_window = 50\nlong_window = 50\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "short_window"));
    }

    #[test]
    fn zero_window_fails() {
        let err = strategy_err("[strategy]\ntype = bollinger\nwindow = 0\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "window"));
    }

    #[test]
    fn rsi_thresholds_must_be_ordered() {
        let err = strategy_err("[strategy]\ntype = rsi\noversold = 70\noverbought = 30\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "oversold"));
        let err = strategy_err("[strategy]\ntype = rsi\noverbought = 120\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "overbought"));
    }

    #[test]
    fn macd_fast_must_be_below_slow() {
        let err = strategy_err("[strategy]\ntype = macd\nfast = 26\nslow = 12\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "fast"));
        let err = strategy_err("[strategy]\ntype = composite\nmacd_fast = 30\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "macd_fast"));
    }

    #[test]
    fn num_std_must_be_positive() {
        let err = strategy_err("[strategy]\ntype = bollinger\nnum_std = 0\n");
        assert!(matches!(err, SigtraderError::ConfigInvalid { key, .. } if key == "num_std"));
    }
}
