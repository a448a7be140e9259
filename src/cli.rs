//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, DEFAULT_INITIAL_CAPITAL};
use crate::domain::config_validation::{
    optional_date, strategy_kind, validate_backtest_config, validate_strategy_config, window,
};
use crate::domain::error::SigtraderError;
use crate::domain::execution::DEFAULT_PERCENT_RISK;
use crate::domain::indicator::{
    bollinger, compute_indicator, macd, rsi, IndicatorColumn, IndicatorType,
};
use crate::domain::metrics::{DashboardData, Metrics, DEFAULT_RISK_FREE_RATE};
use crate::domain::price_series::PriceSeries;
use crate::domain::signal::Signal;
use crate::domain::strategy::{self, Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_REPORT_PATH: &str = "report.json";

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Indicator strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest and write the dashboard report
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for symbol(s)
    Info {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the configured strategy's indicators and signals as CSV
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print indicator values as CSV, e.g. --indicator sma:20 --indicator atr:14
    Indicators {
        #[arg(long)]
        symbol: String,
        #[arg(long = "indicator", required = true)]
        indicators: Vec<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
            data_dir,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(
                    &config,
                    output.as_deref(),
                    symbol.as_deref(),
                    data_dir.as_deref(),
                )
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info {
            symbol,
            data_dir,
            config,
        } => run_info(symbol.as_deref(), data_dir.as_deref(), config.as_deref()),
        Command::Signals {
            config,
            symbol,
            data_dir,
        } => run_signals(&config, symbol.as_deref(), data_dir.as_deref()),
        Command::Indicators {
            symbol,
            indicators,
            data_dir,
        } => run_indicators(&symbol, &indicators, data_dir.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    log::info!("Loading config from {}", path.display());
    FileConfigAdapter::from_file(path)
}

/// Load and fully validate a config file.
pub fn load_validated_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    let adapter = load_config(path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    Ok(adapter)
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, SigtraderError> {
    let quantity = if adapter.has_key("backtest", "quantity") {
        Some(adapter.get_int("backtest", "quantity", 0)? as u64)
    } else {
        None
    };

    Ok(BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL)?,
        percent_risk: adapter.get_double("backtest", "percent_risk", DEFAULT_PERCENT_RISK)?,
        quantity,
        start_date: optional_date(adapter, "start_date")?,
        end_date: optional_date(adapter, "end_date")?,
    })
}

pub fn build_strategy(adapter: &dyn ConfigPort) -> Result<Strategy, SigtraderError> {
    let strategy = match strategy_kind(adapter)? {
        StrategyKind::MovingAverageCrossover => Strategy::MovingAverageCrossover {
            short_window: window(adapter, "short_window", strategy::DEFAULT_SHORT_WINDOW)?,
            long_window: window(adapter, "long_window", strategy::DEFAULT_LONG_WINDOW)?,
        },
        StrategyKind::Rsi => Strategy::Rsi {
            window: window(adapter, "window", rsi::DEFAULT_WINDOW)?,
            oversold: adapter.get_double("strategy", "oversold", strategy::DEFAULT_OVERSOLD)?,
            overbought: adapter.get_double("strategy", "overbought", strategy::DEFAULT_OVERBOUGHT)?,
        },
        StrategyKind::Macd => Strategy::Macd {
            fast: window(adapter, "fast", macd::DEFAULT_FAST)?,
            slow: window(adapter, "slow", macd::DEFAULT_SLOW)?,
            signal: window(adapter, "signal", macd::DEFAULT_SIGNAL)?,
        },
        StrategyKind::BollingerBand => Strategy::BollingerBand {
            window: window(adapter, "window", bollinger::DEFAULT_WINDOW)?,
            num_std: adapter.get_double("strategy", "num_std", bollinger::DEFAULT_NUM_STD)?,
        },
        StrategyKind::Composite => Strategy::Composite {
            rsi_window: window(adapter, "rsi_window", rsi::DEFAULT_WINDOW)?,
            macd_fast: window(adapter, "macd_fast", macd::DEFAULT_FAST)?,
            macd_slow: window(adapter, "macd_slow", macd::DEFAULT_SLOW)?,
            macd_signal: window(adapter, "macd_signal", macd::DEFAULT_SIGNAL)?,
        },
    };
    Ok(strategy)
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, SigtraderError> {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "symbol"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        })
}

pub fn resolve_data_dir(dir_override: Option<&Path>, config: Option<&dyn ConfigPort>) -> PathBuf {
    dir_override
        .map(Path::to_path_buf)
        .or_else(|| {
            config
                .and_then(|c| c.get_string("backtest", "data_dir"))
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| PathBuf::from("."))
}

fn run_backtest(
    config_path: &Path,
    output_path: Option<&Path>,
    symbol_override: Option<&str>,
    dir_override: Option<&Path>,
) -> Result<(), SigtraderError> {
    let adapter = load_validated_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let symbol = resolve_symbol(symbol_override, &adapter)?;
    let data_dir = resolve_data_dir(dir_override, Some(&adapter));
    log::info!("Strategy: {}", strategy);

    let output = output_path
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH));

    run_backtest_pipeline(
        &CsvAdapter::new(data_dir),
        &JsonReportAdapter::default(),
        &strategy,
        &bt_config,
        &symbol,
        &output,
    )?;
    Ok(())
}

/// Load data, replay, aggregate and write the report. Returns the dashboard
/// that was written.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    strategy: &Strategy,
    bt_config: &BacktestConfig,
    symbol: &str,
    output: &Path,
) -> Result<DashboardData, SigtraderError> {
    let series = data_port.load_series(symbol, bt_config.start_date, bt_config.end_date)?;
    log::info!(
        "Running backtest: {} bars of {}, {} to {}",
        series.len(),
        symbol,
        series.first_date(),
        series.last_date()
    );

    let result = backtest_engine::run_backtest(&series, strategy, bt_config);
    let dashboard = DashboardData::from_result(&result, DEFAULT_RISK_FREE_RATE);
    print_summary(&dashboard.metrics);

    report_port.write(&dashboard, output)?;
    log::info!("Report written to: {}", output.display());
    Ok(dashboard)
}

fn print_summary(metrics: &Metrics) {
    eprintln!("\n=== Results ===");
    eprintln!("Final Value:      {:.2}", metrics.final_value);
    eprintln!("Total Return:     {:.2}%", metrics.total_return * 100.0);
    eprintln!("Annualized:       {:.2}%", metrics.annualized_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", metrics.sharpe_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", metrics.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", metrics.total_trades);
    eprintln!("Win Rate:         {:.1}%", metrics.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", metrics.profit_factor);
}

pub fn run_dry_run(config_path: &Path) -> Result<(), SigtraderError> {
    let adapter = load_validated_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let symbol = resolve_symbol(None, &adapter)?;

    eprintln!("Config validated successfully");
    eprintln!("\nStrategy: {}", strategy);
    eprintln!("  first evaluated bar: {}", strategy.start_index());

    let mut indicator_list: Vec<_> = strategy.indicators().iter().map(|i| i.to_string()).collect();
    indicator_list.sort();
    eprintln!("\nIndicators to compute:");
    for ind in &indicator_list {
        eprintln!("  {}", ind);
    }

    eprintln!("\nBacktest:");
    eprintln!("  symbol:          {}", symbol);
    eprintln!("  initial capital: {:.2}", bt_config.initial_capital);
    match bt_config.quantity {
        Some(q) => eprintln!("  sizing:          {} shares", q),
        None => eprintln!("  sizing:          {:.2}% of cash", bt_config.percent_risk * 100.0),
    }

    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), SigtraderError> {
    let adapter = load_validated_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    eprintln!("Strategy: {}", strategy);
    eprintln!("Configuration is valid.");
    Ok(())
}

fn run_info(
    symbol: Option<&str>,
    dir_override: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<(), SigtraderError> {
    let config = config_path.map(load_config).transpose()?;
    let config_port = config.as_ref().map(|c| c as &dyn ConfigPort);
    let data_port = CsvAdapter::new(resolve_data_dir(dir_override, config_port));

    let symbols = match symbol {
        Some(s) => vec![s.to_string()],
        None => match config_port.and_then(|c| c.get_string("backtest", "symbol")) {
            Some(s) => vec![s.trim().to_string()],
            None => data_port.list_symbols()?,
        },
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    }
    for s in &symbols {
        match data_port.get_data_range(s) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", s, count, min_date, max_date);
            }
            Ok(None) => eprintln!("{}: no data found", s),
            Err(e) => eprintln!("error querying {}: {}", s, e),
        }
    }
    Ok(())
}

fn run_signals(
    config_path: &Path,
    symbol_override: Option<&str>,
    dir_override: Option<&Path>,
) -> Result<(), SigtraderError> {
    let adapter = load_validated_config(config_path)?;
    let strategy = build_strategy(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let symbol = resolve_symbol(symbol_override, &adapter)?;
    let data_port = CsvAdapter::new(resolve_data_dir(dir_override, Some(&adapter)));
    let series = data_port.load_series(&symbol, bt_config.start_date, bt_config.end_date)?;

    let columns = indicator_columns(&series, &strategy.indicators())?;
    let signals = strategy.generate_signals(&series);
    let trades = signals.iter().filter(|s| !s.is_hold()).count();
    log::info!("{}: {} non-HOLD signals over {} bars", strategy, trades, series.len());

    write_table(io::stdout().lock(), &series, &columns, Some(&signals))
}

fn run_indicators(
    symbol: &str,
    specs: &[String],
    dir_override: Option<&Path>,
) -> Result<(), SigtraderError> {
    let indicators = specs
        .iter()
        .map(|s| s.parse::<IndicatorType>())
        .collect::<Result<Vec<_>, _>>()?;
    let data_port = CsvAdapter::new(resolve_data_dir(dir_override, None));
    let series = data_port.load_series(symbol, None, None)?;
    let columns = indicator_columns(&series, &indicators)?;
    write_table(io::stdout().lock(), &series, &columns, None)
}

fn indicator_columns(
    series: &PriceSeries,
    indicators: &[IndicatorType],
) -> Result<Vec<IndicatorColumn>, SigtraderError> {
    let mut columns = Vec::new();
    for indicator in indicators {
        columns.extend(compute_indicator(series, indicator)?);
    }
    Ok(columns)
}

/// CSV with one row per bar: date, close, each indicator column and the
/// signal if given. Undefined indicator values are left blank.
pub fn write_table<W: io::Write>(
    out: W,
    series: &PriceSeries,
    columns: &[IndicatorColumn],
    signals: Option<&[Signal]>,
) -> Result<(), SigtraderError> {
    let csv_err = |e: csv::Error| SigtraderError::Report {
        reason: format!("failed to write CSV: {}", e),
    };
    let mut wtr = csv::Writer::from_writer(out);

    let mut header = vec!["date".to_string(), "close".to_string()];
    header.extend(columns.iter().map(|c| c.name.clone()));
    if signals.is_some() {
        header.push("signal".to_string());
        header.push("signal_value".to_string());
    }
    wtr.write_record(&header).map_err(csv_err)?;

    for (i, bar) in series.bars().iter().enumerate() {
        let mut row = vec![bar.date.to_string(), bar.close.to_string()];
        row.extend(columns.iter().map(|c| {
            let v = c.values[i];
            if v.is_nan() { String::new() } else { format!("{:.4}", v) }
        }));
        if let Some(signals) = signals {
            row.push(signals[i].to_string());
            row.push(signals[i].value().to_string());
        }
        wtr.write_record(&row).map_err(csv_err)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn build_strategy_reads_parameters() {
        let adapter = config("[strategy]\ntype = rsi\nwindow = 10\noversold = 25\n");
        assert_eq!(
            build_strategy(&adapter).unwrap(),
            Strategy::Rsi {
                window: 10,
                oversold: 25.0,
                overbought: 70.0
            }
        );
    }

    #[test]
    fn build_strategy_defaults_per_kind() {
        for kind in StrategyKind::ALL {
            let adapter = config(&format!("[strategy]\ntype = {}\n", kind.as_str()));
            assert_eq!(build_strategy(&adapter).unwrap(), Strategy::with_defaults(kind));
        }
    }

    #[test]
    fn build_backtest_config_defaults() {
        let adapter = config("[backtest]\nsymbol = AAPL\n");
        assert_eq!(build_backtest_config(&adapter).unwrap(), BacktestConfig::default());
    }

    #[test]
    fn build_backtest_config_reads_all_keys() {
        let adapter = config(
            "[backtest]\nsymbol = AAPL\ninitial_capital = 5000\npercent_risk = 0.5\nquantity = 7\nstart_date = 2024-01-01\nend_date = 2024-06-30\n",
        );
        let c = build_backtest_config(&adapter).unwrap();
        assert!((c.initial_capital - 5000.0).abs() < f64::EPSILON);
        assert!((c.percent_risk - 0.5).abs() < f64::EPSILON);
        assert_eq!(c.quantity, Some(7));
        assert_eq!(c.start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(c.end_date, NaiveDate::from_ymd_opt(2024, 6, 30));
    }

    #[test]
    fn resolve_symbol_prefers_override() {
        let adapter = config("[backtest]\nsymbol = AAPL\n");
        assert_eq!(resolve_symbol(Some("MSFT"), &adapter).unwrap(), "MSFT");
        assert_eq!(resolve_symbol(None, &adapter).unwrap(), "AAPL");
        let empty = config("[backtest]\n");
        assert!(resolve_symbol(None, &empty).is_err());
    }

    #[test]
    fn resolve_data_dir_order() {
        let adapter = config("[backtest]\ndata_dir = prices\n");
        assert_eq!(resolve_data_dir(None, Some(&adapter)), PathBuf::from("prices"));
        assert_eq!(
            resolve_data_dir(Some(Path::new("other")), Some(&adapter)),
            PathBuf::from("other")
        );
        assert_eq!(resolve_data_dir(None, None), PathBuf::from("."));
    }

    #[test]
    fn write_table_blanks_undefined_values() {
        let series = PriceSeries::from_closes(
            "TEST",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            &[1.0, 2.0, 3.0],
        )
        .unwrap();
        let columns = indicator_columns(&series, &[IndicatorType::Sma(2)]).unwrap();
        let signals = [Signal::Hold, Signal::Buy, Signal::Sell];

        let mut buf = Vec::new();
        write_table(&mut buf, &series, &columns, Some(&signals)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "date,close,SMA(2),signal,signal_value");
        assert_eq!(lines[1], "2024-01-01,1,,HOLD,0");
        assert_eq!(lines[2], "2024-01-02,2,1.5000,BUY,1");
        assert_eq!(lines[3], "2024-01-03,3,2.5000,SELL,-1");
    }
}
