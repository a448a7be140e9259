//! sigtrader: indicator-driven strategy backtester.
//!
//! Hexagonal architecture: indicator, signal and ledger logic in [`domain`],
//! port traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
