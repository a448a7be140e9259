//! Port traits the domain talks to: configuration, price data and reports.

pub mod config_port;
pub mod data_port;
pub mod report_port;
