//! Report generation port trait.

use crate::domain::error::SigtraderError;
use crate::domain::metrics::DashboardData;
use std::path::Path;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(&self, dashboard: &DashboardData, output_path: &Path) -> Result<(), SigtraderError>;
}
