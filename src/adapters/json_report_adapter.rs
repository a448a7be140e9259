//! JSON dashboard report adapter implementing ReportPort.
//!
//! Non-finite numbers (an infinite profit factor, for one) are written as
//! `null`.

use std::fs;
use std::path::Path;

use crate::domain::error::SigtraderError;
use crate::domain::metrics::DashboardData;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render(&self, dashboard: &DashboardData) -> Result<String, SigtraderError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(dashboard)
        } else {
            serde_json::to_string(dashboard)
        };
        rendered.map_err(|e| SigtraderError::Report {
            reason: format!("failed to serialize dashboard: {}", e),
        })
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, dashboard: &DashboardData, output_path: &Path) -> Result<(), SigtraderError> {
        let json = self.render(dashboard)?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, json)?;
        log::debug!("wrote {} trades to {}", dashboard.trade_list.len(), output_path.display());
        Ok(())
    }
}
