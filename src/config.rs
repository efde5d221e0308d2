use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Directory holding the eleven input CSV files.
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    /// Output directory for the static HTML export.
    pub report_dir: PathBuf,
    /// Currency symbol used in KPI cards.
    pub currency: String,
    pub top_journeys: usize,
    pub histogram_bins: usize,
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("NOVAMART_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
            bind_addr: std::env::var("NOVAMART_BIND").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("NOVAMART_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8501),
            report_dir: std::env::var("NOVAMART_REPORT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("out/dashboard")),
            currency: std::env::var("NOVAMART_CURRENCY").unwrap_or_else(|_| "₹".to_string()),
            top_journeys: std::env::var("NOVAMART_TOP_JOURNEYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            histogram_bins: std::env::var("NOVAMART_HIST_BINS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(30),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            bind_addr: "127.0.0.1".to_string(),
            port: 8501,
            report_dir: PathBuf::from("out/dashboard"),
            currency: "₹".to_string(),
            top_journeys: 8,
            histogram_bins: 30,
        }
    }
}
