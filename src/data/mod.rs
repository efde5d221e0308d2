//! Startup loading of the dashboard datasets.
//!
//! All eleven files must be present before any is parsed: a missing file
//! aborts the load with `MissingDataFile` and nothing is rendered. Rows that
//! fail to deserialize are skipped and counted per file.

pub mod records;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::DashboardError;
use crate::logging::{log_load_failed, log_table_loaded, v_str, ProfileScope};

pub use records::{
    AttributionRecord, CampaignRecord, CorrelationMatrix, CustomerRecord, FeatureImportanceRecord,
    FunnelRecord, GeographicRecord, JourneyRecord, LeadRecord, LearningCurveRecord, ProductRecord,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFile {
    Campaigns,
    Customers,
    Products,
    Leads,
    FeatureImportance,
    LearningCurve,
    Geographic,
    Attribution,
    Funnel,
    Journey,
    Correlation,
}

impl DataFile {
    /// Load order.
    pub const ALL: [DataFile; 11] = [
        DataFile::Campaigns,
        DataFile::Customers,
        DataFile::Products,
        DataFile::Leads,
        DataFile::FeatureImportance,
        DataFile::LearningCurve,
        DataFile::Geographic,
        DataFile::Attribution,
        DataFile::Funnel,
        DataFile::Journey,
        DataFile::Correlation,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            DataFile::Campaigns => "campaign_performance.csv",
            DataFile::Customers => "customer_data.csv",
            DataFile::Products => "product_sales.csv",
            DataFile::Leads => "lead_scoring_results.csv",
            DataFile::FeatureImportance => "feature_importance.csv",
            DataFile::LearningCurve => "learning_curve.csv",
            DataFile::Geographic => "geographic_data.csv",
            DataFile::Attribution => "channel_attribution.csv",
            DataFile::Funnel => "funnel_data.csv",
            DataFile::Journey => "customer_journey.csv",
            DataFile::Correlation => "correlation_matrix.csv",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TableStats {
    pub file: String,
    pub columns: Vec<String>,
    pub rows: usize,
    pub skipped_rows: usize,
    /// First deserialization failure, with its line number.
    pub first_error: Option<String>,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Manifest {
    pub data_dir: String,
    pub generated_at: String,
    pub tables: Vec<TableStats>,
}

impl Manifest {
    pub fn table(&self, file: DataFile) -> Option<&TableStats> {
        self.tables.iter().find(|t| t.file == file.file_name())
    }

    /// Tables that lost rows during parsing.
    pub fn degraded(&self) -> impl Iterator<Item = &TableStats> {
        self.tables.iter().filter(|t| t.skipped_rows > 0)
    }
}

/// Every table the pages read from. Built once, then only borrowed.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    pub campaigns: Vec<CampaignRecord>,
    pub customers: Vec<CustomerRecord>,
    pub products: Vec<ProductRecord>,
    pub leads: Vec<LeadRecord>,
    pub feature_importance: Vec<FeatureImportanceRecord>,
    pub learning_curve: Vec<LearningCurveRecord>,
    pub geographic: Vec<GeographicRecord>,
    pub attribution: Vec<AttributionRecord>,
    pub funnel: Vec<FunnelRecord>,
    pub journeys: Vec<JourneyRecord>,
    pub correlation: CorrelationMatrix,
    pub manifest: Manifest,
}

/// Verify that every required file exists, without reading any of them.
pub fn check_files(dir: &Path) -> Result<(), DashboardError> {
    for file in DataFile::ALL {
        if !dir.join(file.file_name()).is_file() {
            let err = DashboardError::MissingDataFile {
                file: file.file_name().to_string(),
            };
            log_load_failed(err.kind(), &err.to_string());
            return Err(err);
        }
    }
    Ok(())
}

pub fn load_dataset(dir: &Path) -> Result<DataSet, DashboardError> {
    check_files(dir)?;
    let _scope =
        ProfileScope::with_context("load_dataset", &[("dir", v_str(&dir.display().to_string()))]);

    let mut tables = Vec::with_capacity(DataFile::ALL.len());
    let load = |file: DataFile| dir.join(file.file_name());

    let (campaigns, s) = read_table::<CampaignRecord>(&load(DataFile::Campaigns))?;
    tables.push(s);
    let (customers, s) = read_table::<CustomerRecord>(&load(DataFile::Customers))?;
    tables.push(s);
    let (products, s) = read_table::<ProductRecord>(&load(DataFile::Products))?;
    tables.push(s);
    let (leads, s) = read_table::<LeadRecord>(&load(DataFile::Leads))?;
    tables.push(s);
    let (feature_importance, s) =
        read_table::<FeatureImportanceRecord>(&load(DataFile::FeatureImportance))?;
    tables.push(s);
    let (learning_curve, s) = read_table::<LearningCurveRecord>(&load(DataFile::LearningCurve))?;
    tables.push(s);
    let (geographic, s) = read_table::<GeographicRecord>(&load(DataFile::Geographic))?;
    tables.push(s);
    let (attribution, s) = read_table::<AttributionRecord>(&load(DataFile::Attribution))?;
    tables.push(s);
    let (funnel, s) = read_table::<FunnelRecord>(&load(DataFile::Funnel))?;
    tables.push(s);
    let (journeys, s) = read_table::<JourneyRecord>(&load(DataFile::Journey))?;
    tables.push(s);
    let (correlation, s) = read_correlation(&load(DataFile::Correlation))?;
    tables.push(s);

    for t in &tables {
        log_table_loaded(&t.file, t.rows, t.skipped_rows);
    }

    Ok(DataSet {
        campaigns,
        customers,
        products,
        leads,
        feature_importance,
        learning_curve,
        geographic,
        attribution,
        funnel,
        journeys,
        correlation,
        manifest: Manifest {
            data_dir: dir.display().to_string(),
            generated_at: crate::logging::ts_now(),
            tables,
        },
    })
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, DashboardError> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| csv_error(path, source))
}

fn csv_error(path: &Path, source: csv::Error) -> DashboardError {
    DashboardError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, TableStats), DashboardError> {
    let mut reader = open_reader(path)?;
    let columns = reader
        .headers()
        .map_err(|source| csv_error(path, source))?
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut skipped_rows = 0usize;
    let mut first_error = None;
    for result in reader.deserialize::<T>() {
        match result {
            Ok(row) => rows.push(row),
            Err(err) if err.is_io_error() => return Err(csv_error(path, err)),
            Err(err) => {
                skipped_rows += 1;
                if first_error.is_none() {
                    let line = err.position().map(|p| p.line()).unwrap_or(0);
                    first_error = Some(format!("line {}: {}", line, err));
                }
            }
        }
    }

    let stats = TableStats {
        file: file_label(path),
        columns,
        rows: rows.len(),
        skipped_rows,
        first_error,
        sha256: file_sha256(path)?,
    };
    Ok((rows, stats))
}

/// First column is the row label, the remaining header cells name the columns.
fn read_correlation(path: &Path) -> Result<(CorrelationMatrix, TableStats), DashboardError> {
    let mut reader = open_reader(path)?;
    let header = reader.headers().map_err(|source| csv_error(path, source))?.clone();
    let columns: Vec<String> = header.iter().skip(1).map(|s| s.to_string()).collect();

    let mut matrix = CorrelationMatrix {
        columns: columns.clone(),
        rows: Vec::new(),
    };
    let mut skipped_rows = 0usize;
    let mut first_error = None;
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(err) if err.is_io_error() => return Err(csv_error(path, err)),
            Err(err) => {
                skipped_rows += 1;
                first_error.get_or_insert_with(|| err.to_string());
                continue;
            }
        };
        let Some(label) = record.get(0) else {
            skipped_rows += 1;
            continue;
        };
        let values = (0..columns.len())
            .map(|i| record.get(i + 1).and_then(|v| v.parse::<f64>().ok()))
            .collect();
        matrix.rows.push((label.to_string(), values));
    }

    let stats = TableStats {
        file: file_label(path),
        columns: header.iter().map(|s| s.to_string()).collect(),
        rows: matrix.rows.len(),
        skipped_rows,
        first_error,
        sha256: file_sha256(path)?,
    };
    Ok((matrix, stats))
}

pub fn file_sha256(path: &Path) -> Result<String, DashboardError> {
    let io_err = |source| DashboardError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_names_are_unique_csv() {
        let mut names: Vec<&str> = DataFile::ALL.iter().map(|f| f.file_name()).collect();
        assert!(names.iter().all(|n| n.ends_with(".csv")));
        names.sort();
        names.dedup();
        assert_eq!(names.len(), DataFile::ALL.len());
    }

    #[test]
    fn test_read_table_skips_bad_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("funnel_data.csv");
        fs::write(&path, "stage,visitors\nAwareness,1000\nInterest,lots\nPurchase,50\n").unwrap();
        let (rows, stats) = read_table::<FunnelRecord>(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(stats.rows, 2);
        assert_eq!(stats.skipped_rows, 1);
        assert!(stats.first_error.as_deref().unwrap().starts_with("line 3"));
        assert_eq!(stats.sha256.len(), 64);
    }

    #[test]
    fn test_read_correlation_uses_first_column_as_index() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("correlation_matrix.csv");
        fs::write(&path, ",age,income\nage,1.0,0.3\nincome,0.3,1.0\n").unwrap();
        let (m, stats) = read_correlation(&path).unwrap();
        assert_eq!(m.columns, vec!["age", "income"]);
        assert_eq!(m.rows[1].0, "income");
        assert_eq!(m.rows[1].1, vec![Some(0.3), Some(1.0)]);
        assert_eq!(stats.rows, 2);
    }

    #[test]
    fn test_file_sha256_is_stable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();
        assert_eq!(file_sha256(&path).unwrap(), file_sha256(&path).unwrap());
    }
}
