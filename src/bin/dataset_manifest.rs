//! Fingerprints the dashboard's input files: SHA-256, row count and skipped
//! rows per table. Writes `<data_dir>/dataset_manifest.json` (or the path
//! given as the first argument).

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use novamart::{load_dataset, DashboardConfig};

fn main() -> Result<()> {
    let config = DashboardConfig::from_env();
    let out_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.data_dir.join("dataset_manifest.json"));

    let data = match load_dataset(&config.data_dir) {
        Ok(d) => d,
        Err(err) => {
            eprintln!("load failed: {}", err);
            std::process::exit(1);
        }
    };

    let manifest = &data.manifest;
    let payload = serde_json::to_string_pretty(manifest).context("failed to serialize manifest")?;
    fs::write(&out_path, payload)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    for t in &manifest.tables {
        eprintln!(
            "  {:<28} {:>7} rows {:>4} skipped  {}",
            t.file,
            t.rows,
            t.skipped_rows,
            &t.sha256[..t.sha256.len().min(12)]
        );
    }
    let degraded = manifest.degraded().count();
    if degraded > 0 {
        eprintln!("  {} table(s) lost rows while parsing", degraded);
    }
    eprintln!("wrote manifest {}", out_path.display());
    Ok(())
}
