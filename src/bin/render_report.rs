//! Static report export: renders every page with default filters into
//! self-contained HTML files under `NOVAMART_REPORT_DIR` (or the first
//! argument).
//!
//! Output: `<dir>/index.html` (executive overview) + `<dir>/<slug>.html`

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use novamart::nav::{render_page, PageId};
use novamart::pages::{PageContext, PageQuery};
use novamart::render::{self, LinkMode};
use novamart::{load_dataset, DashboardConfig};

fn main() -> Result<()> {
    let config = DashboardConfig::from_env();
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.report_dir.clone());
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    eprintln!("=== NovaMart Report Export ===");
    eprintln!("  data: {}", config.data_dir.display());

    let data = match load_dataset(&config.data_dir) {
        Ok(d) => d,
        Err(err) => {
            let path = out_dir.join("index.html");
            fs::write(&path, render::render_error_panel(&err))
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("  load failed: {}", err);
            eprintln!("  {} written (error panel)", path.display());
            std::process::exit(1);
        }
    };

    let query = PageQuery::default();
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };
    for id in PageId::ALL {
        let page = render_page(id, &ctx);
        let html = render::render_page(&page, &config, LinkMode::Static);
        let path = out_dir.join(format!("{}.html", id.slug()));
        fs::write(&path, &html).with_context(|| format!("failed to write {}", path.display()))?;
        if id == PageId::Executive {
            let index = out_dir.join("index.html");
            fs::write(&index, &html)
                .with_context(|| format!("failed to write {}", index.display()))?;
        }
        eprintln!(
            "  {:<12} {:>3} charts {:>2} notices ({:.1} KB)",
            id.slug(),
            page.charts().len(),
            page.notices.len(),
            html.len() as f64 / 1024.0
        );
    }
    eprintln!("  written to {}", out_dir.display());
    Ok(())
}
