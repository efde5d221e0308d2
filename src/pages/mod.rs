//! Page layout and the seven page routines.
//!
//! A page routine borrows the loaded `DataSet`, derives its tables through
//! `aggregate`/`eval`, binds them to chart encodings and returns a `Page`.
//! Nothing in here fails: binding problems and degraded input tables become
//! `Notice`s on the page that owns them.

pub mod attribution;
pub mod campaigns;
pub mod customers;
pub mod executive;
pub mod geography;
pub mod model;
pub mod products;

use serde::Serialize;

use crate::chart::{self, Chart, Encoding};
use crate::config::DashboardConfig;
use crate::data::{DataFile, DataSet, Manifest};
use crate::filter::{CampaignFilter, FilterOptions};
use crate::frame::Frame;
use crate::nav::PageId;

/// Displayed for any undefined value.
pub const NA: &str = "n/a";

/// Decoded query string of a page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageQuery {
    pairs: Vec<(String, String)>,
}

impl PageQuery {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Parse an `application/x-www-form-urlencoded` query (without `?`).
    pub fn parse(raw: &str) -> Self {
        Self::new(url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn campaign_filter(&self) -> CampaignFilter {
        CampaignFilter::from_query(&self.pairs)
    }
}

/// Everything a page routine may read.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub data: &'a DataSet,
    pub query: &'a PageQuery,
    pub config: &'a DashboardConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    pub detail: Option<String>,
}

impl Kpi {
    pub fn new(label: &str, value: String) -> Self {
        Self {
            label: label.to_string(),
            value,
            detail: None,
        }
    }

    pub fn detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Non-fatal problems shown at the top of a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// Skipped rows, out-of-domain values or a chart bound to a column its
    /// data does not have.
    MalformedColumn { table: String, detail: String },
    /// The current filter selects no rows.
    EmptyFilterResult { detail: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterForm {
    pub options: FilterOptions,
    pub current: CampaignFilter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "block", content = "body", rename_all = "snake_case")]
pub enum Block {
    Metrics(Vec<Kpi>),
    Chart(Chart),
    Table { title: String, frame: Frame },
    /// Side-by-side columns, each a stack of blocks.
    Columns(Vec<Vec<Block>>),
    Filter(FilterForm),
    Note(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub subtitle: String,
    pub notices: Vec<Notice>,
    pub sections: Vec<Section>,
}

impl Page {
    pub fn charts(&self) -> Vec<&Chart> {
        let mut out = Vec::new();
        for s in &self.sections {
            collect_charts(&s.blocks, &mut out);
        }
        out
    }

    pub fn chart(&self, title: &str) -> Option<&Chart> {
        self.charts().into_iter().find(|c| c.title == title)
    }

    pub fn section(&self, heading: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.heading == heading)
    }
}

fn collect_charts<'a>(blocks: &'a [Block], out: &mut Vec<&'a Chart>) {
    for b in blocks {
        match b {
            Block::Chart(c) => out.push(c),
            Block::Columns(cols) => {
                for col in cols {
                    collect_charts(col, out);
                }
            }
            _ => {}
        }
    }
}

/// Accumulates sections and notices for one page.
pub(crate) struct PageBuilder {
    page: Page,
}

impl PageBuilder {
    pub(crate) fn new(id: PageId, subtitle: &str) -> Self {
        Self {
            page: Page {
                id,
                title: id.label().to_string(),
                subtitle: subtitle.to_string(),
                notices: Vec::new(),
                sections: Vec::new(),
            },
        }
    }

    /// Report rows dropped while loading any of `files`.
    pub(crate) fn check_tables(&mut self, manifest: &Manifest, files: &[DataFile]) {
        for file in files {
            let Some(stats) = manifest.table(*file) else {
                continue;
            };
            if stats.skipped_rows == 0 {
                continue;
            }
            let mut detail = format!("{} malformed row(s) skipped", stats.skipped_rows);
            if let Some(first) = &stats.first_error {
                detail.push_str(&format!("; first: {}", first));
            }
            self.notice(Notice::MalformedColumn {
                table: stats.file.clone(),
                detail,
            });
        }
    }

    pub(crate) fn notice(&mut self, notice: Notice) {
        self.page.notices.push(notice);
    }

    /// Build a chart block; binding warnings become page notices.
    pub(crate) fn chart(&mut self, title: &str, frame: &Frame, enc: Encoding) -> Block {
        let chart = chart::build(title, frame, &enc);
        for w in &chart.warnings {
            self.notice(Notice::MalformedColumn {
                table: title.to_string(),
                detail: w.clone(),
            });
        }
        Block::Chart(chart)
    }

    pub(crate) fn section(&mut self, heading: &str, blocks: Vec<Block>) {
        self.page.sections.push(Section {
            heading: heading.to_string(),
            blocks,
        });
    }

    pub(crate) fn finish(self) -> Page {
        self.page
    }
}

// =============================================================================
// KPI formatting
// =============================================================================

pub(crate) fn crore(currency: &str, v: f64) -> String {
    format!("{}{:.2} Cr", currency, v / 1e7)
}

pub(crate) fn lakhs(currency: &str, v: f64) -> String {
    format!("{}{:.2} Lakhs", currency, v / 1e5)
}

pub(crate) fn millions(v: f64) -> String {
    format!("{:.2}M", v / 1e6)
}

pub(crate) fn pct(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}%", v)).unwrap_or_else(|| NA.to_string())
}

pub(crate) fn times(v: Option<f64>) -> String {
    v.map(|v| format!("{:.2}x", v)).unwrap_or_else(|| NA.to_string())
}

pub(crate) fn fixed(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{:.*}", decimals, v)).unwrap_or_else(|| NA.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_parse_decodes_pairs() {
        let q = PageQuery::parse("filtered=1&channel=Paid+Search&channel=Email&from=2024-01-01");
        assert_eq!(q.pairs().len(), 4);
        assert_eq!(q.pairs()[1], ("channel".to_string(), "Paid Search".to_string()));
        let f = q.campaign_filter();
        assert!(f.channels.contains("Paid Search"));
        assert!(!f.channels.contains("Social"));
        assert!(f.campaign_types.is_empty());
    }

    #[test]
    fn test_formatting_undefined_values() {
        assert_eq!(pct(None), NA);
        assert_eq!(times(Some(2.0)), "2.00x");
        assert_eq!(fixed(Some(0.6666), 3), "0.667");
        assert_eq!(crore("₹", 25_000_000.0), "₹2.50 Cr");
        assert_eq!(lakhs("₹", 150_000.0), "₹1.50 Lakhs");
        assert_eq!(millions(2_500_000.0), "2.50M");
    }

    #[test]
    fn test_builder_turns_binding_warnings_into_notices() {
        let mut b = PageBuilder::new(PageId::Products, "");
        let f = Frame::new(&["category", "sales"]);
        let block = b.chart(
            "Sales",
            &f,
            Encoding::new(crate::chart::ChartKind::Bar).x("category").y("revenue"),
        );
        b.section("Sales", vec![block]);
        let page = b.finish();
        assert_eq!(page.notices.len(), 1);
        assert_eq!(page.charts().len(), 1);
        assert!(matches!(
            &page.notices[0],
            Notice::MalformedColumn { table, .. } if table == "Sales"
        ));
    }
}
