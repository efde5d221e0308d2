//! HTML rendering.
//!
//! A page is written as one self-contained document: sidebar navigation, the
//! page body, and a JSON blob of Plotly figures that plotly.js draws on load.

use serde_json::{json, Map, Value};

use crate::chart::Chart;
use crate::config::DashboardConfig;
use crate::error::DashboardError;
use crate::filter::Selection;
use crate::frame::{Cell, Frame};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::nav::PageId;
use crate::pages::{Block, FilterForm, Kpi, Notice, Page};

/// How sidebar links and the filter form address pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkMode {
    /// `/page/<slug>` on the dashboard server.
    Server,
    /// `<slug>.html` next to each other on disk.
    Static,
}

impl LinkMode {
    pub fn href(&self, id: PageId) -> String {
        match self {
            LinkMode::Server if id == PageId::Executive => "/".to_string(),
            LinkMode::Server => format!("/page/{}", id.slug()),
            LinkMode::Static => format!("{}.html", id.slug()),
        }
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// JSON safe to embed inside a `<script>` element.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

pub fn render_page(page: &Page, config: &DashboardConfig, links: LinkMode) -> String {
    let mut r = Renderer {
        links,
        figures: Map::new(),
        out: String::new(),
    };
    r.page(page);

    let mut html = HEAD.replace("__TITLE__", &escape(&page.title));
    html.push_str(&sidebar(page.id, config, links));
    html.push_str("<main>\n");
    html.push_str(&r.out);
    html.push_str("</main>\n");
    html.push_str(&format!(
        "<script type=\"application/json\" id=\"figures\">{}</script>\n",
        script_json(&Value::Object(r.figures))
    ));
    html.push_str(FOOT);

    log(
        Level::Debug,
        Domain::Render,
        "html_rendered",
        obj(&[("page", v_str(page.id.slug())), ("bytes", json!(html.len()))]),
    );
    html
}

/// The single blocking page shown when the data could not be loaded.
pub fn render_error_panel(err: &DashboardError) -> String {
    let mut html = HEAD.replace("__TITLE__", "Data unavailable");
    html.push_str("<main class=\"error-main\">\n<div class=\"error-panel\">\n");
    match err.missing_file() {
        Some(file) => {
            html.push_str(&format!(
                "<h1>❌ Data file not found: {}</h1>\n",
                escape(file)
            ));
            html.push_str(
                "<p>Please ensure all CSV files are in the data directory \
                 (<code>NOVAMART_DATA_DIR</code>) and restart the dashboard.</p>\n",
            );
        }
        None => {
            html.push_str("<h1>❌ The dashboard data could not be loaded</h1>\n");
            html.push_str(&format!("<p>{}</p>\n", escape(&err.to_string())));
        }
    }
    html.push_str(&format!(
        "<p class=\"error-kind\">error: <code>{}</code></p>\n",
        err.kind()
    ));
    html.push_str("</div>\n</main>\n");
    html.push_str(FOOT);
    html
}

fn sidebar(active: PageId, config: &DashboardConfig, links: LinkMode) -> String {
    let mut s = String::from(
        "<aside class=\"sidebar\">\n<div class=\"brand\">📊 NovaMart Analytics</div>\n<nav>\n",
    );
    for id in PageId::ALL {
        let class = if id == active { "nav-link active" } else { "nav-link" };
        s.push_str(&format!(
            "<a class=\"{}\" href=\"{}\">{} {}</a>\n",
            class,
            escape(&links.href(id)),
            id.icon(),
            escape(id.label())
        ));
    }
    s.push_str("</nav>\n");
    s.push_str(&format!(
        "<div class=\"sidebar-foot\">NovaMart Marketing Analytics Dashboard<br>data: <code>{}</code></div>\n",
        escape(&config.data_dir.display().to_string())
    ));
    s.push_str("</aside>\n");
    s
}

struct Renderer {
    links: LinkMode,
    figures: Map<String, Value>,
    out: String,
}

impl Renderer {
    fn page(&mut self, page: &Page) {
        self.out.push_str(&format!(
            "<header class=\"hero\"><h1>{} {}</h1><p class=\"hero-sub\">{}</p></header>\n",
            page.id.icon(),
            escape(&page.title),
            escape(&page.subtitle)
        ));
        for n in &page.notices {
            self.notice(n);
        }
        for section in &page.sections {
            self.out.push_str(&format!(
                "<section class=\"section\">\n<h2>{}</h2>\n",
                escape(&section.heading)
            ));
            for block in &section.blocks {
                self.block(block);
            }
            self.out.push_str("</section>\n");
        }
    }

    fn notice(&mut self, notice: &Notice) {
        let (class, text) = match notice {
            Notice::MalformedColumn { table, detail } => {
                ("notice warn", format!("<b>{}</b>: {}", escape(table), escape(detail)))
            }
            Notice::EmptyFilterResult { detail } => ("notice info", escape(detail)),
        };
        self.out
            .push_str(&format!("<div class=\"{}\">{}</div>\n", class, text));
    }

    fn block(&mut self, block: &Block) {
        match block {
            Block::Metrics(kpis) => self.metrics(kpis),
            Block::Chart(chart) => self.chart(chart),
            Block::Table { title, frame } => self.table(title, frame),
            Block::Columns(cols) => {
                self.out.push_str("<div class=\"columns\">\n");
                for col in cols {
                    self.out.push_str("<div class=\"col\">\n");
                    for b in col {
                        self.block(b);
                    }
                    self.out.push_str("</div>\n");
                }
                self.out.push_str("</div>\n");
            }
            Block::Filter(form) => self.filter(form),
            Block::Note(text) => {
                self.out
                    .push_str(&format!("<p class=\"note\">{}</p>\n", escape(text)));
            }
        }
    }

    fn metrics(&mut self, kpis: &[Kpi]) {
        self.out.push_str("<div class=\"grid\">\n");
        for k in kpis {
            self.out.push_str(&format!(
                "<div class=\"card\"><div class=\"card-label\">{}</div><div class=\"card-val\">{}</div>",
                escape(&k.label),
                escape(&k.value)
            ));
            if let Some(d) = &k.detail {
                self.out
                    .push_str(&format!("<div class=\"card-detail\">{}</div>", escape(d)));
            }
            self.out.push_str("</div>\n");
        }
        self.out.push_str("</div>\n");
    }

    fn chart(&mut self, chart: &Chart) {
        match &chart.figure {
            Some(fig) => {
                let id = format!("chart-{}", self.figures.len());
                self.out
                    .push_str(&format!("<div class=\"chart\" id=\"{}\"></div>\n", id));
                self.figures.insert(id, fig.clone());
            }
            None if chart.warnings.is_empty() => {
                self.out.push_str(&format!(
                    "<div class=\"chart-empty\"><b>{}</b><span>No data for the current selection</span></div>\n",
                    escape(&chart.title)
                ));
            }
            None => {
                self.out.push_str(&format!(
                    "<div class=\"chart-empty warn\"><b>{}</b><span>{}</span></div>\n",
                    escape(&chart.title),
                    escape(&chart.warnings.join("; "))
                ));
            }
        }
    }

    fn table(&mut self, title: &str, frame: &Frame) {
        self.out
            .push_str(&format!("<h3 class=\"table-title\">{}</h3>\n", escape(title)));
        if frame.is_empty() {
            self.out
                .push_str("<p class=\"note\">No data for the current selection</p>\n");
            return;
        }
        self.out
            .push_str("<div class=\"table-wrap\"><table>\n<thead><tr>");
        for c in frame.columns() {
            self.out.push_str(&format!("<th>{}</th>", escape(c)));
        }
        self.out.push_str("</tr></thead>\n<tbody>\n");
        for row in frame.rows() {
            self.out.push_str("<tr>");
            for cell in row {
                let class = match cell {
                    Cell::Text(_) => "",
                    _ => " class=\"num\"",
                };
                self.out
                    .push_str(&format!("<td{}>{}</td>", class, escape(&cell.display())));
            }
            self.out.push_str("</tr>\n");
        }
        self.out.push_str("</tbody>\n</table></div>\n");
    }

    fn filter(&mut self, form: &FilterForm) {
        if self.links == LinkMode::Static {
            self.out.push_str(
                "<p class=\"note\">Showing all campaigns. Filters are available on the live dashboard.</p>\n",
            );
            return;
        }
        let action = escape(&self.links.href(PageId::Campaigns));
        self.out.push_str(&format!(
            "<form class=\"filters\" method=\"get\" action=\"{}\">\n<input type=\"hidden\" name=\"filtered\" value=\"1\">\n",
            action
        ));
        self.multi_select(
            "Select Channel(s)",
            "channel",
            &form.options.channels,
            &form.current.channels,
        );
        self.multi_select(
            "Select Campaign Type(s)",
            "campaign_type",
            &form.options.campaign_types,
            &form.current.campaign_types,
        );

        let fmt = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        };
        let lo = fmt(form.options.min_date);
        let hi = fmt(form.options.max_date);
        let from = form.current.dates.start.map(|d| fmt(Some(d))).unwrap_or_else(|| lo.clone());
        let to = form.current.dates.end.map(|d| fmt(Some(d))).unwrap_or_else(|| hi.clone());
        self.out.push_str(&format!(
            "<label>Select Date Range\n<input type=\"date\" name=\"from\" value=\"{}\" min=\"{}\" max=\"{}\">\n\
             <input type=\"date\" name=\"to\" value=\"{}\" min=\"{}\" max=\"{}\"></label>\n",
            from, lo, hi, to, lo, hi
        ));
        self.out.push_str(&format!(
            "<div class=\"filter-actions\"><button type=\"submit\">Apply</button> <a href=\"{}\">Reset</a></div>\n</form>\n",
            action
        ));
    }

    fn multi_select(&mut self, label: &str, name: &str, options: &[String], current: &Selection) {
        self.out.push_str(&format!(
            "<label>{}\n<select name=\"{}\" multiple size=\"{}\">\n",
            escape(label),
            name,
            options.len().clamp(2, 8)
        ));
        for opt in options {
            let selected = if current.contains(opt) { " selected" } else { "" };
            self.out.push_str(&format!(
                "<option value=\"{}\"{}>{}</option>\n",
                escape(opt),
                selected,
                escape(opt)
            ));
        }
        self.out.push_str("</select></label>\n");
    }
}

const HEAD: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>__TITLE__ · NovaMart Analytics</title>
  <script src="https://cdn.plot.ly/plotly-2.35.2.min.js" charset="utf-8"></script>
  <style>
    :root {
      --bg: #f6f8fa; --bg-raised: #ffffff; --bg-side: #0d1117;
      --fg: #24292f; --fg-muted: #57606a; --fg-subtle: #8c959f; --fg-side: #c9d1d9;
      --accent: #0969da; --accent-muted: #1a3050;
      --yellow: #9a6700; --yellow-muted: #fff8c5; --red: #cf222e; --red-muted: #ffebe9;
      --blue-muted: #ddf4ff;
      --border: #d0d7de;
      --mono: 'JetBrains Mono', 'Fira Code', 'SF Mono', monospace;
      --sans: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
      --radius: 8px; --radius-sm: 4px;
      --side-w: 250px;
    }
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body { font-family: var(--sans); background: var(--bg); color: var(--fg); line-height: 1.5; display: flex; min-height: 100vh; }

    /* ── Sidebar ── */
    .sidebar { width: var(--side-w); flex-shrink: 0; background: var(--bg-side); color: var(--fg-side); padding: 1.25rem 0.75rem; position: sticky; top: 0; height: 100vh; display: flex; flex-direction: column; }
    .brand { font-weight: 700; font-size: 1.05rem; color: #f0f6fc; padding: 0 0.5rem 1rem; border-bottom: 1px solid #30363d; margin-bottom: 0.75rem; }
    .sidebar nav { display: flex; flex-direction: column; gap: 0.15rem; }
    .nav-link { color: var(--fg-side); text-decoration: none; font-size: 0.85rem; padding: 0.45rem 0.6rem; border-radius: var(--radius-sm); }
    .nav-link:hover { background: rgba(255,255,255,0.06); }
    .nav-link.active { color: #58a6ff; background: var(--accent-muted); font-weight: 600; }
    .sidebar-foot { margin-top: auto; font-size: 0.7rem; color: #8b949e; padding: 0.5rem; }

    /* ── Main ── */
    main { flex: 1; max-width: 1280px; padding: 1.5rem 2rem; }
    .hero { margin-bottom: 1.25rem; }
    .hero h1 { font-size: 1.6rem; font-weight: 700; }
    .hero-sub { color: var(--fg-muted); }
    .section { margin-bottom: 2rem; }
    .section h2 { font-size: 1.1rem; font-weight: 600; border-bottom: 1px solid var(--border); padding-bottom: 0.4rem; margin-bottom: 0.9rem; }
    .columns { display: grid; grid-template-columns: repeat(auto-fit, minmax(360px, 1fr)); gap: 1rem; }
    .note { color: var(--fg-muted); font-size: 0.8rem; margin: 0.5rem 0; }
    .notice { border-radius: var(--radius-sm); padding: 0.5rem 0.8rem; margin-bottom: 0.5rem; font-size: 0.82rem; }
    .notice.warn { background: var(--yellow-muted); color: var(--yellow); }
    .notice.info { background: var(--blue-muted); color: var(--accent); }

    /* ── Cards ── */
    .grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 0.75rem; margin-bottom: 0.5rem; }
    .card { background: var(--bg-raised); border: 1px solid var(--border); border-top: 3px solid var(--accent); border-radius: var(--radius); padding: 0.75rem 0.9rem; }
    .card-label { font-size: 0.72rem; color: var(--fg-muted); text-transform: uppercase; letter-spacing: 0.04em; }
    .card-val { font-size: 1.5rem; font-weight: 700; font-family: var(--mono); }
    .card-detail { font-size: 0.72rem; color: var(--fg-subtle); }

    /* ── Charts ── */
    .chart { background: var(--bg-raised); border: 1px solid var(--border); border-radius: var(--radius); min-height: 400px; margin-bottom: 0.75rem; }
    .chart-empty { background: var(--bg-raised); border: 1px dashed var(--border); border-radius: var(--radius); min-height: 160px; display: flex; flex-direction: column; align-items: center; justify-content: center; gap: 0.3rem; color: var(--fg-muted); margin-bottom: 0.75rem; }
    .chart-empty.warn { border-color: var(--yellow); color: var(--yellow); }

    /* ── Tables ── */
    .table-title { font-size: 0.9rem; margin: 0.5rem 0; }
    .table-wrap { overflow-x: auto; border: 1px solid var(--border); border-radius: var(--radius); background: var(--bg-raised); margin-bottom: 0.75rem; }
    table { width: 100%; border-collapse: collapse; font-size: 0.8rem; }
    th { text-align: left; padding: 0.45rem 0.7rem; font-size: 0.7rem; text-transform: uppercase; color: var(--fg-muted); border-bottom: 1px solid var(--border); }
    td { padding: 0.4rem 0.7rem; border-bottom: 1px solid #eaeef2; }
    td.num { text-align: right; font-family: var(--mono); }

    /* ── Filters ── */
    .filters { display: flex; flex-wrap: wrap; gap: 1rem; align-items: flex-end; background: var(--bg-raised); border: 1px solid var(--border); border-radius: var(--radius); padding: 0.9rem; }
    .filters label { display: flex; flex-direction: column; gap: 0.3rem; font-size: 0.78rem; color: var(--fg-muted); }
    .filters select, .filters input { font: inherit; font-size: 0.82rem; padding: 0.25rem; border: 1px solid var(--border); border-radius: var(--radius-sm); min-width: 180px; }
    .filters button { font: inherit; padding: 0.35rem 1rem; border: none; border-radius: var(--radius-sm); background: var(--accent); color: white; cursor: pointer; }

    /* ── Error panel ── */
    .error-main { display: flex; align-items: center; justify-content: center; }
    .error-panel { background: var(--red-muted); color: var(--red); border: 1px solid var(--red); border-radius: var(--radius); padding: 1.5rem 2rem; max-width: 720px; }
    .error-panel h1 { font-size: 1.3rem; margin-bottom: 0.5rem; }
    .error-panel p { color: var(--fg); margin-top: 0.4rem; }
    .error-kind { font-size: 0.75rem; }
  </style>
</head>
<body>
"##;

const FOOT: &str = r##"<script>
  (function () {
    var node = document.getElementById('figures');
    if (!node || typeof Plotly === 'undefined') return;
    var figures = JSON.parse(node.textContent);
    Object.keys(figures).forEach(function (id) {
      var fig = figures[id];
      Plotly.newPlot(id, fig.data, fig.layout, { responsive: true, displaylogo: false });
    });
  })();
</script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{self, ChartKind, Encoding};
    use crate::pages::Section;

    fn page_with(blocks: Vec<Block>, notices: Vec<Notice>) -> Page {
        Page {
            id: PageId::Campaigns,
            title: "Campaign Analytics".to_string(),
            subtitle: "Detailed <campaign> metrics".to_string(),
            notices,
            sections: vec![Section {
                heading: "Body".to_string(),
                blocks,
            }],
        }
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_sidebar_marks_exactly_one_active_link() {
        let config = DashboardConfig::default();
        let html = render_page(&page_with(vec![], vec![]), &config, LinkMode::Server);
        assert_eq!(html.matches("nav-link active").count(), 1);
        assert!(html.contains("class=\"nav-link active\" href=\"/page/campaigns\""));
        assert_eq!(html.matches("class=\"nav-link").count(), 7);
        assert!(html.contains("Detailed &lt;campaign&gt; metrics"));
    }

    #[test]
    fn test_figures_are_embedded_and_empty_charts_are_labelled() {
        let mut f = Frame::new(&["channel", "revenue"]);
        f.push_row(vec!["Search".into(), Cell::Num(1.0)]);
        let enc = Encoding::new(ChartKind::Bar).x("channel").y("revenue");
        let drawn = Block::Chart(chart::build("Drawn", &f, &enc));
        let empty = Block::Chart(chart::build("Empty", &Frame::new(&["channel", "revenue"]), &enc));
        let page = page_with(vec![drawn, empty], vec![]);
        let html = render_page(&page, &DashboardConfig::default(), LinkMode::Server);
        assert!(html.contains("id=\"chart-0\""));
        assert!(!html.contains("id=\"chart-1\""));
        assert!(html.contains("No data for the current selection"));
        assert!(html.contains("\"chart-0\":{"));
    }

    #[test]
    fn test_script_json_cannot_close_the_script_tag() {
        let v = json!({"t": "</script><script>alert(1)</script>"});
        assert!(!script_json(&v).contains("</script>"));
    }

    #[test]
    fn test_static_links() {
        assert_eq!(LinkMode::Static.href(PageId::Model), "model.html");
        assert_eq!(LinkMode::Server.href(PageId::Executive), "/");
        assert_eq!(LinkMode::Server.href(PageId::Products), "/page/products");
    }

    #[test]
    fn test_error_panel_names_missing_file() {
        let err = DashboardError::MissingDataFile {
            file: "funnel_data.csv".to_string(),
        };
        let html = render_error_panel(&err);
        assert!(html.contains("Data file not found: funnel_data.csv"));
        assert!(!html.contains("class=\"nav-link"));
    }

    #[test]
    fn test_notices_render() {
        let html = render_page(
            &page_with(
                vec![],
                vec![Notice::MalformedColumn {
                    table: "customer_data.csv".to_string(),
                    detail: "2 malformed row(s) skipped".to_string(),
                }],
            ),
            &DashboardConfig::default(),
            LinkMode::Static,
        );
        assert!(html.contains("notice warn"));
        assert!(html.contains("customer_data.csv"));
    }
}
