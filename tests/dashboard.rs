use std::fs;
use std::path::Path;

use novamart::data::DataFile;
use novamart::nav::{render_page, PageId};
use novamart::pages::{Notice, PageContext, PageQuery};
use novamart::server::{Dashboard, DashboardState};
use novamart::{load_dataset, DashboardConfig, DashboardError};
use serde_json::Value;
use tempfile::TempDir;

fn write_csv(path: &Path, header: &[&str], rows: &[&str]) {
    let mut out = String::new();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in rows {
        out.push_str(row);
        out.push('\n');
    }
    fs::write(path, out).unwrap();
}

fn write_fixture(dir: &Path) {
    write_csv(
        &dir.join("campaign_performance.csv"),
        &[
            "date",
            "channel",
            "campaign_type",
            "region",
            "spend",
            "impressions",
            "clicks",
            "conversions",
            "revenue",
            "roas",
        ],
        &[
            "2024-01-05,Search,Brand,North,50,1000,50,5,100,2.0",
            "2024-01-20,Display,Awareness,South,40,2000,20,2,40,1.0",
            "2024-02-03,Search,Performance,North,30,500,25,4,90,3.0",
        ],
    );
    write_csv(
        &dir.join("customer_data.csv"),
        &[
            "customer_segment",
            "age",
            "income",
            "lifetime_value",
            "purchase_frequency",
            "satisfaction_score",
            "nps_category",
            "churn_risk",
            "support_tickets",
        ],
        &[
            "Premium,34,1200000,90000,12,4.5,Promoter,Low,1",
            "Regular,45,600000,30000,4,3.2,Passive,High,3",
            "Budget,23,300000,8000,2,2.1,Detractor,High,5",
        ],
    );
    write_csv(
        &dir.join("product_sales.csv"),
        &["category", "subcategory", "product_name", "quarter", "sales"],
        &[
            "Electronics,Phones,Nova X,Q1,500000",
            "Electronics,Audio,Nova Buds,Q1,120000",
            "Fashion,Shoes,Runner,Q2,80000",
        ],
    );
    write_csv(
        &dir.join("lead_scoring_results.csv"),
        &["actual_converted", "predicted_class", "predicted_probability"],
        &["1,1,0.9", "0,1,0.6", "1,0,0.4", "0,0,0.1"],
    );
    write_csv(
        &dir.join("feature_importance.csv"),
        &["feature", "importance"],
        &["engagement_score,0.4", "page_views,0.25", "email_opens,0.1"],
    );
    write_csv(
        &dir.join("learning_curve.csv"),
        &["data_size", "training_score", "validation_score"],
        &["100,0.95,0.70", "500,0.90,0.80", "1000,0.88,0.84"],
    );
    write_csv(
        &dir.join("geographic_data.csv"),
        &["state", "latitude", "longitude", "store_count", "revenue", "satisfaction_score"],
        &[
            "Maharashtra,19.75,75.71,40,9000000,4.2",
            "Karnataka,15.31,75.71,25,6000000,4.4",
        ],
    );
    write_csv(
        &dir.join("channel_attribution.csv"),
        &["channel", "first_touch", "last_touch"],
        &["Search,0.4,0.5", "Display,0.3,0.1", "Email,0.3,0.4"],
    );
    write_csv(
        &dir.join("funnel_data.csv"),
        &["stage", "visitors"],
        &["Awareness,10000", "Interest,4000", "Purchase,500"],
    );
    write_csv(
        &dir.join("customer_journey.csv"),
        &["path"],
        &[
            "Search > Email > Purchase",
            "Display > Search > Purchase",
            "Search > Email > Purchase",
        ],
    );
    fs::write(
        dir.join("correlation_matrix.csv"),
        ",age,income\nage,1.0,0.35\nincome,0.35,1.0\n",
    )
    .unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path());
    dir
}

fn dashboard(dir: &Path) -> Dashboard {
    Dashboard::new(DashboardState::load(dir), DashboardConfig::default())
}

#[test]
fn full_fixture_loads_every_table() {
    let dir = fixture();
    let data = load_dataset(dir.path()).unwrap();
    assert_eq!(data.campaigns.len(), 3);
    assert_eq!(data.leads.len(), 4);
    assert_eq!(data.correlation.columns, vec!["age", "income"]);
    assert_eq!(data.manifest.tables.len(), DataFile::ALL.len());
    assert_eq!(data.manifest.degraded().count(), 0);
    for t in &data.manifest.tables {
        assert_eq!(t.sha256.len(), 64, "{}", t.file);
    }
}

#[test]
fn missing_file_aborts_load_and_names_it() {
    let dir = fixture();
    fs::remove_file(dir.path().join("funnel_data.csv")).unwrap();
    let err = load_dataset(dir.path()).unwrap_err();
    assert!(matches!(err, DashboardError::MissingDataFile { .. }));
    assert_eq!(err.missing_file(), Some("funnel_data.csv"));
}

#[test]
fn missing_file_blocks_every_page_with_error_panel() {
    let dir = fixture();
    fs::remove_file(dir.path().join("customer_data.csv")).unwrap();
    let mut d = dashboard(dir.path());
    for id in PageId::ALL {
        let r = d.handle("GET", &format!("/page/{}", id.slug()));
        assert_eq!(r.status, 503, "{:?}", id);
        assert!(r.body.contains("Data file not found: customer_data.csv"));
        assert!(!r.body.contains("chart-0"));
    }
}

#[test]
fn every_page_renders_charts_from_fixture() {
    let dir = fixture();
    let data = load_dataset(dir.path()).unwrap();
    let config = DashboardConfig::default();
    let query = PageQuery::default();
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };
    for id in PageId::ALL {
        let page = render_page(id, &ctx);
        assert_eq!(page.id, id);
        assert!(!page.charts().is_empty(), "{:?} has no charts", id);
        assert!(page.notices.is_empty(), "{:?}: {:?}", id, page.notices);
        for chart in page.charts() {
            assert!(chart.warnings.is_empty(), "{}: {:?}", chart.title, chart.warnings);
            assert!(chart.figure.is_some(), "{} has no figure", chart.title);
        }
    }
}

#[test]
fn roas_chart_orders_channels_ascending() {
    let dir = fixture();
    let mut d = dashboard(dir.path());
    let r = d.handle(
        "GET",
        "/api/page/campaigns?filtered=1&channel=Search&channel=Display\
         &campaign_type=Brand&campaign_type=Awareness",
    );
    assert_eq!(r.status, 200);
    let page: Value = serde_json::from_str(&r.body).unwrap();
    let sections = page["sections"].as_array().unwrap();
    let matrix = sections
        .iter()
        .find(|s| s["heading"] == "Channel Performance Matrix")
        .unwrap();
    let chart = matrix["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["block"] == "chart")
        .unwrap();
    let trace = &chart["body"]["figure"]["data"][0];
    assert_eq!(trace["y"], serde_json::json!(["Display", "Search"]));
    assert_eq!(trace["x"], serde_json::json!([1.0, 2.0]));
}

#[test]
fn filter_with_no_channel_yields_empty_result() {
    let dir = fixture();
    let data = load_dataset(dir.path()).unwrap();
    let config = DashboardConfig::default();
    let query = PageQuery::parse("filtered=1&campaign_type=Brand");
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };
    let page = render_page(PageId::Campaigns, &ctx);
    assert!(page
        .notices
        .iter()
        .any(|n| matches!(n, Notice::EmptyFilterResult { .. })));
    let roas = page.chart("ROAS by Channel").unwrap();
    assert!(roas.is_no_data());

    let mut d = dashboard(dir.path());
    let r = d.handle("GET", "/page/campaigns?filtered=1&campaign_type=Brand");
    assert_eq!(r.status, 200);
    assert!(r.body.contains("No data for the current selection"));
}

#[test]
fn unfiltered_campaigns_page_matches_all_rows() {
    let dir = fixture();
    let data = load_dataset(dir.path()).unwrap();
    let config = DashboardConfig::default();
    let query = PageQuery::default();
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };
    let page = render_page(PageId::Campaigns, &ctx);
    assert!(page.notices.is_empty());
    let roas = page.chart("ROAS by Channel").unwrap();
    let trace = &roas.figure.as_ref().unwrap()["data"][0];
    // Search: 190 / 80
    assert_eq!(trace["y"], serde_json::json!(["Display", "Search"]));
    assert_eq!(trace["x"][1], serde_json::json!(2.375));
}

#[test]
fn malformed_rows_surface_as_page_notices() {
    let dir = fixture();
    write_csv(
        &dir.path().join("lead_scoring_results.csv"),
        &["actual_converted", "predicted_class", "predicted_probability"],
        &["1,1,0.9", "maybe,1,0.6", "0,0,0.1"],
    );
    let data = load_dataset(dir.path()).unwrap();
    let stats = data.manifest.table(DataFile::Leads).unwrap();
    assert_eq!(stats.rows, 2);
    assert_eq!(stats.skipped_rows, 1);

    let config = DashboardConfig::default();
    let query = PageQuery::default();
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };
    let page = render_page(PageId::Model, &ctx);
    assert!(page.notices.iter().any(|n| matches!(
        n,
        Notice::MalformedColumn { table, .. } if table == "lead_scoring_results.csv"
    )));
    // Other pages do not read the lead table.
    assert!(render_page(PageId::Geography, &ctx).notices.is_empty());
}

#[test]
fn out_of_range_probability_flags_model_page_only() {
    let dir = fixture();
    write_csv(
        &dir.path().join("lead_scoring_results.csv"),
        &["actual_converted", "predicted_class", "predicted_probability"],
        &["1,1,1.4", "0,1,0.6", "1,0,0.4", "0,0,0.1"],
    );
    let data = load_dataset(dir.path()).unwrap();
    assert_eq!(data.manifest.table(DataFile::Leads).unwrap().skipped_rows, 0);

    let config = DashboardConfig::default();
    let query = PageQuery::default();
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };
    let page = render_page(PageId::Model, &ctx);
    assert!(page.notices.iter().any(|n| matches!(
        n,
        Notice::MalformedColumn { table, detail }
            if table == "lead_scoring_results.csv" && detail.starts_with("1 predicted_probability")
    )));
    assert!(render_page(PageId::Geography, &ctx).notices.is_empty());
}

#[test]
fn charts_carry_hover_fields_and_spend_bars() {
    let dir = fixture();
    let data = load_dataset(dir.path()).unwrap();
    let config = DashboardConfig::default();
    let query = PageQuery::default();
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };

    let geo = render_page(PageId::Geography, &ctx);
    let map = geo.chart("Revenue by Geographic Location").unwrap();
    let text = &map.figure.as_ref().unwrap()["data"][0]["text"][0];
    assert_eq!(text, "Maharashtra<br>store_count: 40<br>satisfaction_score: 4.20");

    let campaigns = render_page(PageId::Campaigns, &ctx);
    let trend = campaigns.chart("Revenue vs Spend Trend").unwrap();
    let data = trend.figure.as_ref().unwrap()["data"].as_array().unwrap();
    assert_eq!(data[1]["type"], "bar");
    assert_eq!(data[1]["yaxis"], "y2");
}

#[test]
fn model_page_reports_auc_in_roc_title() {
    let dir = fixture();
    let data = load_dataset(dir.path()).unwrap();
    let config = DashboardConfig::default();
    let query = PageQuery::default();
    let ctx = PageContext {
        data: &data,
        query: &query,
        config: &config,
    };
    let page = render_page(PageId::Model, &ctx);
    // Positives score 0.9 and 0.4, negatives 0.6 and 0.1: 3 of 4 pairs ranked correctly.
    assert!(page.chart("ROC Curve (AUC = 0.750)").is_some());
    assert!(page.chart("Confusion Matrix").is_some());
}

#[test]
fn api_routes_serve_json() {
    let dir = fixture();
    let mut d = dashboard(dir.path());

    let health: Value = serde_json::from_str(&d.handle("GET", "/api/health").body).unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["tables"], 11);

    let manifest = d.handle("GET", "/api/manifest");
    assert_eq!(manifest.status, 200);
    assert_eq!(manifest.content_type, "application/json");
    let manifest: Value = serde_json::from_str(&manifest.body).unwrap();
    assert_eq!(manifest["tables"][0]["file"], "campaign_performance.csv");

    d.handle("GET", "/page/model");
    let pages: Value = serde_json::from_str(&d.handle("GET", "/api/pages").body).unwrap();
    assert_eq!(pages[6]["slug"], "model");
    assert_eq!(pages[6]["active"], true);
    assert_eq!(pages[0]["active"], false);
}

#[test]
fn html_page_links_every_other_page() {
    let dir = fixture();
    let mut d = dashboard(dir.path());
    let r = d.handle("GET", "/");
    assert_eq!(r.status, 200);
    for id in PageId::ALL {
        if id != PageId::Executive {
            assert!(r.body.contains(&format!("href=\"/page/{}\"", id.slug())), "{:?}", id);
        }
    }
    assert!(r.body.contains("Plotly.newPlot"));
}
