use crate::aggregate::campaign::{
    campaign_type_performance, channel_metrics, daily_performance, roas_by_channel, CampaignTotals,
};
use crate::chart::{ChartKind, Encoding};
use crate::data::DataFile;
use crate::filter::FilterOptions;
use crate::nav::PageId;

use super::{
    lakhs, millions, pct, Block, FilterForm, Kpi, Notice, Page, PageBuilder, PageContext, NA,
};

pub fn render(ctx: &PageContext) -> Page {
    let data = ctx.data;
    let mut b = PageBuilder::new(
        PageId::Campaigns,
        "Detailed campaign performance metrics and insights",
    );
    b.check_tables(&data.manifest, &[DataFile::Campaigns]);

    let filter = ctx.query.campaign_filter();
    let rows = filter.apply(&data.campaigns);
    b.section(
        "Filters",
        vec![Block::Filter(FilterForm {
            options: FilterOptions::from_campaigns(&data.campaigns),
            current: filter.clone(),
        })],
    );
    if rows.is_empty() {
        let detail = if filter.selects_nothing() {
            "No channel or campaign type selected".to_string()
        } else {
            "No campaigns match the selected filters".to_string()
        };
        b.notice(Notice::EmptyFilterResult { detail });
    }

    let totals = CampaignTotals::of(&rows);
    let when_rows = |s: String| if rows.is_empty() { NA.to_string() } else { s };
    b.section(
        "Key Metrics",
        vec![Block::Metrics(vec![
            Kpi::new("Total Spend", when_rows(lakhs(&ctx.config.currency, totals.spend))),
            Kpi::new("Total Impressions", when_rows(millions(totals.impressions))),
            Kpi::new("Avg CTR", pct(totals.ctr_pct())),
            Kpi::new("Avg CVR", pct(totals.cvr_pct())),
        ])],
    );

    let by_type = campaign_type_performance(&rows);
    let spend = b.chart(
        "Spend by Campaign Type",
        &by_type,
        Encoding::new(ChartKind::Bar).x("campaign_type").y("spend").text_labels(),
    );
    let revenue = b.chart(
        "Revenue by Campaign Type",
        &by_type,
        Encoding::new(ChartKind::Bar).x("campaign_type").y("revenue").text_labels(),
    );
    b.section(
        "Campaign Type Performance",
        vec![
            Block::Columns(vec![vec![spend], vec![revenue]]),
            Block::Table {
                title: "Campaign Type Summary".to_string(),
                frame: by_type,
            },
        ],
    );

    let daily = b.chart(
        "Revenue vs Spend Trend",
        &daily_performance(&rows),
        Encoding::new(ChartKind::Line)
            .x("date")
            .y("revenue")
            .secondary("spend")
            .secondary_kind(ChartKind::Bar)
            .titles("Date", "Revenue")
            .y2_title("Spend"),
    );
    b.section("Daily Performance Trends", vec![daily]);

    let roas = b.chart(
        "ROAS by Channel",
        &roas_by_channel(&rows),
        Encoding::new(ChartKind::Bar).x("channel").y("ROAS").horizontal(),
    );
    b.section(
        "Channel Performance Matrix",
        vec![
            Block::Table {
                title: "Channel Metrics".to_string(),
                frame: channel_metrics(&rows),
            },
            roas,
            Block::Note(
                "CTR = clicks / impressions, CVR = conversions / clicks, ROAS = revenue / spend. \
                 Rates over a zero denominator show as n/a."
                    .to_string(),
            ),
        ],
    );

    b.finish()
}
