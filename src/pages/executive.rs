use crate::aggregate::campaign::{
    avg_positive_roas, monthly_revenue, revenue_by, CampaignDim, CampaignTotals,
};
use crate::aggregate::customer::{segment_counts, segment_ltv};
use crate::chart::{ChartKind, Encoding};
use crate::data::{CampaignRecord, DataFile};
use crate::frame::format_number;
use crate::nav::PageId;

use super::{crore, times, Block, Kpi, Page, PageBuilder, PageContext};

pub fn render(ctx: &PageContext) -> Page {
    let data = ctx.data;
    let currency = ctx.config.currency.as_str();
    let mut b = PageBuilder::new(
        PageId::Executive,
        "Key performance metrics and trends at a glance",
    );
    b.check_tables(&data.manifest, &[DataFile::Campaigns, DataFile::Customers]);

    let rows: Vec<&CampaignRecord> = data.campaigns.iter().collect();
    let totals = CampaignTotals::of(&rows);
    b.section(
        "Key Metrics",
        vec![Block::Metrics(vec![
            Kpi::new("Total Revenue", crore(currency, totals.revenue)),
            Kpi::new("Total Conversions", format_number(totals.conversions)),
            Kpi::new("Avg ROAS", times(avg_positive_roas(&rows)))
                .detail("mean over campaigns with ROAS > 0".to_string()),
            Kpi::new("Total Customers", format_number(data.customers.len() as f64)),
        ])],
    );

    let trend = b.chart(
        &format!("Monthly Revenue Trend ({})", currency),
        &monthly_revenue(&rows),
        Encoding::new(ChartKind::Line)
            .x("month")
            .y("revenue")
            .titles("Month", "Revenue"),
    );
    b.section("Revenue Trend Over Time", vec![trend]);

    let by_channel = b.chart(
        "Revenue by Channel",
        &revenue_by(&rows, CampaignDim::Channel),
        Encoding::new(ChartKind::Bar).x("channel").y("revenue").horizontal(),
    );
    let by_region = b.chart(
        "Revenue by Region",
        &revenue_by(&rows, CampaignDim::Region),
        Encoding::new(ChartKind::Bar).x("region").y("revenue").horizontal(),
    );
    b.section(
        "Channel and Regional Revenue",
        vec![Block::Columns(vec![vec![by_channel], vec![by_region]])],
    );

    let segments = b.chart(
        "Customer Distribution by Segment",
        &segment_counts(&data.customers),
        Encoding::new(ChartKind::Pie).names("customer_segment").y("count"),
    );
    let ltv = b.chart(
        "Avg Lifetime Value by Segment",
        &segment_ltv(&data.customers),
        Encoding::new(ChartKind::Bar)
            .x("customer_segment")
            .y("lifetime_value")
            .horizontal(),
    );
    b.section(
        "Customer Segment Analysis",
        vec![Block::Columns(vec![vec![segments], vec![ltv]])],
    );

    b.finish()
}
