use crate::aggregate::box_frame;
use crate::aggregate::customer::{
    age_histogram, churn_counts, correlation_frame, high_risk_summary, income_histogram,
    ltv_scatter, nps_counts, satisfaction_box,
};
use crate::chart::{ChartKind, Encoding};
use crate::data::DataFile;
use crate::nav::PageId;

use super::{fixed, Block, Kpi, Page, PageBuilder, PageContext, NA};

pub fn render(ctx: &PageContext) -> Page {
    let data = ctx.data;
    let customers = &data.customers;
    let bins = ctx.config.histogram_bins;
    let mut b = PageBuilder::new(
        PageId::Customers,
        "Understanding customer demographics, behavior, and segments",
    );
    b.check_tables(&data.manifest, &[DataFile::Customers, DataFile::Correlation]);

    let age = b.chart(
        "Age Distribution",
        &age_histogram(customers, bins),
        Encoding::new(ChartKind::Histogram)
            .x("bin_mid")
            .y("count")
            .titles("Age", "Number of Customers"),
    );
    let income = b.chart(
        "Income Distribution",
        &income_histogram(customers, bins),
        Encoding::new(ChartKind::Histogram)
            .x("bin_mid")
            .y("count")
            .titles("Income", "Number of Customers"),
    );
    b.section(
        "Customer Demographics",
        vec![Block::Columns(vec![vec![age], vec![income]])],
    );

    let scatter = b.chart(
        "Customer Income vs LTV",
        &ltv_scatter(customers),
        Encoding::new(ChartKind::Scatter)
            .x("income")
            .y("lifetime_value")
            .color("customer_segment")
            .size("purchase_frequency")
            .hover("age")
            .hover("satisfaction_score")
            .titles("Income", "Lifetime Value"),
    );
    b.section("Income vs Lifetime Value", vec![scatter]);

    let satisfaction = b.chart(
        "Satisfaction Score Distribution",
        &box_frame("satisfaction_score", satisfaction_box(customers)),
        Encoding::new(ChartKind::Box).names("name"),
    );
    let nps = b.chart(
        "NPS Category Distribution",
        &nps_counts(customers),
        Encoding::new(ChartKind::Pie).names("nps_category").y("count"),
    );
    b.section(
        "Satisfaction and NPS",
        vec![Block::Columns(vec![vec![satisfaction], vec![nps]])],
    );

    let churn = b.chart(
        "Churn Risk Distribution",
        &churn_counts(customers),
        Encoding::new(ChartKind::Pie).names("churn_risk").y("count"),
    );
    let risk = high_risk_summary(customers);
    let share = risk
        .share_pct
        .map(|p| format!("{:.1}% of customers", p))
        .unwrap_or_else(|| NA.to_string());
    let risk_block = Block::Metrics(vec![
        Kpi::new("High Risk Customers", risk.count.to_string()).detail(share),
        Kpi::new(
            "Average Satisfaction",
            risk.avg_satisfaction
                .map(|v| format!("{:.2}/10", v))
                .unwrap_or_else(|| NA.to_string()),
        ),
        Kpi::new("Average Support Tickets", fixed(risk.avg_support_tickets, 1)),
    ]);
    b.section(
        "Churn Risk Analysis",
        vec![Block::Columns(vec![vec![churn], vec![risk_block]])],
    );

    let corr = b.chart(
        "Customer Metric Correlations",
        &correlation_frame(&data.correlation),
        Encoding::new(ChartKind::Heatmap)
            .x("metric")
            .scale("RdBu")
            .text_labels(),
    );
    b.section("Correlation Matrix", vec![corr]);

    b.finish()
}
