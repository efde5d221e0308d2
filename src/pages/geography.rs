use crate::aggregate::geo::{map_points, state_summary, states_by, GeoMetric};
use crate::chart::{ChartKind, Encoding};
use crate::data::DataFile;
use crate::nav::PageId;

use super::{Block, Page, PageBuilder, PageContext};

pub fn render(ctx: &PageContext) -> Page {
    let geo = &ctx.data.geographic;
    let mut b = PageBuilder::new(PageId::Geography, "Regional performance and geographic insights");
    b.check_tables(&ctx.data.manifest, &[DataFile::Geographic]);

    let revenue = b.chart(
        "Revenue by State",
        &states_by(geo, GeoMetric::Revenue),
        Encoding::new(ChartKind::Bar).x("state").y("revenue").horizontal(),
    );
    let satisfaction = b.chart(
        "Satisfaction Score by State",
        &states_by(geo, GeoMetric::Satisfaction),
        Encoding::new(ChartKind::Bar)
            .x("state")
            .y("satisfaction_score")
            .horizontal(),
    );
    b.section(
        "Geographic Distribution",
        vec![Block::Columns(vec![vec![revenue], vec![satisfaction]])],
    );

    let map = b.chart(
        "Revenue by Geographic Location",
        &map_points(geo),
        Encoding::new(ChartKind::Map)
            .x("longitude")
            .y("latitude")
            .size("revenue")
            .color("satisfaction_score")
            .names("state")
            .hover("store_count")
            .hover("satisfaction_score"),
    );
    b.section("Revenue Map", vec![map]);

    b.section(
        "State Performance Summary",
        vec![Block::Table {
            title: "States".to_string(),
            frame: state_summary(geo),
        }],
    );

    b.finish()
}
