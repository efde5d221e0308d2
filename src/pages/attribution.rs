use crate::aggregate::attribution::{funnel, top_journeys, touch_credit, Touch};
use crate::chart::{ChartKind, Encoding};
use crate::data::DataFile;
use crate::nav::PageId;

use super::{Block, Page, PageBuilder, PageContext};

pub fn render(ctx: &PageContext) -> Page {
    let data = ctx.data;
    let mut b = PageBuilder::new(
        PageId::Attribution,
        "Multi-touch attribution and conversion funnel insights",
    );
    b.check_tables(
        &data.manifest,
        &[DataFile::Attribution, DataFile::Funnel, DataFile::Journey],
    );

    let first = b.chart(
        "First-Touch Attribution",
        &touch_credit(&data.attribution, Touch::First),
        Encoding::new(ChartKind::Bar).x("channel").y("first_touch").horizontal(),
    );
    let last = b.chart(
        "Last-Touch Attribution",
        &touch_credit(&data.attribution, Touch::Last),
        Encoding::new(ChartKind::Bar).x("channel").y("last_touch").horizontal(),
    );
    b.section(
        "Attribution Model Comparison",
        vec![Block::Columns(vec![vec![first], vec![last]])],
    );

    let stages = funnel(&data.funnel);
    let flow = b.chart(
        "Marketing Funnel - Visitor Flow",
        &stages,
        Encoding::new(ChartKind::Funnel).x("stage").y("visitors"),
    );
    b.section(
        "Marketing Conversion Funnel",
        vec![
            flow,
            Block::Table {
                title: "Stage Conversion".to_string(),
                frame: stages,
            },
        ],
    );

    let journeys = top_journeys(&data.journeys, ctx.config.top_journeys);
    let paths = b.chart(
        "Top Customer Journey Paths",
        &journeys,
        Encoding::new(ChartKind::Bar)
            .x("path")
            .y("count")
            .titles("Journey Path", "Count"),
    );
    b.section(
        "Multi-Touchpoint Customer Journeys",
        vec![Block::Columns(vec![
            vec![Block::Table {
                title: "Top Customer Journeys".to_string(),
                frame: journeys,
            }],
            vec![paths],
        ])],
    );

    b.finish()
}
