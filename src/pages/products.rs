use crate::aggregate::product::{
    category_sales, quarterly_sales, top_subcategories, treemap, TOP_SUBCATEGORIES,
};
use crate::chart::{ChartKind, Encoding};
use crate::data::DataFile;
use crate::nav::PageId;

use super::{Page, PageBuilder, PageContext};

pub fn render(ctx: &PageContext) -> Page {
    let products = &ctx.data.products;
    let mut b = PageBuilder::new(
        PageId::Products,
        "Product sales, categories, and performance metrics",
    );
    b.check_tables(&ctx.data.manifest, &[DataFile::Products]);

    let category = b.chart(
        "Total Sales by Category",
        &category_sales(products),
        Encoding::new(ChartKind::Bar).x("category").y("sales").horizontal(),
    );
    b.section("Sales by Product Category", vec![category]);

    let subcategory = b.chart(
        &format!("Top {} Subcategories by Sales", TOP_SUBCATEGORIES),
        &top_subcategories(products, TOP_SUBCATEGORIES),
        Encoding::new(ChartKind::Bar).x("subcategory").y("sales").horizontal(),
    );
    b.section("Sales by Subcategory", vec![subcategory]);

    let tree = b.chart(
        "Product Sales Treemap",
        &treemap(products),
        Encoding::new(ChartKind::Treemap)
            .x("id")
            .names("label")
            .parent("parent")
            .y("value"),
    );
    b.section("Product Hierarchy", vec![tree]);

    let quarterly = b.chart(
        "Sales by Quarter",
        &quarterly_sales(products),
        Encoding::new(ChartKind::Line).x("quarter").y("sales"),
    );
    b.section("Quarterly Sales Trends", vec![quarterly]);

    b.finish()
}
