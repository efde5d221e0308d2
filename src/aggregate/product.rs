use std::collections::BTreeMap;

use super::{group_by, sum_sorted};
use crate::data::ProductRecord;
use crate::frame::{Cell, Frame, Order};

pub const TOP_SUBCATEGORIES: usize = 10;

pub fn category_sales(products: &[ProductRecord]) -> Frame {
    sum_sorted(
        products,
        "category",
        "sales",
        |p| p.category.as_str(),
        |p| p.sales,
        Order::Ascending,
    )
}

/// Best-selling subcategories, descending.
pub fn top_subcategories(products: &[ProductRecord], n: usize) -> Frame {
    sum_sorted(
        products,
        "subcategory",
        "sales",
        |p| p.subcategory.as_str(),
        |p| p.sales,
        Order::Descending,
    )
    .head(n)
}

/// Two-level treemap: one node per category (its total) and one per
/// product under its category. Node ids are `category` and
/// `category/product` so product names may repeat across categories.
pub fn treemap(products: &[ProductRecord]) -> Frame {
    let mut f = Frame::new(&["id", "label", "parent", "value"]);
    let categories = group_by(
        products,
        |p| p.category.as_str(),
        |acc: &mut Vec<_>, p| acc.push(p),
    );
    for (category, members) in categories {
        let total: f64 = members.iter().map(|p| p.sales).sum();
        f.push_row(vec![
            Cell::Text(category.clone()),
            Cell::Text(category.clone()),
            Cell::Text(String::new()),
            Cell::Num(total),
        ]);
        let per_product = group_by(
            members.iter().copied(),
            |p| p.product_name.as_str(),
            |acc: &mut f64, p| *acc += p.sales,
        );
        for (product, sales) in per_product {
            f.push_row(vec![
                Cell::Text(format!("{}/{}", category, product)),
                Cell::Text(product),
                Cell::Text(category.clone()),
                Cell::Num(sales),
            ]);
        }
    }
    f
}

/// Sales per quarter label, in label order.
pub fn quarterly_sales(products: &[ProductRecord]) -> Frame {
    let mut by_quarter: BTreeMap<&str, f64> = BTreeMap::new();
    for p in products {
        *by_quarter.entry(p.quarter.as_str()).or_default() += p.sales;
    }
    let mut f = Frame::new(&["quarter", "sales"]);
    for (q, sales) in by_quarter {
        f.push_row(vec![Cell::from(q), Cell::Num(sales)]);
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(category: &str, sub: &str, name: &str, quarter: &str, sales: f64) -> ProductRecord {
        ProductRecord {
            category: category.to_string(),
            subcategory: sub.to_string(),
            product_name: name.to_string(),
            quarter: quarter.to_string(),
            sales,
        }
    }

    fn catalog() -> Vec<ProductRecord> {
        vec![
            product("Electronics", "Phones", "Nova X", "Q2 2024", 500.0),
            product("Home", "Kitchen", "Kettle", "Q1 2024", 80.0),
            product("Electronics", "Laptops", "Nova Book", "Q1 2024", 900.0),
            product("Electronics", "Phones", "Nova X", "Q1 2024", 300.0),
        ]
    }

    #[test]
    fn test_category_sales_ascending() {
        let f = category_sales(&catalog());
        assert_eq!(f.texts("category"), vec!["Home", "Electronics"]);
        assert_eq!(f.numbers("sales"), vec![Some(80.0), Some(1700.0)]);
    }

    #[test]
    fn test_top_subcategories_truncates() {
        let f = top_subcategories(&catalog(), 2);
        assert_eq!(f.texts("subcategory"), vec!["Laptops", "Phones"]);
    }

    #[test]
    fn test_treemap_parents_sum_children() {
        let f = treemap(&catalog());
        assert_eq!(f.texts("id")[0], "Electronics");
        assert_eq!(f.numbers("value")[0], Some(1700.0));
        let children: f64 = f
            .rows()
            .iter()
            .filter(|r| r[2] == Cell::Text("Electronics".into()))
            .filter_map(|r| r[3].as_f64())
            .sum();
        assert_eq!(children, 1700.0);
        assert!(f.texts("id").contains(&"Electronics/Nova X".to_string()));
    }

    #[test]
    fn test_quarterly_sales_sorted_by_label() {
        let f = quarterly_sales(&catalog());
        assert_eq!(f.texts("quarter"), vec!["Q1 2024", "Q2 2024"]);
        assert_eq!(f.numbers("sales"), vec![Some(1280.0), Some(500.0)]);
    }
}
