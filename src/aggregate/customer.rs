use serde::Serialize;

use super::{
    box_stats, counts_frame, group_mean, histogram, mean, pairs_frame, percent, value_counts,
    BoxStats,
};
use crate::data::{CorrelationMatrix, CustomerRecord};
use crate::frame::{Cell, Frame, Order};

pub fn segment_counts(customers: &[CustomerRecord]) -> Frame {
    counts_frame("customer_segment", value_counts(customers, |c| c.customer_segment.as_str()))
}

/// Mean lifetime value per segment, ascending.
pub fn segment_ltv(customers: &[CustomerRecord]) -> Frame {
    pairs_frame(
        "customer_segment",
        "lifetime_value",
        group_mean(customers, |c| c.customer_segment.as_str(), |c| c.lifetime_value),
    )
    .sort_by("lifetime_value", Order::Ascending)
}

pub fn age_histogram(customers: &[CustomerRecord], bins: usize) -> Frame {
    let ages: Vec<f64> = customers.iter().map(|c| c.age).collect();
    histogram(&ages, bins)
}

pub fn income_histogram(customers: &[CustomerRecord], bins: usize) -> Frame {
    let incomes: Vec<f64> = customers.iter().map(|c| c.income).collect();
    histogram(&incomes, bins)
}

/// Row-level points for the income vs lifetime value scatter.
pub fn ltv_scatter(customers: &[CustomerRecord]) -> Frame {
    let mut f = Frame::new(&[
        "income",
        "lifetime_value",
        "customer_segment",
        "purchase_frequency",
        "age",
        "satisfaction_score",
    ]);
    for c in customers {
        f.push_row(vec![
            Cell::from(c.income),
            Cell::from(c.lifetime_value),
            Cell::Text(c.customer_segment.clone()),
            Cell::from(c.purchase_frequency),
            Cell::from(c.age),
            Cell::from(c.satisfaction_score),
        ]);
    }
    f
}

pub fn satisfaction_box(customers: &[CustomerRecord]) -> Option<BoxStats> {
    let scores: Vec<f64> = customers.iter().map(|c| c.satisfaction_score).collect();
    box_stats(&scores)
}

pub fn nps_counts(customers: &[CustomerRecord]) -> Frame {
    counts_frame("nps_category", value_counts(customers, |c| c.nps_category.as_str()))
}

pub fn churn_counts(customers: &[CustomerRecord]) -> Frame {
    counts_frame("churn_risk", value_counts(customers, |c| c.churn_risk.as_str()))
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HighRiskSummary {
    pub count: usize,
    /// Share of all customers, in percent.
    pub share_pct: Option<f64>,
    pub avg_satisfaction: Option<f64>,
    pub avg_support_tickets: Option<f64>,
}

pub fn high_risk_summary(customers: &[CustomerRecord]) -> HighRiskSummary {
    let high: Vec<&CustomerRecord> = customers
        .iter()
        .filter(|c| c.churn_risk.trim().eq_ignore_ascii_case("high"))
        .collect();
    HighRiskSummary {
        count: high.len(),
        share_pct: percent(high.len() as f64, customers.len() as f64),
        avg_satisfaction: mean(high.iter().map(|c| c.satisfaction_score)),
        avg_support_tickets: mean(high.iter().map(|c| c.support_tickets)),
    }
}

/// Correlation matrix as a frame: a `metric` label column followed by one
/// numeric column per matrix column.
pub fn correlation_frame(matrix: &CorrelationMatrix) -> Frame {
    let mut columns: Vec<&str> = vec!["metric"];
    columns.extend(matrix.columns.iter().map(|c| c.as_str()));
    let mut f = Frame::new(&columns);
    for (label, values) in &matrix.rows {
        let mut row = vec![Cell::Text(label.clone())];
        row.extend(values.iter().map(|v| Cell::from(*v)));
        f.push_row(row);
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(segment: &str, ltv: f64, churn: &str, sat: f64, tickets: f64) -> CustomerRecord {
        CustomerRecord {
            customer_segment: segment.to_string(),
            age: 30.0,
            income: 50_000.0,
            lifetime_value: ltv,
            purchase_frequency: 4.0,
            satisfaction_score: sat,
            nps_category: "Promoter".to_string(),
            churn_risk: churn.to_string(),
            support_tickets: tickets,
        }
    }

    #[test]
    fn test_segment_ltv_ascending() {
        let rows = vec![
            customer("Premium", 900.0, "Low", 9.0, 0.0),
            customer("Budget", 100.0, "High", 4.0, 3.0),
            customer("Premium", 1100.0, "Low", 8.0, 1.0),
        ];
        let f = segment_ltv(&rows);
        assert_eq!(f.texts("customer_segment"), vec!["Budget", "Premium"]);
        assert_eq!(f.numbers("lifetime_value"), vec![Some(100.0), Some(1000.0)]);
    }

    #[test]
    fn test_segment_counts_descending() {
        let rows = vec![
            customer("Budget", 1.0, "Low", 5.0, 0.0),
            customer("Premium", 1.0, "Low", 5.0, 0.0),
            customer("Premium", 1.0, "Low", 5.0, 0.0),
        ];
        let f = segment_counts(&rows);
        assert_eq!(f.texts("customer_segment"), vec!["Premium", "Budget"]);
        assert_eq!(f.numbers("count"), vec![Some(2.0), Some(1.0)]);
    }

    #[test]
    fn test_high_risk_summary() {
        let rows = vec![
            customer("A", 1.0, "High", 4.0, 3.0),
            customer("A", 1.0, "Low", 9.0, 0.0),
            customer("A", 1.0, "High", 6.0, 5.0),
            customer("A", 1.0, "Medium", 7.0, 1.0),
        ];
        let s = high_risk_summary(&rows);
        assert_eq!(s.count, 2);
        assert_eq!(s.share_pct, Some(50.0));
        assert_eq!(s.avg_satisfaction, Some(5.0));
        assert_eq!(s.avg_support_tickets, Some(4.0));
    }

    #[test]
    fn test_high_risk_summary_without_customers() {
        let s = high_risk_summary(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.share_pct, None);
        assert_eq!(s.avg_satisfaction, None);
    }

    #[test]
    fn test_correlation_frame_layout() {
        let m = CorrelationMatrix {
            columns: vec!["age".into(), "income".into()],
            rows: vec![
                ("age".into(), vec![Some(1.0), Some(0.4)]),
                ("income".into(), vec![Some(0.4), None]),
            ],
        };
        let f = correlation_frame(&m);
        assert_eq!(f.columns(), &["metric", "age", "income"]);
        assert_eq!(f.cell(1, "income"), Some(&Cell::Missing));
    }
}
