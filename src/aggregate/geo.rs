use crate::data::GeographicRecord;
use crate::frame::{Cell, Frame, Order};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeoMetric {
    Revenue,
    Satisfaction,
}

impl GeoMetric {
    pub fn column(&self) -> &'static str {
        match self {
            GeoMetric::Revenue => "revenue",
            GeoMetric::Satisfaction => "satisfaction_score",
        }
    }

    fn get(&self, g: &GeographicRecord) -> f64 {
        match self {
            GeoMetric::Revenue => g.revenue,
            GeoMetric::Satisfaction => g.satisfaction_score,
        }
    }
}

/// One row per state, ascending by the metric.
pub fn states_by(geo: &[GeographicRecord], metric: GeoMetric) -> Frame {
    let mut f = Frame::new(&["state", metric.column()]);
    for g in geo {
        f.push_row(vec![Cell::Text(g.state.clone()), Cell::from(metric.get(g))]);
    }
    f.sort_by(metric.column(), Order::Ascending)
}

pub fn map_points(geo: &[GeographicRecord]) -> Frame {
    let mut f = Frame::new(&[
        "state",
        "latitude",
        "longitude",
        "revenue",
        "store_count",
        "satisfaction_score",
    ]);
    for g in geo {
        f.push_row(vec![
            Cell::Text(g.state.clone()),
            Cell::from(g.latitude),
            Cell::from(g.longitude),
            Cell::from(g.revenue),
            Cell::from(g.store_count),
            Cell::from(g.satisfaction_score),
        ]);
    }
    f
}

pub fn state_summary(geo: &[GeographicRecord]) -> Frame {
    map_points(geo).select(&["state", "store_count", "revenue", "satisfaction_score"])
}
