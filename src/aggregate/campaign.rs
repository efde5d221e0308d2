use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{group_by, mean, percent, ratio, round2, sum_sorted, MeanAcc};
use crate::data::CampaignRecord;
use crate::frame::{Cell, Frame, Order};

/// Categorical campaign columns usable as a grouping key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignDim {
    Channel,
    CampaignType,
    Region,
}

impl CampaignDim {
    pub fn column(&self) -> &'static str {
        match self {
            CampaignDim::Channel => "channel",
            CampaignDim::CampaignType => "campaign_type",
            CampaignDim::Region => "region",
        }
    }

    pub fn get<'a>(&self, r: &'a CampaignRecord) -> &'a str {
        match self {
            CampaignDim::Channel => &r.channel,
            CampaignDim::CampaignType => &r.campaign_type,
            CampaignDim::Region => &r.region,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CampaignTotals {
    pub rows: usize,
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub revenue: f64,
}

impl CampaignTotals {
    pub fn add(&mut self, r: &CampaignRecord) {
        self.rows += 1;
        self.spend += r.spend;
        self.impressions += r.impressions;
        self.clicks += r.clicks;
        self.conversions += r.conversions;
        self.revenue += r.revenue;
    }

    pub fn of(rows: &[&CampaignRecord]) -> Self {
        let mut t = Self::default();
        for r in rows {
            t.add(r);
        }
        t
    }

    pub fn ctr_pct(&self) -> Option<f64> {
        percent(self.clicks, self.impressions)
    }

    pub fn cvr_pct(&self) -> Option<f64> {
        percent(self.conversions, self.clicks)
    }

    pub fn roas(&self) -> Option<f64> {
        ratio(self.revenue, self.spend)
    }
}

/// Mean of the per-row `roas` column over rows with a positive value.
pub fn avg_positive_roas(rows: &[&CampaignRecord]) -> Option<f64> {
    mean(rows.iter().map(|r| r.roas).filter(|v| *v > 0.0))
}

/// Revenue per calendar month, chronological. Months without rows between
/// the first and last month are present with zero revenue.
pub fn monthly_revenue(rows: &[&CampaignRecord]) -> Frame {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for r in rows {
        *by_month.entry((r.date.year(), r.date.month())).or_default() += r.revenue;
    }
    let mut f = Frame::new(&["month", "revenue"]);
    let (Some(&first), Some(&last)) = (by_month.keys().next(), by_month.keys().next_back()) else {
        return f;
    };
    let (mut y, mut m) = first;
    while (y, m) <= last {
        let revenue = by_month.get(&(y, m)).copied().unwrap_or(0.0);
        f.push_row(vec![Cell::Text(format!("{:04}-{:02}", y, m)), Cell::Num(revenue)]);
        if m == 12 {
            y += 1;
            m = 1;
        } else {
            m += 1;
        }
    }
    f
}

/// Revenue per key, ascending.
pub fn revenue_by(rows: &[&CampaignRecord], dim: CampaignDim) -> Frame {
    sum_sorted(
        rows.iter().copied(),
        dim.column(),
        "revenue",
        |r| dim.get(r),
        |r| r.revenue,
        Order::Ascending,
    )
}

#[derive(Debug, Default)]
struct TypeAcc {
    totals: CampaignTotals,
    roas: MeanAcc,
}

/// Spend, revenue and conversions summed, `roas` averaged, per campaign type.
/// Rows are ordered by campaign type name.
pub fn campaign_type_performance(rows: &[&CampaignRecord]) -> Frame {
    let groups = group_by(
        rows.iter().copied(),
        |r| r.campaign_type.as_str(),
        |acc: &mut TypeAcc, r| {
            acc.totals.add(r);
            acc.roas.push(r.roas);
        },
    );
    let mut f = Frame::new(&["campaign_type", "spend", "revenue", "conversions", "roas"]);
    for (kind, acc) in groups {
        f.push_row(vec![
            Cell::Text(kind),
            Cell::Num(acc.totals.spend),
            Cell::Num(acc.totals.revenue),
            Cell::Num(acc.totals.conversions),
            acc.roas.value().into(),
        ]);
    }
    f.sort_by("campaign_type", Order::Ascending)
}

/// Spend, revenue and conversions per day, chronological.
pub fn daily_performance(rows: &[&CampaignRecord]) -> Frame {
    let mut by_day: BTreeMap<NaiveDate, CampaignTotals> = BTreeMap::new();
    for r in rows {
        by_day.entry(r.date).or_default().add(r);
    }
    let mut f = Frame::new(&["date", "spend", "revenue", "conversions"]);
    for (day, t) in by_day {
        f.push_row(vec![
            Cell::Text(day.format("%Y-%m-%d").to_string()),
            Cell::Num(t.spend),
            Cell::Num(t.revenue),
            Cell::Num(t.conversions),
        ]);
    }
    f
}

/// Per-channel totals with CTR %, CVR % and ROAS rounded to two decimals.
/// Channels with a zero denominator keep their row with a missing rate.
pub fn channel_metrics(rows: &[&CampaignRecord]) -> Frame {
    let groups = group_by(
        rows.iter().copied(),
        |r| r.channel.as_str(),
        |acc: &mut CampaignTotals, r| acc.add(r),
    );
    let mut f = Frame::new(&[
        "channel",
        "impressions",
        "clicks",
        "conversions",
        "spend",
        "revenue",
        "CTR",
        "CVR",
        "ROAS",
    ]);
    for (channel, t) in groups {
        f.push_row(vec![
            Cell::Text(channel),
            Cell::Num(t.impressions),
            Cell::Num(t.clicks),
            Cell::Num(t.conversions),
            Cell::Num(t.spend),
            Cell::Num(t.revenue),
            t.ctr_pct().map(round2).into(),
            t.cvr_pct().map(round2).into(),
            t.roas().map(round2).into(),
        ]);
    }
    f
}

/// Aggregate ROAS (total revenue / total spend) per channel, ascending.
/// Unrounded, so channels apart only in the third decimal still order.
pub fn roas_by_channel(rows: &[&CampaignRecord]) -> Frame {
    let groups = group_by(
        rows.iter().copied(),
        |r| r.channel.as_str(),
        |acc: &mut CampaignTotals, r| acc.add(r),
    );
    let mut f = Frame::new(&["channel", "ROAS"]);
    for (channel, t) in groups {
        f.push_row(vec![Cell::Text(channel), t.roas().into()]);
    }
    f.sort_by("ROAS", Order::Ascending)
}
