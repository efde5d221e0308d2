//! Campaign filters: category multi-selects plus a closed date range.
//!
//! An explicit empty selection matches nothing. `All` is only produced when
//! the filter form has never been submitted.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::records::parse_date;
use crate::data::CampaignRecord;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "values")]
pub enum Selection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Selection {
    pub fn only<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Only(values.into_iter().map(Into::into).collect())
    }

    pub fn none() -> Self {
        Selection::Only(BTreeSet::new())
    }

    pub fn contains(&self, value: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Only(set) if set.is_empty())
    }
}

/// Closed interval; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Inverted bounds are swapped.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (start, end) {
            (Some(s), Some(e)) if s > e => Self {
                start: Some(e),
                end: Some(s),
            },
            _ => Self { start, end },
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CampaignFilter {
    pub channels: Selection,
    pub campaign_types: Selection,
    pub dates: DateRange,
}

impl CampaignFilter {
    pub fn matches(&self, row: &CampaignRecord) -> bool {
        self.channels.contains(&row.channel)
            && self.campaign_types.contains(&row.campaign_type)
            && self.dates.contains(row.date)
    }

    /// Matching rows in load order.
    pub fn apply<'a>(&self, rows: &'a [CampaignRecord]) -> Vec<&'a CampaignRecord> {
        rows.iter().filter(|r| self.matches(r)).collect()
    }

    /// Reads `channel`, `campaign_type`, `from`, `to` and the `filtered`
    /// marker from decoded query pairs. Without the marker, absent lists
    /// mean "all"; with it, they mean "none selected".
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let submitted = pairs.iter().any(|(k, v)| k == "filtered" && v == "1");
        let collect = |key: &str| -> Selection {
            let values: Vec<&str> = pairs
                .iter()
                .filter(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .collect();
            if values.is_empty() && !submitted {
                Selection::All
            } else {
                Selection::only(values)
            }
        };
        let date = |key: &str| -> Option<NaiveDate> {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, v)| parse_date(v))
        };
        Self {
            channels: collect("channel"),
            campaign_types: collect("campaign_type"),
            dates: DateRange::new(date("from"), date("to")),
        }
    }

    /// True when the selection can only ever produce an empty result.
    pub fn selects_nothing(&self) -> bool {
        self.channels.is_empty() || self.campaign_types.is_empty()
    }
}

/// Values offered by the filter form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub channels: Vec<String>,
    pub campaign_types: Vec<String>,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
}

impl FilterOptions {
    /// Distinct values in first-seen order.
    pub fn from_campaigns(rows: &[CampaignRecord]) -> Self {
        let mut out = FilterOptions::default();
        for r in rows {
            if !out.channels.contains(&r.channel) {
                out.channels.push(r.channel.clone());
            }
            if !out.campaign_types.contains(&r.campaign_type) {
                out.campaign_types.push(r.campaign_type.clone());
            }
            out.min_date = Some(out.min_date.map_or(r.date, |d| d.min(r.date)));
            out.max_date = Some(out.max_date.map_or(r.date, |d| d.max(r.date)));
        }
        out
    }
}
