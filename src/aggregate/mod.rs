//! Derived tables for the dashboard pages.
//!
//! Everything here is a pure function of the input rows. Groups come out in
//! first-seen order; value sorts are stable so ties keep that order. Rates
//! over a zero denominator are `None`, never a panic or a dropped row.

pub mod attribution;
pub mod campaign;
pub mod customer;
pub mod geo;
pub mod model;
pub mod product;

use std::collections::HashMap;

use serde::Serialize;

use crate::frame::{Cell, Frame, Order};

/// `num / den`, or `None` when the denominator is zero or either side is
/// not finite.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        None
    } else {
        Some(num / den)
    }
}

pub fn percent(num: f64, den: f64) -> Option<f64> {
    ratio(num, den).map(|r| r * 100.0)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    ratio(sum, n as f64)
}

/// Fold rows into per-key accumulators, keeping first-seen key order.
pub fn group_by<'a, T: 'a, A: Default>(
    rows: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> &str,
    mut fold: impl FnMut(&mut A, &'a T),
) -> Vec<(String, A)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, A)> = Vec::new();
    for row in rows {
        let k = key(row);
        let slot = match index.get(k) {
            Some(&i) => i,
            None => {
                index.insert(k.to_string(), groups.len());
                groups.push((k.to_string(), A::default()));
                groups.len() - 1
            }
        };
        fold(&mut groups[slot].1, row);
    }
    groups
}

pub fn group_sum<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> &str,
    value: impl Fn(&T) -> f64,
) -> Vec<(String, f64)> {
    group_by(rows, key, |acc: &mut f64, r| *acc += value(r))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAcc {
    pub sum: f64,
    pub n: usize,
}

impl MeanAcc {
    pub fn push(&mut self, v: f64) {
        self.sum += v;
        self.n += 1;
    }

    pub fn value(&self) -> Option<f64> {
        ratio(self.sum, self.n as f64)
    }
}

pub fn group_mean<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> &str,
    value: impl Fn(&T) -> f64,
) -> Vec<(String, Option<f64>)> {
    group_by(rows, key, |acc: &mut MeanAcc, r| acc.push(value(r)))
        .into_iter()
        .map(|(k, acc)| (k, acc.value()))
        .collect()
}

/// Occurrences per key, most frequent first.
pub fn value_counts<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    key: impl Fn(&T) -> &str,
) -> Vec<(String, usize)> {
    let mut counts = group_by(rows, key, |n: &mut usize, _| *n += 1);
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Two-column frame from `(key, value)` pairs.
pub fn pairs_frame<V: Into<Cell>>(
    key_col: &str,
    value_col: &str,
    pairs: Vec<(String, V)>,
) -> Frame {
    let mut f = Frame::new(&[key_col, value_col]);
    for (k, v) in pairs {
        f.push_row(vec![Cell::Text(k), v.into()]);
    }
    f
}

pub fn counts_frame(key_col: &str, counts: Vec<(String, usize)>) -> Frame {
    pairs_frame(
        key_col,
        "count",
        counts.into_iter().map(|(k, n)| (k, n as f64)).collect(),
    )
}

/// Sum per key, sorted by the summed value.
pub fn sum_sorted<'a, T: 'a>(
    rows: impl IntoIterator<Item = &'a T>,
    key_col: &str,
    value_col: &str,
    key: impl Fn(&T) -> &str,
    value: impl Fn(&T) -> f64,
    order: Order,
) -> Frame {
    pairs_frame(key_col, value_col, group_sum(rows, key, value)).sort_by(value_col, order)
}

// =============================================================================
// Distribution summaries
// =============================================================================

/// Equal-width histogram over the finite values. The last bin is closed on
/// the right so the maximum is counted.
pub fn histogram(values: &[f64], bins: usize) -> Frame {
    let mut f = Frame::new(&["bin_start", "bin_end", "bin_mid", "count"]);
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return f;
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, width) = if max > min {
        (min, (max - min) / bins as f64)
    } else {
        (min - 0.5, 1.0 / bins as f64)
    };
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    for (i, n) in counts.into_iter().enumerate() {
        let start = lo + width * i as f64;
        let end = start + width;
        f.push_row(vec![
            Cell::Num(start),
            Cell::Num(end),
            Cell::Num((start + end) / 2.0),
            Cell::Num(n as f64),
        ]);
    }
    f
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub mean: f64,
    pub n: usize,
}

/// Quartiles by linear interpolation between closest ranks.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(BoxStats {
        min: sorted[0],
        q1: quantile_sorted(&sorted, 0.25),
        median: quantile_sorted(&sorted, 0.5),
        q3: quantile_sorted(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
        n: sorted.len(),
    })
}

/// One labelled row of box statistics; empty when there were no values.
pub fn box_frame(label: &str, stats: Option<BoxStats>) -> Frame {
    let mut f = Frame::new(&["name", "min", "q1", "median", "q3", "max", "mean", "n"]);
    if let Some(b) = stats {
        f.push_row(vec![
            Cell::from(label),
            Cell::Num(b.min),
            Cell::Num(b.q1),
            Cell::Num(b.median),
            Cell::Num(b.q3),
            Cell::Num(b.max),
            Cell::Num(b.mean),
            Cell::Num(b.n as f64),
        ]);
    }
    f
}

fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}
