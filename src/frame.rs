//! Row-oriented derived tables.
//!
//! Aggregations return a `Frame` with named columns so the presentation layer
//! can bind chart axes to columns by name.

use std::cmp::Ordering;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Num(f64),
    /// Undefined value, e.g. a rate over a zero denominator.
    Missing,
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Num(v) => Some(*v),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Num(v) => format_number(*v),
            Cell::Missing => "n/a".to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Cell::Num(v)
        } else {
            Cell::Missing
        }
    }
}

impl From<Option<f64>> for Cell {
    fn from(v: Option<f64>) -> Self {
        v.map(Cell::from).unwrap_or(Cell::Missing)
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Text(t) => s.serialize_str(t),
            Cell::Num(v) => s.serialize_f64(*v),
            Cell::Missing => s.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Short rows are padded with `Missing`, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Numeric view of a column; non-numeric cells are `None`.
    pub fn numbers(&self, column: &str) -> Vec<Option<f64>> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| r[idx].as_f64()).collect(),
            None => Vec::new(),
        }
    }

    pub fn texts(&self, column: &str) -> Vec<String> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| r[idx].display()).collect(),
            None => Vec::new(),
        }
    }

    /// Stable sort on one column, numbers numerically and text by name.
    /// Missing values sort first in ascending order and last in descending
    /// order; ties keep row order.
    pub fn sort_by(mut self, column: &str, order: Order) -> Self {
        let Some(idx) = self.column_index(column) else {
            return self;
        };
        self.rows.sort_by(|a, b| {
            let ord = cmp_cells(&a[idx], &b[idx]);
            match order {
                Order::Ascending => ord,
                Order::Descending => ord.reverse(),
            }
        });
        self
    }

    pub fn head(mut self, n: usize) -> Self {
        self.rows.truncate(n);
        self
    }

    /// Keep only the named columns, in the given order.
    pub fn select(&self, columns: &[&str]) -> Self {
        let idx: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let mut out = Frame::new(columns);
        for row in &self.rows {
            out.push_row(
                idx.iter()
                    .map(|i| i.map(|i| row[i].clone()).unwrap_or(Cell::Missing))
                    .collect(),
            );
        }
        out
    }
}

fn cmp_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Num(x), Cell::Num(y)) => x.total_cmp(y),
        (Cell::Text(x), Cell::Text(y)) => x.cmp(y),
        (Cell::Missing, Cell::Missing) => Ordering::Equal,
        (Cell::Missing, _) => Ordering::Less,
        (_, Cell::Missing) => Ordering::Greater,
        (Cell::Num(_), Cell::Text(_)) => Ordering::Less,
        (Cell::Text(_), Cell::Num(_)) => Ordering::Greater,
    }
}

/// Serializes as `{"columns": [...], "rows": [[...], ...]}`.
impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(2))?;
        map.serialize_entry("columns", &self.columns)?;
        map.serialize_entry("rows", &self.rows)?;
        map.end()
    }
}

/// Thousands-separated integers, two decimals otherwise.
pub fn format_number(v: f64) -> String {
    if !v.is_finite() {
        return "n/a".to_string();
    }
    if v.fract() == 0.0 && v.abs() < 1e15 {
        let digits = format!("{}", v.abs() as u64);
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        if v < 0.0 {
            out.insert(0, '-');
        }
        out
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        let mut f = Frame::new(&["channel", "roas"]);
        f.push_row(vec!["Search".into(), Cell::Num(2.0)]);
        f.push_row(vec!["Email".into(), Cell::Missing]);
        f.push_row(vec!["Display".into(), Cell::Num(1.0)]);
        f.push_row(vec!["Social".into(), Cell::Num(2.0)]);
        f
    }

    #[test]
    fn test_sort_ascending_is_stable_with_missing_first() {
        let f = sample().sort_by("roas", Order::Ascending);
        assert_eq!(f.texts("channel"), vec!["Email", "Display", "Search", "Social"]);
    }

    #[test]
    fn test_sort_descending_keeps_tie_order() {
        let f = sample().sort_by("roas", Order::Descending);
        assert_eq!(f.texts("channel"), vec!["Search", "Social", "Display", "Email"]);
    }

    #[test]
    fn test_push_row_pads_short_rows() {
        let mut f = Frame::new(&["a", "b"]);
        f.push_row(vec![Cell::Num(1.0)]);
        assert_eq!(f.cell(0, "b"), Some(&Cell::Missing));
    }

    #[test]
    fn test_non_finite_becomes_missing() {
        assert_eq!(Cell::from(f64::NAN), Cell::Missing);
        assert_eq!(Cell::from(f64::INFINITY), Cell::Missing);
    }

    #[test]
    fn test_serialize_shape() {
        let json = serde_json::to_value(sample().head(2)).unwrap();
        assert_eq!(json["columns"][1], "roas");
        assert_eq!(json["rows"][0][1], 2.0);
        assert!(json["rows"][1][1].is_null());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567.0), "1,234,567");
        assert_eq!(format_number(-1000.0), "-1,000");
        assert_eq!(format_number(12.345), "12.35");
        assert_eq!(format_number(999.0), "999");
    }
}
