//! Chart specifications.
//!
//! `build` turns a derived `Frame` plus a declared `Encoding` into a Plotly
//! figure (`{"data": [...], "layout": {...}}`). The figure is plain JSON; the
//! page drawing it only hands it to plotly.js.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::frame::{Cell, Frame};
use crate::logging::{log, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Scatter,
    /// Pre-binned counts, drawn as touching bars.
    Histogram,
    /// Pre-computed quartiles (`min`, `q1`, `median`, `q3`, `max`, `mean`).
    Box,
    Treemap,
    /// Bubble map over latitude/longitude.
    Map,
    Funnel,
    Heatmap,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
            ChartKind::Scatter => "scatter",
            ChartKind::Histogram => "histogram",
            ChartKind::Box => "box",
            ChartKind::Treemap => "treemap",
            ChartKind::Map => "map",
            ChartKind::Funnel => "funnel",
            ChartKind::Heatmap => "heatmap",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

const BOX_COLUMNS: [&str; 6] = ["min", "q1", "median", "q3", "max", "mean"];

/// Column bindings for one chart.
///
/// Which fields a kind reads:
/// - bar / line / scatter / histogram: `x`, `y` (one trace per series),
///   `secondary` (right-hand axis, drawn as `secondary_kind` when set),
///   `color` (text column splits traces, numeric column shades markers),
///   `size`, `names` and `hover` (hover text)
/// - pie: `names` for slice labels, first `y` for values
/// - treemap: `x` node ids, `names` labels, `parent`, first `y` values
/// - map: `x` longitude, first `y` latitude, `size`, `color`, `names`, `hover`
/// - funnel: `x` stage labels, first `y` values
/// - heatmap: `x` row label column, `y` value columns (all others if empty)
/// - box: `names` per-box label, stat columns fixed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    pub kind: ChartKind,
    pub x: Option<String>,
    pub y: Vec<String>,
    pub secondary: Vec<String>,
    pub secondary_kind: Option<ChartKind>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub names: Option<String>,
    pub hover: Vec<String>,
    pub parent: Option<String>,
    pub orientation: Orientation,
    pub text_labels: bool,
    pub diagonal: bool,
    pub color_scale: Option<String>,
    pub x_title: Option<String>,
    pub y_title: Option<String>,
    pub y2_title: Option<String>,
}

impl Encoding {
    pub fn new(kind: ChartKind) -> Self {
        Self {
            kind,
            x: None,
            y: Vec::new(),
            secondary: Vec::new(),
            secondary_kind: None,
            color: None,
            size: None,
            names: None,
            hover: Vec::new(),
            parent: None,
            orientation: Orientation::Vertical,
            text_labels: false,
            diagonal: false,
            color_scale: None,
            x_title: None,
            y_title: None,
            y2_title: None,
        }
    }

    pub fn x(mut self, column: &str) -> Self {
        self.x = Some(column.to_string());
        self
    }

    pub fn y(mut self, column: &str) -> Self {
        self.y.push(column.to_string());
        self
    }

    pub fn secondary(mut self, column: &str) -> Self {
        self.secondary.push(column.to_string());
        self
    }

    /// Draw the secondary-axis series as `kind` instead of the chart kind.
    /// Only `Bar` changes anything on a line chart.
    pub fn secondary_kind(mut self, kind: ChartKind) -> Self {
        self.secondary_kind = Some(kind);
        self
    }

    pub fn color(mut self, column: &str) -> Self {
        self.color = Some(column.to_string());
        self
    }

    pub fn size(mut self, column: &str) -> Self {
        self.size = Some(column.to_string());
        self
    }

    pub fn names(mut self, column: &str) -> Self {
        self.names = Some(column.to_string());
        self
    }

    /// Extra `column: value` line in the hover text.
    pub fn hover(mut self, column: &str) -> Self {
        self.hover.push(column.to_string());
        self
    }

    pub fn parent(mut self, column: &str) -> Self {
        self.parent = Some(column.to_string());
        self
    }

    pub fn horizontal(mut self) -> Self {
        self.orientation = Orientation::Horizontal;
        self
    }

    pub fn text_labels(mut self) -> Self {
        self.text_labels = true;
        self
    }

    pub fn diagonal(mut self) -> Self {
        self.diagonal = true;
        self
    }

    pub fn scale(mut self, name: &str) -> Self {
        self.color_scale = Some(name.to_string());
        self
    }

    pub fn titles(mut self, x: &str, y: &str) -> Self {
        self.x_title = Some(x.to_string());
        self.y_title = Some(y.to_string());
        self
    }

    pub fn y2_title(mut self, title: &str) -> Self {
        self.y2_title = Some(title.to_string());
        self
    }

    /// Every column this encoding reads, bound or implied by the kind.
    fn bound_columns(&self) -> Vec<&str> {
        let mut cols: Vec<&str> = Vec::new();
        cols.extend(self.x.as_deref());
        cols.extend(self.y.iter().map(String::as_str));
        cols.extend(self.secondary.iter().map(String::as_str));
        cols.extend(self.color.as_deref());
        cols.extend(self.size.as_deref());
        cols.extend(self.names.as_deref());
        cols.extend(self.hover.iter().map(String::as_str));
        cols.extend(self.parent.as_deref());
        if self.kind == ChartKind::Box {
            cols.extend(BOX_COLUMNS);
        }
        cols
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub title: String,
    pub kind: ChartKind,
    /// `None` when there is nothing to draw: no rows, or a bad binding.
    pub figure: Option<Value>,
    pub warnings: Vec<String>,
}

impl Chart {
    pub fn no_data(title: &str, kind: ChartKind) -> Self {
        Self {
            title: title.to_string(),
            kind,
            figure: None,
            warnings: Vec::new(),
        }
    }

    /// Empty input, as opposed to a binding error.
    pub fn is_no_data(&self) -> bool {
        self.figure.is_none() && self.warnings.is_empty()
    }
}

pub fn build(title: &str, frame: &Frame, enc: &Encoding) -> Chart {
    let warnings: Vec<String> = enc
        .bound_columns()
        .into_iter()
        .filter(|c| !frame.has_column(c))
        .map(|c| format!("column `{}` is not in the chart data", c))
        .collect();
    if !warnings.is_empty() {
        for w in &warnings {
            log(
                Level::Warn,
                Domain::Render,
                "chart_binding",
                obj(&[("chart", v_str(title)), ("msg", v_str(w))]),
            );
        }
        return Chart {
            title: title.to_string(),
            kind: enc.kind,
            figure: None,
            warnings,
        };
    }
    if frame.is_empty() {
        return Chart::no_data(title, enc.kind);
    }

    let mut data = match enc.kind {
        ChartKind::Bar => xy_traces(frame, enc, "bar", None),
        ChartKind::Line => xy_traces(frame, enc, "scatter", Some("lines+markers")),
        ChartKind::Scatter => xy_traces(frame, enc, "scatter", Some("markers")),
        ChartKind::Histogram => vec![histogram_trace(frame, enc)],
        ChartKind::Box => vec![box_trace(frame, enc, title)],
        ChartKind::Pie => vec![pie_trace(frame, enc)],
        ChartKind::Treemap => vec![treemap_trace(frame, enc)],
        ChartKind::Map => vec![map_trace(frame, enc)],
        ChartKind::Funnel => vec![funnel_trace(frame, enc)],
        ChartKind::Heatmap => vec![heatmap_trace(frame, enc)],
    };
    if enc.diagonal {
        data.push(json!({
            "type": "scatter",
            "mode": "lines",
            "x": [0.0, 1.0],
            "y": [0.0, 1.0],
            "name": "Random",
            "line": {"dash": "dash", "color": "gray"},
        }));
    }

    Chart {
        title: title.to_string(),
        kind: enc.kind,
        figure: Some(json!({"data": data, "layout": layout(title, enc)})),
        warnings: Vec::new(),
    }
}

// =============================================================================
// Column access
// =============================================================================

fn cell_value(cell: &Cell) -> Value {
    match cell {
        Cell::Text(s) => json!(s),
        Cell::Num(v) => json!(v),
        Cell::Missing => Value::Null,
    }
}

fn series(frame: &Frame, column: &str) -> Vec<Value> {
    match frame.column_index(column) {
        Some(idx) => frame.rows().iter().map(|r| cell_value(&r[idx])).collect(),
        None => Vec::new(),
    }
}

fn first_y(enc: &Encoding) -> &str {
    enc.y.first().map(String::as_str).unwrap_or_default()
}

fn is_numeric(frame: &Frame, column: &str) -> bool {
    match frame.column_index(column) {
        Some(idx) => frame.rows().iter().all(|r| !matches!(r[idx], Cell::Text(_))),
        None => false,
    }
}

/// Row indices per distinct value of a text column, first-seen order.
fn groups(frame: &Frame, column: &str) -> Vec<(String, Vec<usize>)> {
    let mut out: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, key) in frame.texts(column).into_iter().enumerate() {
        match out.iter_mut().find(|(k, _)| *k == key) {
            Some((_, rows)) => rows.push(i),
            None => out.push((key, vec![i])),
        }
    }
    out
}

fn pick(values: &[Value], rows: &[usize]) -> Vec<Value> {
    rows.iter().map(|&i| values[i].clone()).collect()
}

/// Per-row hover text: the `names` value, then one `column: value` line per
/// `hover` column. `None` when neither is bound.
fn hover_text(frame: &Frame, enc: &Encoding) -> Option<Vec<Value>> {
    if enc.names.is_none() && enc.hover.is_empty() {
        return None;
    }
    let names = enc.names.as_deref().map(|c| frame.texts(c));
    let extra: Vec<(&str, Vec<String>)> = enc
        .hover
        .iter()
        .map(|c| (c.as_str(), frame.texts(c)))
        .collect();
    let lines = (0..frame.len())
        .map(|i| {
            let mut parts: Vec<String> = names.iter().map(|n| n[i].clone()).collect();
            parts.extend(extra.iter().map(|(c, values)| format!("{}: {}", c, values[i])));
            json!(parts.join("<br>"))
        })
        .collect();
    Some(lines)
}

/// Plotly `sizeref` for area-scaled markers: the largest value maps to a
/// marker roughly `max_px` across.
fn size_ref(frame: &Frame, column: &str, max_px: f64) -> f64 {
    let max = frame
        .numbers(column)
        .into_iter()
        .flatten()
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        2.0 * max / (max_px * max_px)
    } else {
        1.0
    }
}

fn scale_name(enc: &Encoding, fallback: &str) -> String {
    enc.color_scale.clone().unwrap_or_else(|| fallback.to_string())
}

// =============================================================================
// Traces
// =============================================================================

fn trace(kind: &str) -> Map<String, Value> {
    let mut t = Map::new();
    t.insert("type".to_string(), json!(kind));
    t
}

fn xy_traces(frame: &Frame, enc: &Encoding, kind: &str, mode: Option<&str>) -> Vec<Value> {
    let xs = series(frame, enc.x.as_deref().unwrap_or_default());
    let split = enc.color.as_deref().filter(|c| !is_numeric(frame, c));
    let shade = enc.color.as_deref().filter(|c| is_numeric(frame, c));
    let hover = hover_text(frame, enc);
    let sizes = enc.size.as_deref().map(|c| (series(frame, c), size_ref(frame, c, 40.0)));

    let bound = enc
        .y
        .iter()
        .map(|c| (c, false))
        .chain(enc.secondary.iter().map(|c| (c, true)));
    let mut traces = Vec::new();
    for (column, secondary) in bound {
        let ys = series(frame, column);
        let subsets: Vec<(String, Vec<usize>)> = match split {
            Some(c) => groups(frame, c),
            None => vec![(column.clone(), (0..frame.len()).collect())],
        };
        let as_bar = secondary && enc.secondary_kind == Some(ChartKind::Bar);
        for (name, rows) in subsets {
            let mut t = trace(if as_bar { "bar" } else { kind });
            if as_bar {
                t.insert("opacity".to_string(), json!(0.6));
            } else if let Some(m) = mode {
                t.insert("mode".to_string(), json!(m));
            }
            t.insert("name".to_string(), json!(name));
            let (x, y) = (pick(&xs, &rows), pick(&ys, &rows));
            if enc.text_labels {
                t.insert("text".to_string(), json!(y.clone()));
                t.insert("textposition".to_string(), json!("auto"));
            }
            if enc.orientation == Orientation::Horizontal {
                t.insert("x".to_string(), json!(y));
                t.insert("y".to_string(), json!(x));
                t.insert("orientation".to_string(), json!("h"));
            } else {
                t.insert("x".to_string(), json!(x));
                t.insert("y".to_string(), json!(y));
            }
            if secondary {
                t.insert("yaxis".to_string(), json!("y2"));
            }
            if let Some(h) = &hover {
                t.insert("hovertext".to_string(), json!(pick(h, &rows)));
            }

            let mut marker = Map::new();
            if let Some(c) = shade {
                marker.insert("color".to_string(), json!(pick(&series(frame, c), &rows)));
                marker.insert("colorscale".to_string(), json!(scale_name(enc, "Blues")));
            }
            if let Some((values, sref)) = &sizes {
                marker.insert("size".to_string(), json!(pick(values, &rows)));
                marker.insert("sizemode".to_string(), json!("area"));
                marker.insert("sizeref".to_string(), json!(sref));
            }
            if !marker.is_empty() {
                t.insert("marker".to_string(), Value::Object(marker));
            }
            traces.push(Value::Object(t));
        }
    }
    traces
}

fn histogram_trace(frame: &Frame, enc: &Encoding) -> Value {
    let mut t = trace("bar");
    t.insert("x".to_string(), json!(series(frame, enc.x.as_deref().unwrap_or_default())));
    t.insert("y".to_string(), json!(series(frame, first_y(enc))));
    t.insert("name".to_string(), json!(first_y(enc)));
    if frame.has_column("bin_start") && frame.has_column("bin_end") {
        let widths: Vec<Value> = frame
            .numbers("bin_start")
            .into_iter()
            .zip(frame.numbers("bin_end"))
            .map(|(s, e)| match (s, e) {
                (Some(s), Some(e)) => json!(e - s),
                _ => Value::Null,
            })
            .collect();
        t.insert("width".to_string(), json!(widths));
    }
    t.insert("marker".to_string(), json!({"line": {"width": 1, "color": "white"}}));
    Value::Object(t)
}

fn box_trace(frame: &Frame, enc: &Encoding, title: &str) -> Value {
    let mut t = trace("box");
    let names = match enc.names.as_deref() {
        Some(c) => series(frame, c),
        None => vec![json!(title); frame.len()],
    };
    t.insert("x".to_string(), json!(names));
    t.insert("q1".to_string(), json!(series(frame, "q1")));
    t.insert("median".to_string(), json!(series(frame, "median")));
    t.insert("q3".to_string(), json!(series(frame, "q3")));
    t.insert("lowerfence".to_string(), json!(series(frame, "min")));
    t.insert("upperfence".to_string(), json!(series(frame, "max")));
    t.insert("mean".to_string(), json!(series(frame, "mean")));
    t.insert("boxpoints".to_string(), json!(false));
    Value::Object(t)
}

fn pie_trace(frame: &Frame, enc: &Encoding) -> Value {
    json!({
        "type": "pie",
        "labels": series(frame, enc.names.as_deref().unwrap_or_default()),
        "values": series(frame, first_y(enc)),
        "sort": false,
        "textinfo": "percent+label",
    })
}

fn treemap_trace(frame: &Frame, enc: &Encoding) -> Value {
    let labels = series(frame, enc.names.as_deref().unwrap_or_default());
    let ids = match enc.x.as_deref() {
        Some(c) => series(frame, c),
        None => labels.clone(),
    };
    json!({
        "type": "treemap",
        "ids": ids,
        "labels": labels,
        "parents": series(frame, enc.parent.as_deref().unwrap_or_default()),
        "values": series(frame, first_y(enc)),
        "branchvalues": "total",
        "marker": {"colorscale": scale_name(enc, "Blues")},
    })
}

fn map_trace(frame: &Frame, enc: &Encoding) -> Value {
    let mut marker = Map::new();
    if let Some(c) = enc.size.as_deref() {
        marker.insert("size".to_string(), json!(series(frame, c)));
        marker.insert("sizemode".to_string(), json!("area"));
        marker.insert("sizeref".to_string(), json!(size_ref(frame, c, 50.0)));
    }
    if let Some(c) = enc.color.as_deref() {
        marker.insert("color".to_string(), json!(series(frame, c)));
        marker.insert("colorscale".to_string(), json!(scale_name(enc, "Viridis")));
        marker.insert("showscale".to_string(), json!(true));
    }
    json!({
        "type": "scattergeo",
        "mode": "markers",
        "lon": series(frame, enc.x.as_deref().unwrap_or_default()),
        "lat": series(frame, first_y(enc)),
        "text": hover_text(frame, enc).unwrap_or_default(),
        "marker": marker,
    })
}

fn funnel_trace(frame: &Frame, enc: &Encoding) -> Value {
    json!({
        "type": "funnel",
        "y": series(frame, enc.x.as_deref().unwrap_or_default()),
        "x": series(frame, first_y(enc)),
        "textinfo": "value+percent initial",
    })
}

fn heatmap_trace(frame: &Frame, enc: &Encoding) -> Value {
    let label = enc.x.as_deref().unwrap_or_default();
    let value_cols: Vec<&str> = if enc.y.is_empty() {
        frame
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|c| *c != label)
            .collect()
    } else {
        enc.y.iter().map(String::as_str).collect()
    };
    let idx: Vec<usize> = value_cols.iter().filter_map(|c| frame.column_index(c)).collect();
    let z: Vec<Vec<Value>> = frame
        .rows()
        .iter()
        .map(|r| idx.iter().map(|&i| cell_value(&r[i])).collect())
        .collect();
    let mut t = trace("heatmap");
    t.insert("z".to_string(), json!(z));
    t.insert("x".to_string(), json!(value_cols));
    t.insert("y".to_string(), json!(series(frame, label)));
    t.insert("colorscale".to_string(), json!(scale_name(enc, "Blues")));
    if enc.text_labels {
        t.insert("texttemplate".to_string(), json!("%{z:.2~f}"));
    }
    Value::Object(t)
}

// =============================================================================
// Layout
// =============================================================================

fn layout(title: &str, enc: &Encoding) -> Value {
    let mut l = Map::new();
    l.insert("title".to_string(), json!({"text": title}));
    l.insert("margin".to_string(), json!({"l": 50, "r": 30, "t": 50, "b": 50}));
    l.insert("hovermode".to_string(), json!("closest"));

    let x_title = enc.x_title.clone().or_else(|| enc.x.clone());
    let y_title = enc.y_title.clone().or_else(|| enc.y.first().cloned());
    let (x_title, y_title) = if enc.orientation == Orientation::Horizontal {
        (y_title, x_title)
    } else {
        (x_title, y_title)
    };

    match enc.kind {
        ChartKind::Pie | ChartKind::Treemap | ChartKind::Funnel => {}
        ChartKind::Map => {
            l.insert(
                "geo".to_string(),
                json!({
                    "scope": "asia",
                    "fitbounds": "locations",
                    "showland": true,
                    "landcolor": "rgb(240, 240, 240)",
                    "showcountries": true,
                }),
            );
        }
        _ => {
            l.insert("xaxis".to_string(), json!({"title": {"text": x_title}}));
            l.insert("yaxis".to_string(), json!({"title": {"text": y_title}}));
        }
    }
    if !enc.secondary.is_empty() {
        let y2 = enc.y2_title.clone().or_else(|| enc.secondary.first().cloned());
        l.insert(
            "yaxis2".to_string(),
            json!({"title": {"text": y2}, "overlaying": "y", "side": "right"}),
        );
    }
    if enc.kind == ChartKind::Bar && enc.y.len() + enc.secondary.len() > 1 {
        l.insert("barmode".to_string(), json!("group"));
    }
    if enc.kind == ChartKind::Histogram {
        l.insert("bargap".to_string(), json!(0.0));
    }
    if enc.diagonal {
        l.insert("xaxis".to_string(), json!({"title": {"text": x_title}, "range": [0.0, 1.0]}));
        l.insert("yaxis".to_string(), json!({"title": {"text": y_title}, "range": [0.0, 1.05]}));
    }
    Value::Object(l)
}
