use super::{counts_frame, percent, value_counts};
use crate::data::{AttributionRecord, FunnelRecord, JourneyRecord};
use crate::frame::{Cell, Frame, Order};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    First,
    Last,
}

impl Touch {
    pub fn column(&self) -> &'static str {
        match self {
            Touch::First => "first_touch",
            Touch::Last => "last_touch",
        }
    }
}

/// Conversions credited to each channel under one model, ascending.
pub fn touch_credit(attribution: &[AttributionRecord], model: Touch) -> Frame {
    let mut f = Frame::new(&["channel", model.column()]);
    for a in attribution {
        let v = match model {
            Touch::First => a.first_touch,
            Touch::Last => a.last_touch,
        };
        f.push_row(vec![Cell::Text(a.channel.clone()), Cell::from(v)]);
    }
    f.sort_by(model.column(), Order::Ascending)
}

/// Funnel stages in file order with stage-to-stage and cumulative
/// conversion percentages. The first stage converts 100% of itself.
pub fn funnel(stages: &[FunnelRecord]) -> Frame {
    let mut f = Frame::new(&["stage", "visitors", "step_conversion_pct", "overall_conversion_pct"]);
    let top = stages.first().map(|s| s.visitors);
    let mut prev: Option<f64> = None;
    for s in stages {
        let step = match prev {
            None => percent(s.visitors, s.visitors),
            Some(p) => percent(s.visitors, p),
        };
        let overall = top.and_then(|t| percent(s.visitors, t));
        f.push_row(vec![
            Cell::Text(s.stage.clone()),
            Cell::from(s.visitors),
            step.into(),
            overall.into(),
        ]);
        prev = Some(s.visitors);
    }
    f
}

/// Most frequent journey paths, descending by count.
pub fn top_journeys(journeys: &[JourneyRecord], n: usize) -> Frame {
    counts_frame("path", value_counts(journeys, |j| j.path.as_str())).head(n)
}
