//! Binary classifier evaluation for the lead-scoring model.
//!
//! Every ratio metric is `None` ("undefined") when its denominator is zero.
//! ROC points are emitted per distinct score threshold, highest first, with
//! ties broken by a stable sort so identical input yields identical output.

use serde::Serialize;
use serde_json::json;

use crate::aggregate::ratio;
use crate::data::LeadRecord;
use crate::frame::{Cell, Frame};
use crate::logging::{log, obj, Domain, Level};

pub const NEGATIVE_LABEL: &str = "No Conversion";
pub const POSITIVE_LABEL: &str = "Conversion";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
    pub true_positive: usize,
}

impl ConfusionMatrix {
    pub fn from_pairs<I: IntoIterator<Item = (bool, bool)>>(pairs: I) -> Self {
        let mut m = Self::default();
        for (actual, predicted) in pairs {
            match (actual, predicted) {
                (false, false) => m.true_negative += 1,
                (false, true) => m.false_positive += 1,
                (true, false) => m.false_negative += 1,
                (true, true) => m.true_positive += 1,
            }
        }
        m
    }

    pub fn from_leads(leads: &[LeadRecord]) -> Self {
        Self::from_pairs(leads.iter().map(|l| (l.actual_converted, l.predicted_class)))
    }

    pub fn total(&self) -> usize {
        self.true_negative + self.false_positive + self.false_negative + self.true_positive
    }

    pub fn accuracy(&self) -> Option<f64> {
        ratio((self.true_positive + self.true_negative) as f64, self.total() as f64)
    }

    pub fn precision(&self) -> Option<f64> {
        ratio(
            self.true_positive as f64,
            (self.true_positive + self.false_positive) as f64,
        )
    }

    pub fn recall(&self) -> Option<f64> {
        ratio(
            self.true_positive as f64,
            (self.true_positive + self.false_negative) as f64,
        )
    }

    /// Undefined when precision or recall is undefined, or both are zero.
    pub fn f1(&self) -> Option<f64> {
        let p = self.precision()?;
        let r = self.recall()?;
        ratio(2.0 * p * r, p + r)
    }

    pub fn metrics(&self) -> ClassifierMetrics {
        ClassifierMetrics {
            accuracy: self.accuracy(),
            precision: self.precision(),
            recall: self.recall(),
            f1: self.f1(),
        }
    }

    /// 2x2 grid, rows = actual, columns = predicted.
    pub fn to_frame(&self) -> Frame {
        let mut f = Frame::new(&["actual", NEGATIVE_LABEL, POSITIVE_LABEL]);
        f.push_row(vec![
            Cell::from(NEGATIVE_LABEL),
            Cell::Num(self.true_negative as f64),
            Cell::Num(self.false_positive as f64),
        ]);
        f.push_row(vec![
            Cell::from(POSITIVE_LABEL),
            Cell::Num(self.false_negative as f64),
            Cell::Num(self.true_positive as f64),
        ]);
        f
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassifierMetrics {
    pub accuracy: Option<f64>,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RocPoint {
    /// `None` for the (0,0) origin, which sits above every score.
    pub threshold: Option<f64>,
    pub fpr: f64,
    pub tpr: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RocCurve {
    pub points: Vec<RocPoint>,
    /// `None` when the labels contain no positives or no negatives.
    pub auc: Option<f64>,
    pub positives: usize,
    pub negatives: usize,
}

impl RocCurve {
    pub fn to_frame(&self) -> Frame {
        let mut f = Frame::new(&["fpr", "tpr", "threshold"]);
        for p in &self.points {
            f.push_row(vec![Cell::Num(p.fpr), Cell::Num(p.tpr), p.threshold.into()]);
        }
        f
    }
}

/// ROC curve over `(actual, score)` pairs. A row counts as predicted
/// positive at threshold `t` when its score is `>= t`. Non-finite scores are
/// ignored.
pub fn roc_curve(pairs: &[(bool, f64)]) -> RocCurve {
    let mut scored: Vec<(f64, bool)> = pairs
        .iter()
        .filter(|(_, s)| s.is_finite())
        .map(|&(a, s)| (s, a))
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    let positives = scored.iter().filter(|(_, a)| *a).count();
    let negatives = scored.len() - positives;
    let rate = |n: usize, of: usize| ratio(n as f64, of as f64).unwrap_or(0.0);

    let mut points = vec![RocPoint {
        threshold: None,
        fpr: 0.0,
        tpr: 0.0,
    }];
    let (mut tp, mut fp) = (0usize, 0usize);
    let mut i = 0;
    while i < scored.len() {
        let threshold = scored[i].0;
        while i < scored.len() && scored[i].0 == threshold {
            if scored[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push(RocPoint {
            threshold: Some(threshold),
            fpr: rate(fp, negatives),
            tpr: rate(tp, positives),
        });
    }

    let auc = if positives > 0 && negatives > 0 {
        Some(trapezoid_auc(&points))
    } else {
        None
    };
    RocCurve {
        points,
        auc,
        positives,
        negatives,
    }
}

pub fn trapezoid_auc(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[0].tpr + w[1].tpr) / 2.0)
        .sum()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Evaluation {
    pub confusion: ConfusionMatrix,
    pub metrics: ClassifierMetrics,
    pub roc: RocCurve,
    /// Probabilities outside [0, 1] or not finite.
    pub malformed_probabilities: usize,
}

pub fn evaluate(leads: &[LeadRecord]) -> Evaluation {
    let confusion = ConfusionMatrix::from_leads(leads);
    let pairs: Vec<(bool, f64)> = leads
        .iter()
        .map(|l| (l.actual_converted, l.predicted_probability))
        .collect();
    let roc = roc_curve(&pairs);
    let malformed_probabilities = leads
        .iter()
        .filter(|l| !(0.0..=1.0).contains(&l.predicted_probability))
        .count();

    let metrics = confusion.metrics();
    log(
        Level::Debug,
        Domain::Eval,
        "evaluated",
        obj(&[
            ("leads", json!(leads.len())),
            ("confusion", json!(confusion)),
            ("metrics", json!(metrics)),
            ("auc", json!(roc.auc)),
            ("malformed_probabilities", json!(malformed_probabilities)),
        ]),
    );

    Evaluation {
        confusion,
        metrics,
        roc,
        malformed_probabilities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leads(actual: &[u8], predicted: &[u8], probs: &[f64]) -> Vec<LeadRecord> {
        actual
            .iter()
            .zip(predicted)
            .zip(probs)
            .map(|((a, p), s)| LeadRecord {
                actual_converted: *a == 1,
                predicted_class: *p == 1,
                predicted_probability: *s,
            })
            .collect()
    }

    #[test]
    fn test_four_lead_scenario() {
        let rows = leads(&[1, 0, 1, 0], &[1, 0, 0, 0], &[0.9, 0.2, 0.4, 0.3]);
        let ev = evaluate(&rows);
        assert_eq!(
            ev.confusion,
            ConfusionMatrix {
                true_negative: 2,
                false_positive: 0,
                false_negative: 1,
                true_positive: 1,
            }
        );
        assert_eq!(ev.metrics.accuracy, Some(0.75));
        assert_eq!(ev.metrics.precision, Some(1.0));
        assert_eq!(ev.metrics.recall, Some(0.5));
        assert!((ev.metrics.f1.unwrap() - 0.667).abs() < 1e-3);
    }

    #[test]
    fn test_counts_cover_every_lead() {
        let rows = leads(&[1, 1, 0, 0, 1], &[0, 1, 1, 0, 1], &[0.1, 0.8, 0.7, 0.2, 0.6]);
        assert_eq!(ConfusionMatrix::from_leads(&rows).total(), rows.len());
    }

    #[test]
    fn test_no_positive_predictions_leaves_precision_undefined() {
        let rows = leads(&[1, 0, 1], &[0, 0, 0], &[0.3, 0.2, 0.1]);
        let m = ConfusionMatrix::from_leads(&rows).metrics();
        assert_eq!(m.precision, None);
        assert_eq!(m.f1, None);
        assert_eq!(m.recall, Some(0.0));
        assert!((m.accuracy.unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_is_undefined_everywhere() {
        let ev = evaluate(&[]);
        assert_eq!(ev.confusion.total(), 0);
        assert_eq!(ev.metrics, ClassifierMetrics::default());
        assert_eq!(ev.roc.auc, None);
        assert_eq!(ev.roc.points.len(), 1);
    }

    #[test]
    fn test_roc_perfect_separation() {
        let curve = roc_curve(&[(true, 0.9), (false, 0.2), (true, 0.4), (false, 0.3)]);
        let coords: Vec<(f64, f64)> = curve.points.iter().map(|p| (p.fpr, p.tpr)).collect();
        assert_eq!(coords, vec![(0.0, 0.0), (0.0, 0.5), (0.0, 1.0), (0.5, 1.0), (1.0, 1.0)]);
        assert_eq!(curve.auc, Some(1.0));
    }

    #[test]
    fn test_roc_ties_share_one_point() {
        let curve = roc_curve(&[(true, 0.5), (false, 0.5)]);
        assert_eq!(curve.points.len(), 2);
        assert_eq!(curve.points[1].threshold, Some(0.5));
        assert_eq!(curve.auc, Some(0.5));
    }

    #[test]
    fn test_roc_monotone_and_bounded() {
        let pairs: Vec<(bool, f64)> = (0..50)
            .map(|i| (i % 3 == 0, ((i * 37) % 101) as f64 / 100.0))
            .collect();
        let curve = roc_curve(&pairs);
        for w in curve.points.windows(2) {
            assert!(w[1].fpr >= w[0].fpr);
            assert!(w[1].tpr >= w[0].tpr);
        }
        let last = curve.points.last().unwrap();
        assert_eq!((last.fpr, last.tpr), (1.0, 1.0));
        let auc = curve.auc.unwrap();
        assert!((0.0..=1.0).contains(&auc));
    }

    #[test]
    fn test_roc_is_reproducible() {
        let pairs = vec![(true, 0.7), (false, 0.7), (true, 0.1), (false, 0.95)];
        let a = serde_json::to_string(&roc_curve(&pairs)).unwrap();
        let b = serde_json::to_string(&roc_curve(&pairs)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_malformed_probabilities_counted() {
        let rows = leads(&[1, 0], &[1, 0], &[1.2, -0.1]);
        assert_eq!(evaluate(&rows).malformed_probabilities, 2);
    }

    #[test]
    fn test_confusion_frame_layout() {
        let m = ConfusionMatrix {
            true_negative: 5,
            false_positive: 1,
            false_negative: 2,
            true_positive: 3,
        };
        let f = m.to_frame();
        assert_eq!(f.cell(0, POSITIVE_LABEL), Some(&Cell::Num(1.0)));
        assert_eq!(f.cell(1, NEGATIVE_LABEL), Some(&Cell::Num(2.0)));
    }
}
