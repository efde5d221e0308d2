use super::histogram;
use crate::data::{FeatureImportanceRecord, LeadRecord, LearningCurveRecord};
use crate::frame::{Cell, Frame, Order};

pub fn feature_importance(features: &[FeatureImportanceRecord]) -> Frame {
    let mut f = Frame::new(&["feature", "importance"]);
    for r in features {
        f.push_row(vec![Cell::Text(r.feature.clone()), Cell::from(r.importance)]);
    }
    f.sort_by("importance", Order::Ascending)
}

pub fn learning_curve(points: &[LearningCurveRecord]) -> Frame {
    let mut f = Frame::new(&["data_size", "training_score", "validation_score"]);
    for p in points {
        f.push_row(vec![
            Cell::from(p.data_size),
            Cell::from(p.training_score),
            Cell::from(p.validation_score),
        ]);
    }
    f
}

pub fn probability_histogram(leads: &[LeadRecord], bins: usize) -> Frame {
    let probs: Vec<f64> = leads.iter().map(|l| l.predicted_probability).collect();
    histogram(&probs, bins)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_importance_ascending() {
        let rows = vec![
            FeatureImportanceRecord { feature: "pages_visited".into(), importance: 0.3 },
            FeatureImportanceRecord { feature: "email_opens".into(), importance: 0.1 },
        ];
        let f = feature_importance(&rows);
        assert_eq!(f.texts("feature"), vec!["email_opens", "pages_visited"]);
    }

    #[test]
    fn test_probability_histogram_total() {
        let leads: Vec<LeadRecord> = [0.1, 0.4, 0.4, 0.9]
            .iter()
            .map(|p| LeadRecord {
                actual_converted: *p > 0.5,
                predicted_class: *p > 0.5,
                predicted_probability: *p,
            })
            .collect();
        let h = probability_histogram(&leads, 4);
        let total: f64 = h.numbers("count").into_iter().flatten().sum();
        assert_eq!(total, 4.0);
    }
}
