use crate::aggregate::model::{feature_importance, learning_curve, probability_histogram};
use crate::chart::{ChartKind, Encoding};
use crate::data::DataFile;
use crate::eval::{evaluate, NEGATIVE_LABEL, POSITIVE_LABEL};
use crate::nav::PageId;

use super::{fixed, Block, Kpi, Notice, Page, PageBuilder, PageContext, NA};

pub fn render(ctx: &PageContext) -> Page {
    let data = ctx.data;
    let mut b = PageBuilder::new(
        PageId::Model,
        "Lead Scoring Model - Performance Metrics & Analysis",
    );
    b.check_tables(
        &data.manifest,
        &[DataFile::Leads, DataFile::FeatureImportance, DataFile::LearningCurve],
    );

    let ev = evaluate(&data.leads);
    if ev.malformed_probabilities > 0 {
        b.notice(Notice::MalformedColumn {
            table: DataFile::Leads.file_name().to_string(),
            detail: format!(
                "{} predicted_probability value(s) outside [0, 1]",
                ev.malformed_probabilities
            ),
        });
    }

    let m = ev.metrics;
    let mut metrics = vec![Block::Metrics(vec![
        Kpi::new("Accuracy", fixed(m.accuracy, 3)),
        Kpi::new("Precision", fixed(m.precision, 3)),
        Kpi::new("Recall", fixed(m.recall, 3)),
        Kpi::new("F1-Score", fixed(m.f1, 3)),
    ])];
    if m.precision.is_none() && !data.leads.is_empty() {
        metrics.push(Block::Note(
            "Precision is undefined: the model predicted no conversions.".to_string(),
        ));
    }
    b.section("Model Performance Metrics", metrics);

    let confusion = b.chart(
        "Confusion Matrix",
        &ev.confusion.to_frame(),
        Encoding::new(ChartKind::Heatmap)
            .x("actual")
            .y(NEGATIVE_LABEL)
            .y(POSITIVE_LABEL)
            .scale("Blues")
            .text_labels()
            .titles("Predicted", "Actual"),
    );
    let auc = ev
        .roc
        .auc
        .map(|a| format!("{:.3}", a))
        .unwrap_or_else(|| NA.to_string());
    let roc = b.chart(
        &format!("ROC Curve (AUC = {})", auc),
        &ev.roc.to_frame(),
        Encoding::new(ChartKind::Line)
            .x("fpr")
            .y("tpr")
            .diagonal()
            .titles("False Positive Rate", "True Positive Rate"),
    );
    b.section(
        "Classifier Evaluation",
        vec![Block::Columns(vec![vec![confusion], vec![roc]])],
    );

    let importance = b.chart(
        "Feature Importance Scores",
        &feature_importance(&data.feature_importance),
        Encoding::new(ChartKind::Bar).x("feature").y("importance").horizontal(),
    );
    b.section("Feature Importance", vec![importance]);

    let curve = b.chart(
        "Model Performance vs Training Data Size",
        &learning_curve(&data.learning_curve),
        Encoding::new(ChartKind::Line)
            .x("data_size")
            .y("training_score")
            .y("validation_score")
            .titles("Data Size", "Score"),
    );
    b.section("Learning Curve", vec![curve]);

    let dist = b.chart(
        "Distribution of Predicted Probabilities",
        &probability_histogram(&data.leads, ctx.config.histogram_bins),
        Encoding::new(ChartKind::Histogram)
            .x("bin_mid")
            .y("count")
            .titles("Predicted Probability", "Number of Leads"),
    );
    b.section("Prediction Probability Distribution", vec![dist]);

    b.finish()
}
