//! Row types for the input CSV files. Column names match the file headers;
//! extra columns are ignored.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CampaignRecord {
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    pub channel: String,
    pub campaign_type: String,
    pub region: String,
    pub spend: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub roas: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerRecord {
    pub customer_segment: String,
    pub age: f64,
    pub income: f64,
    pub lifetime_value: f64,
    pub purchase_frequency: f64,
    pub satisfaction_score: f64,
    pub nps_category: String,
    pub churn_risk: String,
    pub support_tickets: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRecord {
    pub category: String,
    pub subcategory: String,
    pub product_name: String,
    pub quarter: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LeadRecord {
    #[serde(deserialize_with = "de_flag")]
    pub actual_converted: bool,
    #[serde(deserialize_with = "de_flag")]
    pub predicted_class: bool,
    pub predicted_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureImportanceRecord {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LearningCurveRecord {
    pub data_size: f64,
    pub training_score: f64,
    pub validation_score: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeographicRecord {
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
    pub store_count: f64,
    pub revenue: f64,
    pub satisfaction_score: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AttributionRecord {
    pub channel: String,
    pub first_touch: f64,
    pub last_touch: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FunnelRecord {
    pub stage: String,
    pub visitors: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JourneyRecord {
    pub path: String,
}

/// Square matrix keyed by the first CSV column. Cells that do not parse as
/// numbers are kept as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<Option<f64>>)>,
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "t" => Some(true),
        "0" | "false" | "no" | "n" | "f" => Some(false),
        other => match other.parse::<f64>() {
            Ok(v) if v == 1.0 => Some(true),
            Ok(v) if v == 0.0 => Some(false),
            _ => None,
        },
    }
}

fn de_date<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(d)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad date: {:?}", raw)))
}

fn de_flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(d)?;
    parse_flag(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad flag: {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_variants() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(parse_date("2024-03-09"), Some(d));
        assert_eq!(parse_date("2024-03-09 00:00:00"), Some(d));
        assert_eq!(parse_date(" 2024-03-09T12:30:00 "), Some(d));
        assert_eq!(parse_date("09/03/2024"), None);
    }

    #[test]
    fn test_parse_flag_variants() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("0.0"), Some(false));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_lead_record_from_csv() {
        let data = "actual_converted,predicted_class,predicted_probability,lead_id\n1,False,0.42,7\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let rows: Vec<LeadRecord> = rdr.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(
            rows,
            vec![LeadRecord {
                actual_converted: true,
                predicted_class: false,
                predicted_probability: 0.42,
            }]
        );
    }
}
