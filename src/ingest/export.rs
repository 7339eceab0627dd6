//! Serde view of the rowing machine's JSON export.
//!
//! Every field is optional. Machines and app versions disagree on which
//! fields they emit, so absence is decided by the parser, not by serde.
//! Scalars of an unexpected type read as `None` instead of failing the
//! whole document.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct ExportDocument {
    pub data: Option<ExportData>,
    pub hr: Option<Vec<HrPoint>>,
    #[serde(rename = "hrZones")]
    pub hr_zones: Option<Vec<HrZoneEntry>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportData {
    /// Numeric on some firmware, string on others.
    #[serde(rename = "cardioLogId")]
    pub cardio_log_id: Option<Value>,
    pub date: Option<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub target: Option<String>,
    pub analitics: Option<Analytics>,
    /// Summary entries such as `Duration` and `Distance`.
    pub data: Option<Vec<SummaryEntry>>,
    pub hr: Option<Vec<HrPoint>>,
    #[serde(rename = "hrZones")]
    pub hr_zones: Option<Vec<HrZoneEntry>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Analytics {
    pub descriptor: Option<Vec<DescriptorEntry>>,
    pub samples: Option<Vec<SampleEntry>>,
    pub hr: Option<Vec<HrPoint>>,
    #[serde(rename = "hrZones")]
    pub hr_zones: Option<Vec<HrZoneEntry>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DescriptorEntry {
    #[serde(default, deserialize_with = "lenient_index")]
    pub i: Option<usize>,
    pub pr: Option<DescriptorProperty>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DescriptorProperty {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub um: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SampleEntry {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub t: Option<f64>,
    /// Positional values; position `n` belongs to the descriptor with `i == n`.
    pub vs: Option<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SummaryEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub property: Option<String>,
    #[serde(rename = "rawValue")]
    pub raw_value: Option<Value>,
    #[serde(rename = "uM", default, deserialize_with = "lenient_string")]
    pub unit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HrPoint {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub t: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub hr: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HrZoneEntry {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub color: Option<String>,
    #[serde(rename = "lowerBound", default, deserialize_with = "lenient_f64")]
    pub lower_bound: Option<f64>,
    #[serde(rename = "upperBound", default, deserialize_with = "lenient_f64")]
    pub upper_bound: Option<f64>,
    #[serde(rename = "secondsInZone", default, deserialize_with = "lenient_f64")]
    pub seconds_in_zone: Option<f64>,
}

/// Numeric value of a JSON number or numeric string.
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_as_f64(&Value::deserialize(deserializer)?))
}

/// Descriptor positions are whole, non-negative numbers.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let index = value_as_f64(&Value::deserialize(deserializer)?)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= u32::MAX as f64)
        .map(|v| v as usize);
    Ok(index)
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };
    Ok(text)
}
