use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::ingest::error::ImportError;
use crate::ingest::export::{
    value_as_f64, DescriptorEntry, ExportData, ExportDocument, HrPoint, HrZoneEntry, SampleEntry,
    SummaryEntry,
};
use crate::models::validation::parse_export_date;
use crate::models::workout::{normalize_notes, split_per_500m, NewWorkout};

const MILE_IN_METERS: f64 = 1609.34;

/// A metric descriptor as named in the export. Identity in storage is
/// (name, unit).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDescriptor {
    pub name: String,
    pub unit: Option<String>,
}

impl ParsedDescriptor {
    fn is(&self, name: &str, unit: &str) -> bool {
        self.name == name && self.unit.as_deref() == Some(unit)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSample {
    /// Position in `ParsedWorkout::descriptors`.
    pub descriptor: usize,
    pub time_offset_seconds: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHrSample {
    pub time_offset_seconds: i32,
    pub heart_rate_bpm: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedHrZone {
    pub zone_name: String,
    pub color_hex: Option<String>,
    pub lower_bound_bpm: Option<f64>,
    pub upper_bound_bpm: Option<f64>,
    pub seconds_in_zone: f64,
}

/// Everything derived from one export document, ready to store.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedWorkout {
    pub cardio_log_id: String,
    pub workout_name: Option<String>,
    pub workout_date: NaiveDate,
    pub target_description: Option<String>,
    pub duration_seconds: Option<f64>,
    pub total_distance_meters: Option<f64>,
    pub average_split_seconds_500m: Option<f64>,
    pub total_isoreps: Option<f64>,
    pub level: Option<f64>,
    pub descriptors: Vec<ParsedDescriptor>,
    pub samples: Vec<ParsedSample>,
    pub heart_rate_samples: Vec<ParsedHrSample>,
    pub hr_zones: Vec<ParsedHrZone>,
}

impl ParsedWorkout {
    pub fn into_new_workout(&self, equipment_type_id: i32, notes: Option<String>) -> NewWorkout {
        NewWorkout {
            cardio_log_id: self.cardio_log_id.clone(),
            equipment_type_id: Some(equipment_type_id),
            workout_name: self.workout_name.clone(),
            workout_date: self.workout_date,
            target_description: self.target_description.clone(),
            duration_seconds: self.duration_seconds,
            total_distance_meters: self.total_distance_meters,
            average_split_seconds_500m: self.average_split_seconds_500m,
            total_isoreps: self.total_isoreps,
            notes: normalize_notes(notes),
            level: self.level,
        }
    }
}

/// Accepts the export either as a JSON object or as a string holding one.
pub fn decode_submission(json_data: Option<Value>) -> Result<Value, ImportError> {
    match json_data {
        None | Some(Value::Null) => Err(ImportError::NoData),
        Some(Value::String(raw)) if raw.trim().is_empty() => Err(ImportError::NoData),
        Some(Value::String(raw)) => serde_json::from_str(&raw).map_err(ImportError::InvalidJson),
        Some(value) => Ok(value),
    }
}

/// Derives the workout row, its time series and heart-rate data from an
/// export document. Nothing here touches storage.
pub fn parse_export(document: &Value) -> Result<ParsedWorkout, ImportError> {
    let has_data = document
        .get("data")
        .and_then(Value::as_object)
        .is_some_and(|data| !data.is_empty());
    if !has_data {
        return Err(ImportError::MissingData);
    }

    let export: ExportDocument =
        serde_json::from_value(document.clone()).map_err(ImportError::Malformed)?;
    let data = export.data.as_ref().ok_or(ImportError::MissingData)?;

    let cardio_log_id = data
        .cardio_log_id
        .as_ref()
        .and_then(cardio_log_id_string)
        .ok_or(ImportError::MissingCardioLogId)?;

    let workout_date = match &data.date {
        Some(Value::String(raw)) => {
            parse_export_date(raw).ok_or_else(|| ImportError::InvalidDate(raw.clone()))?
        }
        other => {
            let shown = other.as_ref().map(Value::to_string).unwrap_or_else(|| "None".to_string());
            return Err(ImportError::InvalidDate(shown));
        }
    };

    let analytics = data.analitics.as_ref();
    let descriptor_entries = analytics
        .and_then(|a| a.descriptor.as_deref())
        .unwrap_or_default();
    let sample_entries = analytics
        .and_then(|a| a.samples.as_deref())
        .unwrap_or_default();
    let summary_entries = data.data.as_deref().unwrap_or_default();

    let (descriptors, mapping) = map_descriptors(descriptor_entries);
    let samples = collect_samples(sample_entries, &mapping);

    let total_isoreps = samples
        .iter()
        .rev()
        .find(|s| descriptors[s.descriptor].is("IsoReps", "Number"))
        .map(|s| s.value);

    let duration_seconds = summary_duration(summary_entries);
    let total_distance_meters = sample_distance(&descriptors, &mapping, &samples)
        .or_else(|| summary_distance(summary_entries));
    let average_split_seconds_500m = match (duration_seconds, total_distance_meters) {
        (Some(duration), Some(distance)) => split_per_500m(duration, distance),
        _ => None,
    };

    let level = duration_seconds.and_then(|duration| {
        let mut points = level_points(sample_entries, &descriptors, &mapping);
        time_weighted_level(&mut points, duration)
    });

    let heart_rate_samples = collect_hr_samples(
        export
            .hr
            .as_deref()
            .or(data.hr.as_deref())
            .or(analytics.and_then(|a| a.hr.as_deref()))
            .unwrap_or_default(),
    );
    let hr_zones = collect_hr_zones(
        export
            .hr_zones
            .as_deref()
            .or(data.hr_zones.as_deref())
            .or(analytics.and_then(|a| a.hr_zones.as_deref()))
            .unwrap_or_default(),
    );

    debug!(
        "Parsed export {}: {} descriptors, {} samples, {} HR samples, {} HR zones",
        cardio_log_id,
        descriptors.len(),
        samples.len(),
        heart_rate_samples.len(),
        hr_zones.len()
    );

    Ok(ParsedWorkout {
        cardio_log_id,
        workout_name: data.name.clone(),
        workout_date,
        target_description: data.target.clone(),
        duration_seconds,
        total_distance_meters,
        average_split_seconds_500m,
        total_isoreps,
        level,
        descriptors,
        samples,
        heart_rate_samples,
        hr_zones,
    })
}

fn cardio_log_id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns the named descriptors and the `(i, descriptor position)` map in
/// first-seen order of `i`. A repeated `i` points at the later descriptor.
fn map_descriptors(entries: &[DescriptorEntry]) -> (Vec<ParsedDescriptor>, Vec<(usize, usize)>) {
    let mut descriptors = Vec::new();
    let mut mapping: Vec<(usize, usize)> = Vec::new();

    for entry in entries {
        let property = entry.pr.as_ref();
        let Some(name) = property.and_then(|p| p.name.clone()) else {
            warn!("Skipping descriptor without a name: {:?}", entry);
            continue;
        };

        let position = descriptors.len();
        descriptors.push(ParsedDescriptor {
            name,
            unit: property.and_then(|p| p.um.clone()),
        });

        if let Some(i) = entry.i {
            match mapping.iter_mut().find(|(index, _)| *index == i) {
                Some(slot) => slot.1 = position,
                None => mapping.push((i, position)),
            }
        }
    }

    (descriptors, mapping)
}

fn lookup(mapping: &[(usize, usize)], index: usize) -> Option<usize> {
    mapping
        .iter()
        .find(|(i, _)| *i == index)
        .map(|(_, position)| *position)
}

fn collect_samples(entries: &[SampleEntry], mapping: &[(usize, usize)]) -> Vec<ParsedSample> {
    let mut samples = Vec::new();
    for entry in entries {
        let Some(t) = entry.t.filter(|t| t.is_finite()) else {
            continue;
        };
        let time_offset_seconds = t.round() as i32;

        for (index, raw) in entry.vs.as_deref().unwrap_or_default().iter().enumerate() {
            let (Some(descriptor), Some(value)) = (lookup(mapping, index), value_as_f64(raw)) else {
                continue;
            };
            samples.push(ParsedSample {
                descriptor,
                time_offset_seconds,
                value,
            });
        }
    }
    samples
}

fn duration_from_unit(value: f64, unit: &str) -> Option<f64> {
    match unit {
        "min" | "minute" | "minutes" => Some(value * 60.0),
        "h" | "hour" | "hours" => Some(value * 3600.0),
        "ms" | "millisecond" | "milliseconds" => Some(value / 1000.0),
        "" | "s" | "sec" | "second" | "seconds" => Some(value),
        _ => None,
    }
}

fn distance_from_unit(value: f64, unit: &str) -> Option<f64> {
    match unit {
        "km" => Some(value * 1000.0),
        "mi" => Some(value * MILE_IN_METERS),
        "" | "m" => Some(value),
        _ => None,
    }
}

fn entry_unit(entry: &SummaryEntry) -> String {
    entry.unit.as_deref().unwrap_or_default().trim().to_lowercase()
}

fn summary_duration(entries: &[SummaryEntry]) -> Option<f64> {
    entries
        .iter()
        .filter(|e| e.property.as_deref() == Some("Duration"))
        .find_map(|e| {
            let raw = e.raw_value.as_ref().and_then(value_as_f64)?;
            duration_from_unit(raw, &entry_unit(e))
        })
}

fn summary_distance(entries: &[SummaryEntry]) -> Option<f64> {
    entries
        .iter()
        .filter(|e| {
            e.property
                .as_deref()
                .is_some_and(|p| p.to_lowercase().contains("distance"))
        })
        .find_map(|e| {
            let raw = e.raw_value.as_ref().and_then(value_as_f64)?;
            distance_from_unit(raw, &entry_unit(e))
        })
}

/// Value at the latest offset of the first mapped distance descriptor. Among
/// equal offsets the one appearing last in the export wins.
fn sample_distance(
    descriptors: &[ParsedDescriptor],
    mapping: &[(usize, usize)],
    samples: &[ParsedSample],
) -> Option<f64> {
    let target = mapping
        .iter()
        .map(|(_, position)| &descriptors[*position])
        .find(|d| d.name.to_lowercase().contains("distance"))?;

    samples
        .iter()
        .filter(|s| descriptors[s.descriptor] == *target)
        .fold(None::<&ParsedSample>, |best, s| match best {
            Some(b) if b.time_offset_seconds > s.time_offset_seconds => Some(b),
            _ => Some(s),
        })
        .map(|s| s.value)
}

/// `(t, level)` points of the last mapped `Level`/`Number` descriptor, with
/// unrounded offsets.
fn level_points(
    entries: &[SampleEntry],
    descriptors: &[ParsedDescriptor],
    mapping: &[(usize, usize)],
) -> Vec<(f64, f64)> {
    let Some(level_index) = mapping
        .iter()
        .rev()
        .find(|(_, position)| descriptors[*position].is("Level", "Number"))
        .map(|(i, _)| *i)
    else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let t = entry.t.filter(|t| t.is_finite())?;
            let raw = entry.vs.as_deref()?.get(level_index)?;
            value_as_f64(raw).map(|level| (t, level))
        })
        .collect()
}

/// Time-weighted mean level over `[0, duration]`. Until the first sample the
/// first level applies, and each level then holds until the next sample or
/// the end of the workout.
pub fn time_weighted_level(points: &mut [(f64, f64)], duration: f64) -> Option<f64> {
    if points.is_empty() || !(duration > 0.0) {
        return None;
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut weighted = 0.0;
    let mut last_time = 0.0;
    let mut previous_level = points[0].1;

    for (t, level) in points.iter() {
        let segment = t - last_time;
        if segment > 0.0 {
            weighted += previous_level * segment;
        }
        last_time = *t;
        previous_level = *level;
    }

    let tail = duration - last_time;
    if tail > 0.0 {
        weighted += previous_level * tail;
    }

    Some(weighted / duration)
}

fn collect_hr_samples(points: &[HrPoint]) -> Vec<ParsedHrSample> {
    points
        .iter()
        .filter_map(|p| {
            let t = p.t.filter(|t| t.is_finite())?;
            let hr = p.hr.filter(|hr| hr.is_finite())?;
            Some(ParsedHrSample {
                time_offset_seconds: t.round() as i32,
                heart_rate_bpm: hr.round() as i32,
            })
        })
        .collect()
}

fn collect_hr_zones(entries: &[HrZoneEntry]) -> Vec<ParsedHrZone> {
    entries
        .iter()
        .filter_map(|z| {
            let (Some(zone_name), Some(seconds_in_zone)) = (z.name.clone(), z.seconds_in_zone) else {
                warn!("Skipping HR zone without a name or time in zone: {:?}", z);
                return None;
            };
            Some(ParsedHrZone {
                zone_name,
                color_hex: z.color.clone(),
                lower_bound_bpm: z.lower_bound,
                upper_bound_bpm: z.upper_bound,
                seconds_in_zone,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn export() -> Value {
        json!({
            "data": {
                "cardioLogId": 73542,
                "date": "14/03/2024",
                "name": "Intervals",
                "target": "8x500m",
                "analitics": {
                    "descriptor": [
                        { "i": 0, "pr": { "name": "Duration", "um": "s" } },
                        { "i": 1, "pr": { "name": "Distance", "um": "m" } },
                        { "i": 2, "pr": { "name": "RowingSplit", "um": "/500m" } },
                        { "i": 3, "pr": { "name": "Level", "um": "Number" } },
                        { "i": 4, "pr": { "name": "IsoReps", "um": "Number" } },
                        { "i": 5, "pr": { "um": "W" } }
                    ],
                    "samples": [
                        { "t": 0, "vs": [0, 0, 0, 4, 0] },
                        { "t": 59.6, "vs": [60, 250, 120, 6, 10] },
                        { "vs": [90, 300, 118, 6, 12] },
                        { "t": 120, "vs": [120, 500, null, 8, 21] }
                    ],
                    "hr": [
                        { "t": 0, "hr": 95 },
                        { "t": 60, "hr": null },
                        { "t": 120, "hr": 151.4 }
                    ]
                },
                "data": [
                    { "property": "Move", "rawValue": 999, "uM": "s" },
                    { "property": "Duration", "rawValue": "2", "uM": "min" },
                    { "property": "Distance", "rawValue": 0.6, "uM": "km" }
                ],
                "hrZones": [
                    { "name": "Hard", "color": "#ff0000", "lowerBound": 147, "upperBound": 165, "secondsInZone": 42 },
                    { "name": "Ghost" }
                ]
            }
        })
    }

    #[test]
    fn test_parse_full_export() {
        let parsed = parse_export(&export()).unwrap();

        assert_eq!(parsed.cardio_log_id, "73542");
        assert_eq!(parsed.workout_date, NaiveDate::from_ymd_opt(2024, 3, 14).unwrap());
        assert_eq!(parsed.workout_name.as_deref(), Some("Intervals"));
        assert_eq!(parsed.target_description.as_deref(), Some("8x500m"));
        assert_eq!(parsed.duration_seconds, Some(120.0));
        // Distance comes from the last distance sample, not the summary
        assert_eq!(parsed.total_distance_meters, Some(500.0));
        assert_eq!(parsed.average_split_seconds_500m, Some(120.0));
        assert_eq!(parsed.total_isoreps, Some(21.0));

        // Unnamed descriptor is dropped, sample without t and null value too
        assert_eq!(parsed.descriptors.len(), 5);
        assert_eq!(parsed.samples.len(), 14);
        assert!(parsed.samples.iter().any(|s| s.time_offset_seconds == 60));

        assert_eq!(
            parsed.heart_rate_samples,
            vec![
                ParsedHrSample { time_offset_seconds: 0, heart_rate_bpm: 95 },
                ParsedHrSample { time_offset_seconds: 120, heart_rate_bpm: 151 },
            ]
        );
        assert_eq!(parsed.hr_zones.len(), 1);
        assert_eq!(parsed.hr_zones[0].seconds_in_zone, 42.0);
    }

    #[test]
    fn test_level_is_time_weighted() {
        let parsed = parse_export(&export()).unwrap();
        // 4 over [0, 59.6], 6 over [59.6, 120]; the sample at 120 adds nothing
        let expected = (4.0 * 59.6 + 6.0 * 60.4) / 120.0;
        let level = parsed.level.unwrap();
        assert!((level - expected).abs() < 1e-9, "level {}", level);
    }

    #[test]
    fn test_distance_falls_back_to_summary() {
        let mut doc = export();
        doc["data"]["analitics"]["descriptor"][1]["pr"]["name"] = json!("Calories");
        doc["data"]["data"][2]["uM"] = json!("mi");
        doc["data"]["data"][2]["rawValue"] = json!(1);

        let parsed = parse_export(&doc).unwrap();
        assert_eq!(parsed.total_distance_meters, Some(MILE_IN_METERS));
    }

    #[test]
    fn test_duplicate_descriptor_index_keeps_position_uses_later() {
        let (descriptors, mapping) = map_descriptors(&[
            DescriptorEntry {
                i: Some(0),
                pr: Some(crate::ingest::export::DescriptorProperty {
                    name: Some("Distance".to_string()),
                    um: Some("m".to_string()),
                }),
            },
            DescriptorEntry {
                i: Some(1),
                pr: Some(crate::ingest::export::DescriptorProperty {
                    name: Some("Power".to_string()),
                    um: Some("W".to_string()),
                }),
            },
            DescriptorEntry {
                i: Some(0),
                pr: Some(crate::ingest::export::DescriptorProperty {
                    name: Some("Spm".to_string()),
                    um: None,
                }),
            },
        ]);

        assert_eq!(descriptors.len(), 3);
        assert_eq!(mapping, vec![(0, 2), (1, 1)]);
    }

    #[test]
    fn test_rejects_missing_pieces() {
        assert_matches!(parse_export(&json!({})), Err(ImportError::MissingData));
        assert_matches!(parse_export(&json!({ "data": {} })), Err(ImportError::MissingData));

        let mut no_id = export();
        no_id["data"]["cardioLogId"] = json!("");
        assert_matches!(parse_export(&no_id), Err(ImportError::MissingCardioLogId));

        let mut bad_date = export();
        bad_date["data"]["date"] = json!("2024-03-14");
        assert_matches!(parse_export(&bad_date), Err(ImportError::InvalidDate(d)) if d == "2024-03-14");
    }

    #[test]
    fn test_mistyped_points_are_skipped() {
        let mut doc = export();
        let samples = doc["data"]["analitics"]["samples"].as_array_mut().unwrap();
        samples.push(json!({ "t": "late", "vs": [130, 600, 118, 8, 25] }));
        samples.push(json!({ "t": { "s": 1 }, "vs": [130, 600, 118, 8, 25] }));
        let hr = doc["data"]["analitics"]["hr"].as_array_mut().unwrap();
        hr.push(json!({ "t": 30, "hr": "--" }));
        hr.push(json!({ "t": "90", "hr": "140" }));

        let parsed = parse_export(&doc).unwrap();
        assert_eq!(parsed.samples.len(), 14);
        assert_eq!(parsed.total_distance_meters, Some(500.0));
        assert_eq!(
            parsed.heart_rate_samples,
            vec![
                ParsedHrSample { time_offset_seconds: 0, heart_rate_bpm: 95 },
                ParsedHrSample { time_offset_seconds: 120, heart_rate_bpm: 151 },
                ParsedHrSample { time_offset_seconds: 90, heart_rate_bpm: 140 },
            ]
        );
    }

    #[test]
    fn test_hr_prefers_root_location() {
        let mut doc = export();
        doc["hr"] = json!([{ "t": 5, "hr": 100 }]);
        let parsed = parse_export(&doc).unwrap();
        assert_eq!(parsed.heart_rate_samples.len(), 1);
        assert_eq!(parsed.heart_rate_samples[0].heart_rate_bpm, 100);
    }

    #[test]
    fn test_decode_submission() {
        assert_matches!(decode_submission(None), Err(ImportError::NoData));
        assert_matches!(decode_submission(Some(json!("  "))), Err(ImportError::NoData));
        assert_matches!(decode_submission(Some(json!("{not json"))), Err(ImportError::InvalidJson(_)));
        assert_eq!(
            decode_submission(Some(json!("{\"data\": 1}"))).unwrap(),
            json!({ "data": 1 })
        );
        assert_eq!(decode_submission(Some(json!({ "a": 1 }))).unwrap(), json!({ "a": 1 }));
    }

    #[test]
    fn test_level_needs_positive_duration() {
        assert_eq!(time_weighted_level(&mut [(0.0, 5.0)], 0.0), None);
        assert_eq!(time_weighted_level(&mut [], 60.0), None);
        assert_eq!(time_weighted_level(&mut [(30.0, 5.0)], 60.0), Some(5.0));
    }

    proptest! {
        #[test]
        fn prop_level_average_within_sample_range(
            duration in 1.0f64..7200.0,
            raw in prop::collection::vec((0.0f64..1.0, 0.0f64..20.0), 1..40),
        ) {
            let mut points: Vec<(f64, f64)> = raw.iter().map(|(f, l)| (f * duration, *l)).collect();
            let min = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
            let max = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max);

            let level = time_weighted_level(&mut points, duration).unwrap();
            prop_assert!(level >= min - 1e-9 && level <= max + 1e-9, "{} not in [{}, {}]", level, min, max);
        }
    }
}
