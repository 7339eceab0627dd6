use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::format::format_pace_label;
use crate::models::settings::HrZoneFloor;
use crate::models::workout::{HeartRateSample, WorkoutHrZone, WorkoutListItem};

/// Descriptor whose sample offsets define the x axis of every chart.
pub const TIME_AXIS_METRIC: &str = "Duration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChartMetric {
    Pace,
    Power,
    StrokeRate,
}

impl ChartMetric {
    pub const ALL: [ChartMetric; 3] = [ChartMetric::Pace, ChartMetric::Power, ChartMetric::StrokeRate];

    /// Name of the stored descriptor the series is read from.
    pub fn descriptor_name(&self) -> &'static str {
        match self {
            ChartMetric::Pace => "RowingSplit",
            ChartMetric::Power => "Power",
            ChartMetric::StrokeRate => "Spm",
        }
    }

    fn element_id(&self) -> &'static str {
        match self {
            ChartMetric::Pace => "paceChart",
            ChartMetric::Power => "powerChart",
            ChartMetric::StrokeRate => "spmChart",
        }
    }

    fn metric_key(&self) -> &'static str {
        match self {
            ChartMetric::Pace => "Pace",
            ChartMetric::Power => "Power",
            ChartMetric::StrokeRate => "Cadence",
        }
    }

    fn default_unit(&self) -> &'static str {
        match self {
            ChartMetric::Pace => "/500m",
            ChartMetric::Power => "Watts",
            ChartMetric::StrokeRate => "spm",
        }
    }

    fn title(&self, unit: &str) -> String {
        match self {
            ChartMetric::Pace => "Pace (/500m)".to_string(),
            ChartMetric::Power => format!("Power ({})", unit),
            ChartMetric::StrokeRate => format!("Stroke Rate ({})", unit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: i32,
    pub y: Option<f64>,
}

/// Horizontal reference line drawn across a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub element_id: &'static str,
    pub title: String,
    pub metric_key: &'static str,
    pub unit: String,
    pub series: Vec<ChartPoint>,
    pub annotations: Vec<Annotation>,
}

/// Stored samples of one chart metric, as (offset, value).
#[derive(Debug, Clone)]
pub struct MetricSeries {
    pub metric: ChartMetric,
    pub unit: Option<String>,
    pub samples: Vec<(i32, f64)>,
}

/// Sorted, de-duplicated time offsets.
pub fn time_categories<I>(offsets: I) -> Vec<i32>
where
    I: IntoIterator<Item = i32>,
{
    offsets.into_iter().collect::<BTreeSet<_>>().into_iter().collect()
}

/// One point per category. Values that are not positive become gaps, and a
/// later sample at the same offset wins.
pub fn align_series(categories: &[i32], samples: &[(i32, f64)]) -> Vec<ChartPoint> {
    let by_offset: HashMap<i32, Option<f64>> = samples
        .iter()
        .map(|(t, v)| (*t, (v.is_finite() && *v > 0.0).then_some(*v)))
        .collect();

    categories
        .iter()
        .map(|x| ChartPoint {
            x: *x,
            y: by_offset.get(x).copied().flatten(),
        })
        .collect()
}

pub fn series_average(points: &[ChartPoint]) -> Option<f64> {
    let values: Vec<f64> = points.iter().filter_map(|p| p.y).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Builds the chart for one metric, or `None` when it has nothing to plot.
/// Pace is annotated with the workout's own split, the others with the
/// mean of the plotted values.
pub fn build_chart(
    series: &MetricSeries,
    categories: &[i32],
    workout_split: Option<f64>,
) -> Option<ChartData> {
    let points = align_series(categories, &series.samples);
    if points.iter().all(|p| p.y.is_none()) {
        return None;
    }

    let annotation = match series.metric {
        ChartMetric::Pace => workout_split
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|split| Annotation {
                y: split,
                label: format_pace_label(split),
            }),
        ChartMetric::Power | ChartMetric::StrokeRate => {
            series_average(&points).map(|avg| Annotation {
                y: avg,
                label: format!("{:.0}", avg),
            })
        }
    };

    let unit = series
        .unit
        .clone()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| series.metric.default_unit().to_string());

    Some(ChartData {
        element_id: series.metric.element_id(),
        title: series.metric.title(&unit),
        metric_key: series.metric.metric_key(),
        unit,
        series: points,
        annotations: annotation.into_iter().collect(),
    })
}

/// Charts in pace, power, stroke-rate order. No categories means no charts.
pub fn build_charts(
    categories: &[i32],
    series: &[MetricSeries],
    workout_split: Option<f64>,
) -> Vec<ChartData> {
    if categories.is_empty() {
        return Vec::new();
    }

    ChartMetric::ALL
        .iter()
        .filter_map(|metric| series.iter().find(|s| s.metric == *metric))
        .filter_map(|s| build_chart(s, categories, workout_split))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HrZoneTime {
    pub zone_name: String,
    pub color_hex: Option<String>,
    pub lower_bound_bpm: Option<f64>,
    pub upper_bound_bpm: Option<f64>,
    pub seconds_in_zone: f64,
}

impl From<WorkoutHrZone> for HrZoneTime {
    fn from(zone: WorkoutHrZone) -> Self {
        Self {
            zone_name: zone.zone_name,
            color_hex: zone.color_hex,
            lower_bound_bpm: zone.lower_bound_bpm,
            upper_bound_bpm: zone.upper_bound_bpm,
            seconds_in_zone: zone.seconds_in_zone,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutHrDetail {
    pub samples: Vec<HeartRateSample>,
    pub zones: Vec<HrZoneTime>,
    /// True when zones were computed from the configured floors rather than
    /// read from the import.
    pub zones_derived: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutDetail {
    #[serde(flatten)]
    pub workout: WorkoutListItem,
    pub charts: Vec<ChartData>,
    pub heart_rate: WorkoutHrDetail,
}

/// Time in each zone, attributing every interval between consecutive HR
/// samples to the zone of the earlier one. `floors` must be sorted highest
/// first. Returns nothing with fewer than two usable samples.
pub fn derive_hr_zones(samples: &[HeartRateSample], floors: &[HrZoneFloor]) -> Vec<HrZoneTime> {
    let mut points: Vec<(i32, i32)> = samples
        .iter()
        .filter_map(|s| s.heart_rate_bpm.map(|bpm| (s.time_offset_seconds, bpm)))
        .collect();
    if points.len() < 2 || floors.is_empty() {
        return Vec::new();
    }
    points.sort_by_key(|(t, _)| *t);

    let mut seconds = vec![0.0; floors.len()];
    for pair in points.windows(2) {
        let (t0, bpm) = pair[0];
        let (t1, _) = pair[1];
        if let Some(idx) = floors.iter().position(|f| bpm >= f.floor_bpm) {
            seconds[idx] += f64::from(t1 - t0);
        }
    }

    floors
        .iter()
        .enumerate()
        .map(|(idx, floor)| HrZoneTime {
            zone_name: floor.zone_name.to_string(),
            color_hex: None,
            lower_bound_bpm: Some(f64::from(floor.floor_bpm)),
            upper_bound_bpm: idx
                .checked_sub(1)
                .map(|above| f64::from(floors[above].floor_bpm - 1)),
            seconds_in_zone: seconds[idx],
        })
        .collect()
}
