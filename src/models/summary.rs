use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use sqlx::FromRow;
use std::collections::HashMap;

use crate::format::{format_split_short, format_total_seconds_human_readable};
use crate::models::pagination::Page;
use crate::models::workout::WorkoutListItem;

/// Raw aggregate columns shared by every `mv_*_totals` view.
#[derive(Debug, Clone, Default, FromRow)]
pub struct TotalsRow {
    pub total_meters_rowed: Option<f64>,
    pub total_seconds_rowed: Option<f64>,
    pub average_split_seconds_per_500m: Option<f64>,
    pub total_isoreps_sum: Option<f64>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DayTotalsRow {
    pub day_date: NaiveDate,
    #[sqlx(flatten)]
    pub totals: TotalsRow,
}

#[derive(Debug, Clone, FromRow)]
pub struct WeekTotalsRow {
    pub week_start_date: NaiveDate,
    #[sqlx(flatten)]
    pub totals: TotalsRow,
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthTotalsRow {
    pub year: i32,
    pub month: i32,
    #[sqlx(flatten)]
    pub totals: TotalsRow,
}

#[derive(Debug, Clone, FromRow)]
pub struct YearTotalsRow {
    pub year: i32,
    #[sqlx(flatten)]
    pub totals: TotalsRow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub meters: f64,
    pub seconds: f64,
    pub split: f64,
    pub isoreps: f64,
    pub split_display: String,
    pub time_display: String,
}

impl PeriodTotals {
    pub fn new(meters: f64, seconds: f64, split: f64, isoreps: f64) -> Self {
        Self {
            meters,
            seconds,
            split,
            isoreps,
            split_display: format_split_short(Some(split)),
            time_display: format_total_seconds_human_readable(Some(seconds)),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

impl From<&TotalsRow> for PeriodTotals {
    fn from(row: &TotalsRow) -> Self {
        PeriodTotals::new(
            row.total_meters_rowed.unwrap_or(0.0),
            row.total_seconds_rowed.unwrap_or(0.0),
            row.average_split_seconds_per_500m.unwrap_or(0.0),
            row.total_isoreps_sum.unwrap_or(0.0),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub day_date: NaiveDate,
    pub totals: PeriodTotals,
    pub has_workouts: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekSummary {
    pub week_key: String,
    pub week_start_date: NaiveDate,
    pub week_end_date: NaiveDate,
    pub iso_year: i32,
    pub week_number: u32,
    pub totals: PeriodTotals,
    pub has_workouts: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub month_key: String,
    pub year: i32,
    pub month: u32,
    pub month_name: &'static str,
    pub totals: PeriodTotals,
    pub has_workouts: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub totals: PeriodTotals,
    pub has_workouts: bool,
}

impl DaySummary {
    pub fn from_row(row: &DayTotalsRow) -> Self {
        Self {
            day_date: row.day_date,
            totals: PeriodTotals::from(&row.totals),
            has_workouts: true,
        }
    }

    pub fn empty(day_date: NaiveDate) -> Self {
        Self {
            day_date,
            totals: PeriodTotals::zero(),
            has_workouts: false,
        }
    }
}

impl WeekSummary {
    pub fn new(week_start_date: NaiveDate, totals: PeriodTotals, has_workouts: bool) -> Self {
        let iso = week_start_date.iso_week();
        Self {
            week_key: week_key(week_start_date),
            week_start_date,
            week_end_date: week_start_date + Duration::days(6),
            iso_year: iso.year(),
            week_number: iso.week(),
            totals,
            has_workouts,
        }
    }

    pub fn from_row(row: &WeekTotalsRow) -> Self {
        Self::new(row.week_start_date, PeriodTotals::from(&row.totals), true)
    }
}

impl MonthSummary {
    pub fn new(year: i32, month: u32, totals: PeriodTotals, has_workouts: bool) -> Self {
        Self {
            month_key: format!("{:04}-{:02}", year, month),
            year,
            month,
            month_name: month_name(month),
            totals,
            has_workouts,
        }
    }

    pub fn from_row(row: &MonthTotalsRow) -> Self {
        Self::new(row.year, row.month as u32, PeriodTotals::from(&row.totals), true)
    }
}

impl YearSummary {
    pub fn from_row(row: &YearTotalsRow) -> Self {
        Self {
            year: row.year,
            totals: PeriodTotals::from(&row.totals),
            has_workouts: true,
        }
    }
}

/// Category labels plus one series per aggregate, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryChart {
    pub categories: Vec<String>,
    pub meters: Vec<Option<f64>>,
    pub seconds: Vec<Option<f64>>,
    pub pace: Vec<Option<f64>>,
    pub reps: Vec<Option<f64>>,
    pub has_data: bool,
}

impl SummaryChart {
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = (String, &'a PeriodTotals)>,
    {
        let mut chart = SummaryChart::default();
        for (label, totals) in points {
            chart.categories.push(label);
            chart.meters.push(finite(totals.meters));
            chart.seconds.push(finite(totals.seconds));
            chart.pace.push(finite(totals.split).filter(|p| *p > 0.0));
            chart.reps.push(finite(totals.isoreps));
        }
        chart.has_data = !chart.categories.is_empty();
        chart
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryPage<T> {
    #[serde(flatten)]
    pub page: Page<T>,
    pub chart: SummaryChart,
}

#[derive(Debug, Clone, Serialize)]
pub struct DateDrillDown {
    pub date: NaiveDate,
    pub totals: PeriodTotals,
    pub workouts: Vec<WorkoutListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekDrillDown {
    pub week: WeekSummary,
    pub days: Vec<DaySummary>,
    pub chart: SummaryChart,
    pub workouts: Vec<WorkoutListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthDrillDown {
    pub month: MonthSummary,
    pub weeks: Vec<WeekSummary>,
    pub days: Vec<DaySummary>,
    pub weekly_chart: SummaryChart,
    pub daily_chart: SummaryChart,
    pub workouts: Vec<WorkoutListItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearDrillDown {
    pub year: i32,
    pub totals: PeriodTotals,
    pub months: Vec<MonthSummary>,
    pub weeks: Vec<WeekSummary>,
    pub chart: SummaryChart,
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

/// ISO week key, `YYYY-Www`, of the week containing `date`.
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{:04}-W{:02}", iso.year(), iso.week())
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Mondays of every ISO week overlapping `[start, end]`.
pub fn week_starts_overlapping(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut starts = Vec::new();
    let mut current = week_start(start);
    while current <= end {
        starts.push(current);
        current += Duration::days(7);
    }
    starts
}

/// One entry per day in `[start, end]`, zero-filled where no row exists.
pub fn fill_days(start: NaiveDate, end: NaiveDate, rows: &[DayTotalsRow]) -> Vec<DaySummary> {
    let by_day: HashMap<NaiveDate, &DayTotalsRow> = rows.iter().map(|r| (r.day_date, r)).collect();

    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(match by_day.get(&current) {
            Some(row) => DaySummary::from_row(row),
            None => DaySummary::empty(current),
        });
        current += Duration::days(1);
    }
    days
}

pub fn fill_weeks(week_starts: &[NaiveDate], rows: &[WeekTotalsRow]) -> Vec<WeekSummary> {
    let by_week: HashMap<NaiveDate, &WeekTotalsRow> =
        rows.iter().map(|r| (r.week_start_date, r)).collect();

    week_starts
        .iter()
        .map(|start| match by_week.get(start) {
            Some(row) => WeekSummary::from_row(row),
            None => WeekSummary::new(*start, PeriodTotals::zero(), false),
        })
        .collect()
}

/// Twelve months of `year`, zero-filled.
pub fn fill_months(year: i32, rows: &[MonthTotalsRow]) -> Vec<MonthSummary> {
    let by_month: HashMap<i32, &MonthTotalsRow> = rows
        .iter()
        .filter(|r| r.year == year)
        .map(|r| (r.month, r))
        .collect();

    (1..=12u32)
        .map(|month| match by_month.get(&(month as i32)) {
            Some(row) => MonthSummary::from_row(row),
            None => MonthSummary::new(year, month, PeriodTotals::zero(), false),
        })
        .collect()
}

/// Last day of the given month.
pub fn month_end(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1).map(|d| d - Duration::days(1))
}

/// `Mon, Jan 01`
pub fn day_label(date: NaiveDate) -> String {
    date.format("%a, %b %d").to_string()
}

/// `01 Mon`, used where the month is already known.
pub fn day_of_month_label(date: NaiveDate) -> String {
    date.format("%d %a").to_string()
}

/// `W35 2023`
pub fn week_label(week: &WeekSummary) -> String {
    format!("W{:02} {}", week.week_number, week.iso_year)
}

/// `W35 '23`
pub fn short_week_label(week: &WeekSummary) -> String {
    format!("W{:02} '{:02}", week.week_number, week.iso_year.rem_euclid(100))
}

/// `March 2024`
pub fn month_label(month: &MonthSummary) -> String {
    format!("{} {}", month.month_name, month.year)
}
