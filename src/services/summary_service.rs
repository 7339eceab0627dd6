use chrono::NaiveDate;
use sqlx::{postgres::PgRow, FromRow, PgPool};
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::pagination::{clamp_page, page_offset, Page};
use crate::models::settings::{
    PER_PAGE_SUMMARY_DAY, PER_PAGE_SUMMARY_MONTH, PER_PAGE_SUMMARY_WEEK, PER_PAGE_SUMMARY_YEAR,
};
use crate::models::summary::{
    day_label, day_of_month_label, fill_days, fill_months, fill_weeks, month_end, month_label,
    short_week_label, week_label, week_starts_overlapping, DateDrillDown, DaySummary,
    DayTotalsRow, MonthDrillDown, MonthSummary, MonthTotalsRow, PeriodTotals, SummaryChart,
    SummaryPage, TotalsRow, WeekDrillDown, WeekSummary, WeekTotalsRow, YearDrillDown,
    YearSummary, YearTotalsRow,
};
use crate::models::validation::{parse_month_key, parse_week_key, validate_year};
use crate::services::settings_service::SettingsService;
use crate::services::workout_service::WorkoutService;

const TOTALS_COLUMNS: &str =
    "total_meters_rowed, total_seconds_rowed, average_split_seconds_per_500m, total_isoreps_sum";

/// Rows of one page of a summary view, newest first.
struct ViewPage<R> {
    page: i64,
    per_page: i64,
    total: i64,
    rows: Vec<R>,
}

#[derive(Clone)]
pub struct SummaryService {
    db: PgPool,
    settings: SettingsService,
    workouts: WorkoutService,
}

impl SummaryService {
    pub fn new(db: PgPool) -> Self {
        Self {
            settings: SettingsService::new(db.clone()),
            workouts: WorkoutService::new(db.clone()),
            db,
        }
    }

    pub async fn overall_totals(&self) -> AppResult<PeriodTotals> {
        let sql = format!("SELECT {} FROM mv_sum_totals", TOTALS_COLUMNS);
        let row = sqlx::query_as::<_, TotalsRow>(&sql)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.as_ref().map(PeriodTotals::from).unwrap_or_else(PeriodTotals::zero))
    }

    async fn view_page<R>(
        &self,
        view: &str,
        key_columns: &str,
        order_by: &str,
        per_page_key: &str,
        page: Option<i64>,
    ) -> AppResult<ViewPage<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let per_page = self.settings.get_per_page(per_page_key).await?;
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", view))
            .fetch_one(&self.db)
            .await?;
        let page = clamp_page(page, total, per_page);

        let sql = format!(
            "SELECT {}, {} FROM {} ORDER BY {} LIMIT $1 OFFSET $2",
            key_columns, TOTALS_COLUMNS, view, order_by
        );
        let rows = sqlx::query_as::<_, R>(&sql)
            .bind(per_page)
            .bind(page_offset(page, per_page))
            .fetch_all(&self.db)
            .await?;

        debug!("{} page {} ({} per page, {} rows)", view, page, per_page, rows.len());
        Ok(ViewPage {
            page,
            per_page,
            total,
            rows,
        })
    }

    pub async fn day_page(&self, page: Option<i64>) -> AppResult<SummaryPage<DaySummary>> {
        let view = self
            .view_page::<DayTotalsRow>(
                "mv_day_totals",
                "day_date",
                "day_date DESC",
                PER_PAGE_SUMMARY_DAY,
                page,
            )
            .await?;

        let items: Vec<DaySummary> = view.rows.iter().map(DaySummary::from_row).collect();
        let chart = SummaryChart::from_points(
            items
                .iter()
                .rev()
                .map(|d| (d.day_date.format("%Y-%m-%d").to_string(), &d.totals)),
        );

        Ok(SummaryPage {
            page: Page::new(view.page, view.per_page, view.total, items),
            chart,
        })
    }

    pub async fn week_page(&self, page: Option<i64>) -> AppResult<SummaryPage<WeekSummary>> {
        let view = self
            .view_page::<WeekTotalsRow>(
                "mv_week_totals",
                "week_start_date",
                "week_start_date DESC",
                PER_PAGE_SUMMARY_WEEK,
                page,
            )
            .await?;

        let items: Vec<WeekSummary> = view.rows.iter().map(WeekSummary::from_row).collect();
        let chart =
            SummaryChart::from_points(items.iter().rev().map(|w| (week_label(w), &w.totals)));

        Ok(SummaryPage {
            page: Page::new(view.page, view.per_page, view.total, items),
            chart,
        })
    }

    pub async fn month_page(&self, page: Option<i64>) -> AppResult<SummaryPage<MonthSummary>> {
        let view = self
            .view_page::<MonthTotalsRow>(
                "mv_month_totals",
                "year, month",
                "year DESC, month DESC",
                PER_PAGE_SUMMARY_MONTH,
                page,
            )
            .await?;

        let items: Vec<MonthSummary> = view.rows.iter().map(MonthSummary::from_row).collect();
        let chart =
            SummaryChart::from_points(items.iter().rev().map(|m| (month_label(m), &m.totals)));

        Ok(SummaryPage {
            page: Page::new(view.page, view.per_page, view.total, items),
            chart,
        })
    }

    pub async fn year_page(&self, page: Option<i64>) -> AppResult<SummaryPage<YearSummary>> {
        let view = self
            .view_page::<YearTotalsRow>(
                "mv_year_totals",
                "year",
                "year DESC",
                PER_PAGE_SUMMARY_YEAR,
                page,
            )
            .await?;

        let items: Vec<YearSummary> = view.rows.iter().map(YearSummary::from_row).collect();
        let chart =
            SummaryChart::from_points(items.iter().rev().map(|y| (y.year.to_string(), &y.totals)));

        Ok(SummaryPage {
            page: Page::new(view.page, view.per_page, view.total, items),
            chart,
        })
    }

    async fn day_rows(&self, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<DayTotalsRow>> {
        let sql = format!(
            "SELECT day_date, {} FROM mv_day_totals WHERE day_date BETWEEN $1 AND $2 ORDER BY day_date",
            TOTALS_COLUMNS
        );
        let rows = sqlx::query_as::<_, DayTotalsRow>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn week_rows(&self, first: NaiveDate, last: NaiveDate) -> AppResult<Vec<WeekTotalsRow>> {
        let sql = format!(
            "SELECT week_start_date, {} FROM mv_week_totals \
             WHERE week_start_date BETWEEN $1 AND $2 ORDER BY week_start_date",
            TOTALS_COLUMNS
        );
        let rows = sqlx::query_as::<_, WeekTotalsRow>(&sql)
            .bind(first)
            .bind(last)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    pub async fn date_drill_down(&self, date: NaiveDate) -> AppResult<DateDrillDown> {
        let days = self.day_rows(date, date).await?;
        let totals = days
            .first()
            .map(|row| PeriodTotals::from(&row.totals))
            .unwrap_or_else(PeriodTotals::zero);

        Ok(DateDrillDown {
            date,
            totals,
            workouts: self.workouts.list_between(date, date).await?,
        })
    }

    pub async fn week_drill_down(&self, week_key: &str) -> AppResult<WeekDrillDown> {
        let (start, end) = parse_week_key(week_key)?;

        let week = fill_weeks(&[start], &self.week_rows(start, start).await?)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::not_found(format!("Week {}", week_key)))?;
        let days = fill_days(start, end, &self.day_rows(start, end).await?);
        let chart = SummaryChart::from_points(days.iter().map(|d| (day_label(d.day_date), &d.totals)));

        Ok(WeekDrillDown {
            week,
            days,
            chart,
            workouts: self.workouts.list_between(start, end).await?,
        })
    }

    pub async fn month_drill_down(&self, month_key: &str) -> AppResult<MonthDrillDown> {
        let (year, month) = parse_month_key(month_key)?;
        let (start, end) = match (NaiveDate::from_ymd_opt(year, month, 1), month_end(year, month)) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(AppError::validation(format!("Invalid month: {}", month_key))),
        };

        let sql = format!(
            "SELECT year, month, {} FROM mv_month_totals WHERE year = $1 AND month = $2",
            TOTALS_COLUMNS
        );
        let month_rows = sqlx::query_as::<_, MonthTotalsRow>(&sql)
            .bind(year)
            .bind(month as i32)
            .fetch_all(&self.db)
            .await?;
        let summary = match month_rows.first() {
            Some(row) => MonthSummary::from_row(row),
            None => MonthSummary::new(year, month, PeriodTotals::zero(), false),
        };

        let week_starts = week_starts_overlapping(start, end);
        let week_rows = match (week_starts.first(), week_starts.last()) {
            (Some(first), Some(last)) => self.week_rows(*first, *last).await?,
            _ => Vec::new(),
        };
        let weeks = fill_weeks(&week_starts, &week_rows);
        let days = fill_days(start, end, &self.day_rows(start, end).await?);

        let weekly_chart =
            SummaryChart::from_points(weeks.iter().map(|w| (short_week_label(w), &w.totals)));
        let daily_chart = SummaryChart::from_points(
            days.iter().map(|d| (day_of_month_label(d.day_date), &d.totals)),
        );

        Ok(MonthDrillDown {
            month: summary,
            weeks,
            days,
            weekly_chart,
            daily_chart,
            workouts: self.workouts.list_between(start, end).await?,
        })
    }

    pub async fn year_drill_down(&self, year: i32) -> AppResult<YearDrillDown> {
        let year = validate_year(year)?;
        let (start, end) = match (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(AppError::validation(format!("Invalid year: {}", year))),
        };

        let sql = format!("SELECT year, {} FROM mv_year_totals WHERE year = $1", TOTALS_COLUMNS);
        let totals = sqlx::query_as::<_, YearTotalsRow>(&sql)
            .bind(year)
            .fetch_optional(&self.db)
            .await?
            .map(|row| PeriodTotals::from(&row.totals))
            .unwrap_or_else(PeriodTotals::zero);

        let sql = format!(
            "SELECT year, month, {} FROM mv_month_totals WHERE year = $1 ORDER BY month",
            TOTALS_COLUMNS
        );
        let month_rows = sqlx::query_as::<_, MonthTotalsRow>(&sql)
            .bind(year)
            .fetch_all(&self.db)
            .await?;
        let months = fill_months(year, &month_rows);

        let week_starts = week_starts_overlapping(start, end);
        let week_rows = match (week_starts.first(), week_starts.last()) {
            (Some(first), Some(last)) => self.week_rows(*first, *last).await?,
            _ => Vec::new(),
        };
        let weeks = fill_weeks(&week_starts, &week_rows);

        let chart = SummaryChart::from_points(
            months.iter().map(|m| (m.month_name.to_string(), &m.totals)),
        );

        Ok(YearDrillDown {
            year,
            totals,
            months,
            weeks,
            chart,
        })
    }
}
