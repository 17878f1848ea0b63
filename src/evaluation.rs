//! # KPI Evaluation
//!
//! Scores a KPI against a task's activity log over a date window. The
//! engine is pure: it reads the log entries it is given and writes
//! nothing, so evaluating twice over the same window gives the same
//! result.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::{Kpi, TaskLog};

/// Result of evaluating a KPI over a date window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Evaluation {
    /// Every value the evaluated field took inside the window, duplicates
    /// included.
    pub values: Vec<Value>,
    /// Distinct values achieved as a percentage of the prorated target.
    #[serde(rename = "kpiPercentage")]
    pub kpi_percentage: f64,
    /// Number of extracted values, duplicates included.
    #[serde(rename = "totalCount")]
    pub total_count: u64,
    /// Calendar days in the window that were not excluded.
    #[serde(rename = "daysConsidered")]
    pub days_considered: u64,
    /// Target prorated over the considered days.
    #[serde(rename = "targetSales")]
    pub target_sales: f64,
}

impl Evaluation {
    fn zero() -> Self {
        Self {
            values: Vec::new(),
            kpi_percentage: 0.0,
            total_count: 0,
            days_considered: 0,
            target_sales: 0.0,
        }
    }
}

/// Parse excluded weekday names, dropping anything unrecognized.
///
/// Names are matched case-insensitively against full English weekday
/// names.
fn excluded_weekdays(names: &[String]) -> HashSet<Weekday> {
    names
        .iter()
        .filter_map(|name| match name.to_ascii_lowercase().as_str() {
            "sunday" => Some(Weekday::Sun),
            "monday" => Some(Weekday::Mon),
            "tuesday" => Some(Weekday::Tue),
            "wednesday" => Some(Weekday::Wed),
            "thursday" => Some(Weekday::Thu),
            "friday" => Some(Weekday::Fri),
            "saturday" => Some(Weekday::Sat),
            _ => None,
        })
        .collect()
}

/// Count the calendar days of the inclusive window, skipping excluded
/// weekdays. Dates are reckoned in UTC.
fn count_days(start: DateTime<Utc>, end: DateTime<Utc>, excluded: &HashSet<Weekday>) -> u64 {
    let mut day = start.date_naive();
    let end_day = end.date_naive();
    let mut days = 0;
    while day <= end_day {
        if !excluded.contains(&day.weekday()) {
            days += 1;
        }
        let Some(next) = day.succ_opt() else {
            break;
        };
        day = next;
    }
    days
}

/// Evaluate `kpi` against `logs` between `start` and `end` inclusive.
///
/// Entries outside the window or on excluded weekdays are skipped, and
/// entries without the evaluated field are dropped (a field explicitly
/// set to null still counts). The percentage measures the distinct
/// value count against the KPI target prorated over the considered
/// days, with `Time_Unit` treated as at least one day. `total_count`
/// keeps duplicates.
pub fn evaluate(
    kpi: &Kpi,
    logs: &[TaskLog],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    excluded_days: &[String],
) -> Evaluation {
    if logs.is_empty() {
        return Evaluation::zero();
    }

    let excluded = excluded_weekdays(excluded_days);

    let mut values = Vec::new();
    for log in logs {
        let date = log.register_date;
        if date < start || date > end || excluded.contains(&date.weekday()) {
            continue;
        }
        if let Some(value) = log.fields.get(&kpi.field_to_be_evaluated) {
            values.push(value.clone());
        }
    }

    let distinct = values.iter().collect::<HashSet<_>>().len() as u64;
    let total_count = values.len() as u64;
    let days_considered = count_days(start, end, &excluded);

    let time_unit = kpi.time_unit.max(1) as f64;
    let target_sales = (days_considered as f64 / time_unit) * kpi.target;
    let kpi_percentage = if target_sales != 0.0 {
        (distinct as f64 / target_sales) * 100.0
    } else {
        0.0
    };

    Evaluation {
        values,
        kpi_percentage,
        total_count,
        days_considered,
        target_sales,
    }
}
