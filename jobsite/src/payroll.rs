//! Certified payroll: per week and per worker wages, overtime and fringe for the
//! approved timesheets of one project.
use crate::date::{weekday_index, WeekRange};
use crate::types::{Contractor, Project, Timesheet};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::warn;
use num_traits::ToPrimitive;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Weekly hours paid at the straight rate, everything above is overtime
pub const STRAIGHT_TIME_HOURS: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRequest {
    pub project_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// One line of the weekly report. Daily hours run Sunday to Saturday.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerWeek {
    pub contractor_id: i64,
    pub name: String,
    pub trade: Option<String>,
    pub subcontractor: Option<String>,
    pub city: Option<String>,
    pub local_resident: bool,
    pub daily_hours: [f64; 7],
    pub total_hours: f64,
    pub straight_hours: f64,
    pub overtime_hours: f64,
    pub rate_cents: i64,
    pub overtime_rate_cents: i64,
    pub gross_cents: i64,
    pub fringe_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollWeek {
    #[serde(flatten)]
    pub range: WeekRange,
    pub workers: Vec<WorkerWeek>,
    pub total_hours: f64,
    pub total_gross_cents: i64,
    pub total_fringe_cents: i64,
    pub worker_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollSummary {
    pub week_count: usize,
    pub total_hours: f64,
    pub total_gross_cents: i64,
    pub total_fringe_cents: i64,
    pub worker_count: usize,
    pub local_worker_count: usize,
    pub local_hours: f64,
    pub local_hours_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertifiedPayrollReport {
    pub project_id: i64,
    pub project_name: String,
    pub project_number: Option<String>,
    pub project_city: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weeks: Vec<PayrollWeek>,
    pub summary: PayrollSummary,
}

/// Lower case, single spaced city name without a trailing `, XX` state code
/// and without a leading `city of`.
#[allow(clippy::missing_panics_doc)]
#[must_use]
pub fn normalize_city(city: &str) -> String {
    lazy_static! {
        static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
        static ref STATE_SUFFIX: Regex = Regex::new(r"\s*,\s*[a-z]{2}$").unwrap();
        static ref CITY_OF: Regex = Regex::new(r"^city of\s+").unwrap();
    }
    let lower = city.trim().to_lowercase();
    let collapsed = WHITESPACE.replace_all(&lower, " ");
    let without_state = STATE_SUFFIX.replace(&collapsed, "");
    CITY_OF.replace(&without_state, "").trim().to_string()
}

/// A worker is local when both cities are known and normalize to the same name
#[must_use]
pub fn is_local_resident(worker_city: Option<&str>, project_city: Option<&str>) -> bool {
    match (worker_city.map(normalize_city), project_city.map(normalize_city)) {
        (Some(worker), Some(project)) => !worker.is_empty() && worker == project,
        _ => false,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn hours_times_rate(hours: f64, rate_cents: i64) -> i64 {
    let rate = rate_cents.to_f64().unwrap_or_default();
    (hours * rate).round().to_i64().unwrap_or(i64::MAX)
}

fn sum_cents(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// Time and a half, rounded to whole cents
fn overtime_rate(rate_cents: i64) -> i64 {
    rate_cents.saturating_mul(3).saturating_add(1) / 2
}

fn worker_week(
    contractor: &Contractor,
    timesheets: &[&Timesheet],
    project_city: Option<&str>,
    subcontractor_names: &HashMap<i64, String>,
) -> WorkerWeek {
    let mut daily_hours = [0.0; 7];
    for timesheet in timesheets {
        daily_hours[weekday_index(timesheet.work_date)] += timesheet.hours;
    }
    let total_hours: f64 = daily_hours.iter().sum();
    let straight_hours = total_hours.min(STRAIGHT_TIME_HOURS);
    let overtime_hours = (total_hours - STRAIGHT_TIME_HOURS).max(0.0);
    let overtime_rate_cents = overtime_rate(contractor.hourly_rate_cents);

    WorkerWeek {
        contractor_id: contractor.id,
        name: contractor.full_name(),
        trade: contractor.trade.clone(),
        subcontractor: contractor
            .subcontractor_id
            .and_then(|id| subcontractor_names.get(&id).cloned()),
        city: contractor.city.clone(),
        local_resident: is_local_resident(contractor.city.as_deref(), project_city),
        daily_hours: daily_hours.map(round2),
        total_hours: round2(total_hours),
        straight_hours: round2(straight_hours),
        overtime_hours: round2(overtime_hours),
        rate_cents: contractor.hourly_rate_cents,
        overtime_rate_cents,
        gross_cents: hours_times_rate(straight_hours, contractor.hourly_rate_cents)
            .saturating_add(hours_times_rate(overtime_hours, overtime_rate_cents)),
        fringe_cents: hours_times_rate(total_hours, contractor.fringe_rate_cents),
    }
}

/// Builds the report for `weeks` out of the approved `timesheets` of `project`.
///
/// Timesheets outside every week or referencing an unknown contractor are skipped.
#[must_use]
pub fn build_report(
    project: &Project,
    weeks: &[WeekRange],
    timesheets: &[Timesheet],
    contractors: &HashMap<i64, Contractor>,
    subcontractor_names: &HashMap<i64, String>,
) -> CertifiedPayrollReport {
    let mut payroll_weeks = Vec::with_capacity(weeks.len());
    let mut workers_seen = BTreeSet::new();
    let mut local_workers = BTreeSet::new();
    let mut local_hours = 0.0;

    for range in weeks {
        let mut by_contractor: BTreeMap<i64, Vec<&Timesheet>> = BTreeMap::new();
        for timesheet in timesheets.iter().filter(|t| range.contains(t.work_date)) {
            by_contractor
                .entry(timesheet.contractor_id)
                .or_default()
                .push(timesheet);
        }

        let mut workers = Vec::with_capacity(by_contractor.len());
        for (contractor_id, entries) in &by_contractor {
            let Some(contractor) = contractors.get(contractor_id) else {
                warn!("Skipping timesheets of unknown contractor {contractor_id}");
                continue;
            };
            let worker = worker_week(
                contractor,
                entries,
                project.city.as_deref(),
                subcontractor_names,
            );
            workers_seen.insert(worker.contractor_id);
            if worker.local_resident {
                local_workers.insert(worker.contractor_id);
                local_hours += worker.total_hours;
            }
            workers.push(worker);
        }
        workers.sort_by(|a, b| {
            let a_key = contractors.get(&a.contractor_id).map(|c| (&c.last_name, &c.first_name));
            let b_key = contractors.get(&b.contractor_id).map(|c| (&c.last_name, &c.first_name));
            a_key.cmp(&b_key).then(a.contractor_id.cmp(&b.contractor_id))
        });

        payroll_weeks.push(PayrollWeek {
            range: *range,
            total_hours: round2(workers.iter().map(|w| w.total_hours).sum()),
            total_gross_cents: sum_cents(workers.iter().map(|w| w.gross_cents)),
            total_fringe_cents: sum_cents(workers.iter().map(|w| w.fringe_cents)),
            worker_count: workers.len(),
            workers,
        });
    }

    let total_hours: f64 = payroll_weeks.iter().map(|w| w.total_hours).sum();
    let local_hours_percentage = if total_hours > 0.0 {
        round2(local_hours / total_hours * 100.0)
    } else {
        0.0
    };
    let summary = PayrollSummary {
        week_count: payroll_weeks.len(),
        total_hours: round2(total_hours),
        total_gross_cents: sum_cents(payroll_weeks.iter().map(|w| w.total_gross_cents)),
        total_fringe_cents: sum_cents(payroll_weeks.iter().map(|w| w.total_fringe_cents)),
        worker_count: workers_seen.len(),
        local_worker_count: local_workers.len(),
        local_hours: round2(local_hours),
        local_hours_percentage,
    };

    CertifiedPayrollReport {
        project_id: project.id,
        project_name: project.name.clone(),
        project_number: project.project_number.clone(),
        project_city: project.city.clone(),
        start_date: weeks.first().map_or(NaiveDate::MIN, |w| w.period_start),
        end_date: weeks.last().map_or(NaiveDate::MIN, |w| w.period_end),
        weeks: payroll_weeks,
        summary,
    }
}
