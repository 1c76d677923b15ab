use chrono::NaiveDate;
use jobsite::types::{ContractorInput, ProjectInput, TimesheetInput};

pub const PROJECT_CITY: &str = "Springfield";

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn project_input(name: &str) -> ProjectInput {
    ProjectInput {
        name: name.to_string(),
        project_number: Some(format!("P-{}", name.len())),
        city: Some(PROJECT_CITY.to_string()),
        ..Default::default()
    }
}

pub fn contractor_input(email: &str, city: &str, hourly_rate_cents: i64) -> ContractorInput {
    ContractorInput {
        first_name: "Test".to_string(),
        last_name: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
        city: Some(city.to_string()),
        hourly_rate_cents,
        fringe_rate_cents: 500,
        ..Default::default()
    }
}

pub fn timesheet_input(project_id: i64, work_date: &str, hours: f64) -> TimesheetInput {
    TimesheetInput {
        project_id,
        work_date: date(work_date),
        hours,
        description: None,
        contractor_id: None,
    }
}
