use crate::error::JobsiteError;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Declares an enum persisted as lower snake case text, with conversions for
/// serde, `Display`, `FromStr` and rusqlite.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = JobsiteError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(JobsiteError::BadInput(format!(
                        "'{other}' is not a valid {}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

text_enum!(
    /// Membership level of a company, bounds the number of projects
    MembershipTier {
        Basic => "basic",
        Professional => "professional",
        Enterprise => "enterprise",
    }
);

impl MembershipTier {
    /// Maximum number of projects, `None` when unlimited
    #[must_use]
    pub fn project_limit(self) -> Option<u32> {
        match self {
            MembershipTier::Basic => Some(3),
            MembershipTier::Professional => Some(25),
            MembershipTier::Enterprise => None,
        }
    }
}

text_enum!(ProjectStatus {
    Active => "active",
    Completed => "completed",
    Archived => "archived",
});

text_enum!(
    /// Review state of a timesheet. Only pending timesheets may change state.
    TimesheetStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
);

impl TimesheetStatus {
    #[must_use]
    pub fn can_transition_to(self, next: TimesheetStatus) -> bool {
        matches!(
            (self, next),
            (TimesheetStatus::Pending, TimesheetStatus::Approved | TimesheetStatus::Rejected)
        )
    }
}

text_enum!(SubmissionType {
    IncidentReport => "incident_report",
    VehicleInspection => "vehicle_inspection",
    ToolboxTalk => "toolbox_talk",
});

/// Shape a required form field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// Any non-empty value
    Present,
    /// A JSON array with at least one element
    List,
}

impl SubmissionType {
    /// Form fields which must be present and non-empty for this kind of submission
    #[must_use]
    pub fn required_fields(self) -> &'static [(&'static str, FieldShape)] {
        match self {
            SubmissionType::IncidentReport => &[
                ("incidentDate", FieldShape::Present),
                ("description", FieldShape::Present),
            ],
            SubmissionType::VehicleInspection => &[
                ("vehicleId", FieldShape::Present),
                ("odometer", FieldShape::Present),
            ],
            SubmissionType::ToolboxTalk => &[
                ("topic", FieldShape::Present),
                ("attendees", FieldShape::List),
            ],
        }
    }

    #[must_use]
    pub fn initial_status(self) -> SubmissionStatus {
        match self {
            SubmissionType::IncidentReport => SubmissionStatus::Open,
            SubmissionType::VehicleInspection | SubmissionType::ToolboxTalk => {
                SubmissionStatus::Submitted
            }
        }
    }
}

text_enum!(SubmissionStatus {
    Submitted => "submitted",
    Open => "open",
    Investigating => "investigating",
    Closed => "closed",
});

impl SubmissionStatus {
    /// Incident workflow: open -> investigating -> closed, or straight to closed
    #[must_use]
    pub fn can_transition_to(self, next: SubmissionStatus) -> bool {
        matches!(
            (self, next),
            (SubmissionStatus::Open, SubmissionStatus::Investigating | SubmissionStatus::Closed)
                | (SubmissionStatus::Investigating, SubmissionStatus::Closed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub tier: MembershipTier,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOverview {
    #[serde(flatten)]
    pub company: Company,
    pub project_limit: Option<u32>,
    pub project_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: i64,
    pub company_id: i64,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub project_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// Fields of a project supplied when creating or updating it
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInput {
    pub name: String,
    pub project_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub status: Option<ProjectStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subcontractor {
    pub id: i64,
    pub company_id: i64,
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub trade: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubcontractorInput {
    pub name: String,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub trade: Option<String>,
}

/// An individual worker. Rates are held in cents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Contractor {
    pub id: i64,
    pub company_id: i64,
    pub subcontractor_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub trade: Option<String>,
    pub city: Option<String>,
    pub hourly_rate_cents: i64,
    pub fringe_rate_cents: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Contractor {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractorInput {
    pub subcontractor_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub trade: Option<String>,
    pub city: Option<String>,
    pub hourly_rate_cents: i64,
    #[serde(default)]
    pub fringe_rate_cents: i64,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timesheet {
    pub id: i64,
    pub company_id: i64,
    pub contractor_id: i64,
    pub project_id: i64,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub description: Option<String>,
    pub status: TimesheetStatus,
    pub rejection_reason: Option<String>,
    pub reviewed_by: Option<i64>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetInput {
    pub project_id: i64,
    pub work_date: NaiveDate,
    pub hours: f64,
    pub description: Option<String>,
    /// Only read when an admin records time on behalf of a contractor
    #[serde(default)]
    pub contractor_id: Option<i64>,
}

/// Count and hours of the timesheets in one state
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetStatusSummary {
    pub status: TimesheetStatus,
    pub count: i64,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: i64,
    pub company_id: i64,
    pub contractor_id: Option<i64>,
    pub admin_id: Option<i64>,
    pub project_id: Option<i64>,
    pub submission_type: SubmissionType,
    pub status: SubmissionStatus,
    pub form_data: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInput {
    pub submission_type: SubmissionType,
    pub project_id: Option<i64>,
    pub form_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDocument {
    pub id: i64,
    pub company_id: i64,
    pub project_id: i64,
    pub name: String,
    pub category: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size_bytes: Option<i64>,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    pub name: String,
    pub category: Option<String>,
    pub url: String,
    pub content_type: Option<String>,
    pub size: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxTalk {
    pub id: i64,
    pub company_id: i64,
    pub title: String,
    pub topic: Option<String>,
    pub content: String,
    pub published: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolboxTalkInput {
    pub title: String,
    pub topic: Option<String>,
    pub content: String,
    #[serde(default)]
    pub published: bool,
}

/// Trims the value and maps blank strings to `None`
pub(crate) fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
