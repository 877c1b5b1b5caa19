use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One row per (employee, calendar date). Created by the first clock-in of
/// the day or by the absentee sweep, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: String,
    pub employee_id: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_in_mode: Option<ClockMode>,
    pub clock_in_latitude: Option<f64>,
    pub clock_in_longitude: Option<f64>,
    pub clock_in_accuracy: Option<f64>,
    pub clock_in_evidence: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub clock_out: Option<DateTime<Utc>>,
    pub clock_out_mode: Option<ClockMode>,
    pub clock_out_latitude: Option<f64>,
    pub clock_out_longitude: Option<f64>,
    pub clock_out_evidence: Option<String>,
    /// Clock-out minus clock-in, fractional hours rounded to two decimals.
    pub total_hours: Option<f64>,
    pub status: AttendanceStatus,
    pub note: Option<String>,
}

/// Day-level outcome, a pure function of the clock-in time against the work
/// policy except where an approved leave (excused) or the sweep (absent)
/// assigns it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
    strum_macros::Display,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Excused,
}

/// Attendance context for a clock event. Each mode carries its own
/// validation rules.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
    strum_macros::Display,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ClockMode {
    Office,
    Remote,
    ClientVisit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    In,
    Out,
}
