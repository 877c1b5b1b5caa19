use super::leave::RequestStatus;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Overtime has no quota, so no ledger is involved; approved hours feed
/// payroll-facing aggregates downstream.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct OvertimeRequest {
    pub id: String,
    pub employee_id: String,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "18:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "21:30:00", value_type = String)]
    pub end_time: NaiveTime,
    /// End minus start, fractional hours rounded to two decimals.
    pub hour_count: f64,
    pub reason: String,
    pub status: RequestStatus,
    pub decision_reason: Option<String>,
    pub decided_by: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}
