use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Shift {
    pub id: String,
    pub name: String,
    #[schema(example = "09:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "18:00:00", value_type = String)]
    pub end_time: NaiveTime,
    pub color: String,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// An employee may have at most one assignment covering any given date;
/// overlapping ranges are rejected on assign.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ShiftAssignment {
    pub id: String,
    pub employee_id: String,
    pub shift_id: String,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub effective_from: NaiveDate,
    /// Open-ended when absent.
    #[schema(example = "2026-06-30", format = "date", value_type = Option<String>)]
    pub effective_to: Option<NaiveDate>,
}
