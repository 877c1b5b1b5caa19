use crate::engine::authority::ApprovalLevel;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use strum::IntoEnumIterator;
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    ToSchema,
    strum_macros::Display,
    strum_macros::EnumIter,
    strum_macros::EnumString,
)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveKind {
    Annual,
    Sick,
    Personal,
    Maternity,
    Marriage,
    Bereavement,
}

/// Static rules for one leave type. `allotted` is per employee per calendar
/// year; `None` means no quota is tracked.
#[derive(Debug, Clone, Copy)]
pub struct LeavePolicy {
    pub label: &'static str,
    pub allotted: Option<i64>,
    /// Whether approved days are deducted from the balance ledger.
    pub deducts_quota: bool,
    pub approval: ApprovalLevel,
    /// Minimum days between submission and the start date. Zero exempts the
    /// type from the lead-time check.
    pub min_lead_days: i64,
    pub max_days: i64,
    pub needs_attachment: bool,
}

impl LeaveKind {
    pub fn policy(&self) -> LeavePolicy {
        match self {
            LeaveKind::Annual => LeavePolicy {
                label: "Annual Leave",
                allotted: Some(14),
                deducts_quota: true,
                approval: ApprovalLevel::Manager,
                min_lead_days: 3,
                max_days: 14,
                needs_attachment: false,
            },
            LeaveKind::Sick => LeavePolicy {
                label: "Sick Leave",
                allotted: None,
                deducts_quota: false,
                approval: ApprovalLevel::Manager,
                min_lead_days: 0,
                max_days: 14,
                needs_attachment: true,
            },
            LeaveKind::Personal => LeavePolicy {
                label: "Personal Leave",
                allotted: Some(3),
                deducts_quota: true,
                approval: ApprovalLevel::Manager,
                min_lead_days: 1,
                max_days: 3,
                needs_attachment: false,
            },
            LeaveKind::Maternity => LeavePolicy {
                label: "Maternity Leave",
                allotted: Some(90),
                deducts_quota: false,
                approval: ApprovalLevel::Hr,
                min_lead_days: 14,
                max_days: 90,
                needs_attachment: false,
            },
            LeaveKind::Marriage => LeavePolicy {
                label: "Marriage Leave",
                allotted: Some(3),
                deducts_quota: false,
                approval: ApprovalLevel::Hr,
                min_lead_days: 7,
                max_days: 3,
                needs_attachment: false,
            },
            LeaveKind::Bereavement => LeavePolicy {
                label: "Bereavement Leave",
                allotted: Some(3),
                deducts_quota: false,
                approval: ApprovalLevel::Manager,
                min_lead_days: 0,
                max_days: 7,
                needs_attachment: false,
            },
        }
    }

    pub fn all() -> impl Iterator<Item = LeaveKind> {
        LeaveKind::iter()
    }
}

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
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

/// Immutable once terminal; mutated only by the lifecycle transitions.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: String,
    pub employee_id: String,
    pub leave_type: LeaveKind,
    #[schema(example = "2026-02-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-02-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    /// Inclusive business-day span of the range.
    pub day_count: i64,
    pub reason: String,
    pub attachment_ref: Option<String>,
    pub status: RequestStatus,
    pub decision_reason: Option<String>,
    pub decided_by: Option<String>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub decided_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

/// Running balance per (employee, leave type, calendar year).
/// Invariant: used + held <= allotted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveBalance {
    pub employee_id: String,
    pub leave_type: LeaveKind,
    pub period: i64,
    pub allotted: i64,
    pub used: i64,
    pub held: i64,
}

impl LeaveBalance {
    pub fn remaining(&self) -> i64 {
        self.allotted - self.used - self.held
    }
}
