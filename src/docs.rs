use crate::api::attendance::{HistoryFilter, StatsFilter, SweepRequest, TeamFilter};
use crate::api::face::RegisterFace;
use crate::api::leave::{BalanceFilter, DecideRequest, LeaveFilter, LeaveTypeInfo};
use crate::api::overtime::{CreateOvertime, OvertimeFilter};
use crate::api::shift::{AssignShift, CreateShift};
use crate::config::OfficeLocation;
use crate::engine::authority::ApprovalLevel;
use crate::engine::clock::ClockSubmission;
use crate::engine::requests::{DecisionAction, SubmitLeave};
use crate::engine::stats::AttendanceStats;
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, ClockKind, ClockMode};
use crate::model::leave::{LeaveBalance, LeaveKind, LeaveRequest, RequestStatus};
use crate::model::overtime::OvertimeRequest;
use crate::model::shift::{Shift, ShiftAssignment};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Workforce Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance & Request-Approval Engine

This API decides whether a clock event is valid and what status it produces,
and runs the lifecycle that turns leave/overtime requests into approved or
rejected outcomes while keeping the leave-balance ledger consistent.

### 🔹 Key Features
- **Attendance**
  - Clock in/out with mode-specific validation (geofence, client address)
  - Late/present classification, history, month stats, absentee sweep
- **Face Verification**
  - Register a face template, advisory or enforced matching on clock
- **Leave Management**
  - Quota holds at submission, commit on approval, release on reject/cancel
- **Overtime**
  - Submit and decide overtime requests (no quota)
- **Shifts**
  - Shift definitions and non-overlapping assignments

### 🔐 Security
All endpoints are protected using **JWT Bearer authentication**. Decisions
additionally require the leave type's configured approval level.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::clock,
        crate::api::attendance::today,
        crate::api::attendance::history,
        crate::api::attendance::month_stats,
        crate::api::attendance::team,
        crate::api::attendance::settings,
        crate::api::attendance::sweep,

        crate::api::face::register,
        crate::api::face::check,
        crate::api::face::template,

        crate::api::leave::types,
        crate::api::leave::balance,
        crate::api::leave::submit,
        crate::api::leave::list,
        crate::api::leave::pending,
        crate::api::leave::decide,
        crate::api::leave::cancel,

        crate::api::overtime::submit,
        crate::api::overtime::list,
        crate::api::overtime::decide,

        crate::api::shift::create,
        crate::api::shift::list,
        crate::api::shift::update,
        crate::api::shift::delete,
        crate::api::shift::assign,
        crate::api::shift::assignments
    ),
    components(
        schemas(
            ClockSubmission,
            ClockKind,
            ClockMode,
            AttendanceRecord,
            AttendanceStatus,
            AttendanceStats,
            HistoryFilter,
            StatsFilter,
            TeamFilter,
            SweepRequest,
            OfficeLocation,
            RegisterFace,
            ApprovalLevel,
            LeaveKind,
            LeaveTypeInfo,
            LeaveBalance,
            LeaveRequest,
            LeaveFilter,
            BalanceFilter,
            SubmitLeave,
            DecideRequest,
            DecisionAction,
            RequestStatus,
            CreateOvertime,
            OvertimeFilter,
            OvertimeRequest,
            CreateShift,
            AssignShift,
            Shift,
            ShiftAssignment
        )
    ),
    tags(
        (name = "Attendance", description = "Clock events, history and stats"),
        (name = "Face", description = "Face template registration"),
        (name = "Leave", description = "Leave requests and balances"),
        (name = "Overtime", description = "Overtime requests"),
        (name = "Shift", description = "Shifts and assignments"),
    )
)]
pub struct ApiDoc;
